mod config;
mod mission;
mod server;
mod watch;

use anyhow::{Context, Result};
use mission::{MissionDir, MissionFile};
use server::SharedMission;
use smartlink_core::Msg;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("smartlink=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = config::parse_args()?;

    let mission_dir = MissionDir::new(&config.data_dir);
    let snapshot = mission_dir
        .load()
        .with_context(|| format!("failed to load mission from {}", config.data_dir.display()))?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        stations = snapshot.stations.as_ref().map_or(0, Vec::len),
        has_system = snapshot.system.is_some(),
        has_ephemeris = snapshot.ephemeris.is_some(),
        topologies = snapshot.topologies.as_ref().map_or(0, Vec::len),
        eligibilities = snapshot.eligibilities.as_ref().map_or(0, Vec::len),
        "mission loaded"
    );

    // Clean stale socket
    let _ = std::fs::remove_file(&config.socket);

    let mission: SharedMission = Arc::new(RwLock::new(snapshot));
    let (bus_tx, _bus_rx) = broadcast::channel::<Msg>(1024);

    if config.watch {
        let (changes_tx, changes_rx) = mpsc::channel(64);
        watch::spawn(mission_dir.root(), changes_tx)?;
        tokio::spawn(publish_changes(
            mission_dir,
            Arc::clone(&mission),
            changes_rx,
            bus_tx.clone(),
        ));
    }

    server::run(&config.socket, mission, bus_tx).await
}

async fn publish_changes(
    dir: MissionDir,
    mission: SharedMission,
    mut rx: mpsc::Receiver<BTreeSet<MissionFile>>,
    bus_tx: broadcast::Sender<Msg>,
) {
    while let Some(changed) = rx.recv().await {
        let mut snapshot = mission.write().await;
        let deltas = dir.apply_changes(&mut snapshot, &changed);
        tracing::info!(files = ?changed, deltas = deltas.len(), "mission changed");
        for delta in deltas {
            // no viewers connected is fine
            let _ = bus_tx.send(Msg::Event { delta });
        }
    }
}
