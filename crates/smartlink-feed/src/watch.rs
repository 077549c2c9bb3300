use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::mission::MissionFile;

pub const COALESCE_WINDOW: Duration = Duration::from_millis(250);

fn is_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    )
}

/// Mission files touched by a watcher event.
fn mission_files(event: &notify::Event) -> Vec<MissionFile> {
    if !is_change(&event.kind) {
        return Vec::new();
    }
    event
        .paths
        .iter()
        .filter_map(|p| MissionFile::from_path(p))
        .collect()
}

/// Watches `root` and sends one batch of changed files per coalescing window.
pub fn spawn(root: &Path, tx: mpsc::Sender<BTreeSet<MissionFile>>) -> Result<()> {
    let (raw_tx, raw_rx) = mpsc::channel::<MissionFile>(1024);

    let mut watcher: RecommendedWatcher = Watcher::new(
        move |res: std::result::Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                for file in mission_files(&event) {
                    let _ = raw_tx.try_send(file);
                }
            }
            Err(e) => tracing::warn!(error = %e, "mission watcher error"),
        },
        notify::Config::default(),
    )?;
    watcher
        .watch(root, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", root.display()))?;
    tracing::info!(root = %root.display(), "watching mission directory");

    tokio::spawn(coalesce(raw_rx, tx, COALESCE_WINDOW));

    // keep watcher alive
    std::mem::forget(watcher);
    Ok(())
}

async fn coalesce(
    mut raw_rx: mpsc::Receiver<MissionFile>,
    tx: mpsc::Sender<BTreeSet<MissionFile>>,
    period: Duration,
) {
    let mut pending = BTreeSet::new();
    let mut tick = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            file = raw_rx.recv() => match file {
                Some(file) => {
                    pending.insert(file);
                }
                None => break,
            },
            _ = tick.tick() => {
                if pending.is_empty() {
                    continue;
                }
                tracing::debug!(files = ?pending, "mission files changed");
                if tx.send(std::mem::take(&mut pending)).await.is_err() {
                    break;
                }
            }
        }
    }
}
