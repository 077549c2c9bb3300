//! Mission data as last received from the feed, and the order in which changes
//! reach the scene.

use bevy::prelude::Resource;
use smartlink_core::{
    topologies_by_constellation, Delta, EligibilityWindow, Ephemeris, EphemerisResponse,
    MissionSnapshot, Station, System, TopologyWithConstellation,
};

use crate::net::{Incoming, IncomingKind};
use crate::scene::{SceneCoordinator, TopologyMap};

#[derive(Debug, Clone, Default)]
pub struct FeedStatus {
    pub endpoint: Option<String>,
    pub connected: bool,
    pub server_version: Option<String>,
    pub snapshots: u64,
    pub events: u64,
    pub last_error: Option<String>,
}

#[derive(Resource, Debug, Default)]
pub struct MissionStore {
    stations: Option<Vec<Station>>,
    system: Option<System>,
    ephemeris: Option<Ephemeris>,
    topologies: Option<TopologyMap>,
    eligibilities: Option<Vec<EligibilityWindow>>,
    pub status: FeedStatus,
}

impl MissionStore {
    pub fn stations(&self) -> &[Station] {
        self.stations.as_deref().unwrap_or_default()
    }

    pub fn system(&self) -> Option<&System> {
        self.system.as_ref()
    }

    pub fn ephemeris(&self) -> Option<&Ephemeris> {
        self.ephemeris.as_ref()
    }

    pub fn eligibility_count(&self) -> usize {
        self.eligibilities.as_ref().map_or(0, Vec::len)
    }

    pub fn handle(&mut self, incoming: Incoming, scene: &mut SceneCoordinator) {
        self.status.endpoint = Some(incoming.endpoint);
        match incoming.kind {
            IncomingKind::Connected => {
                self.status.connected = true;
                self.status.last_error = None;
            }
            IncomingKind::Disconnected => self.status.connected = false,
            IncomingKind::Hello { version } => {
                tracing::info!(%version, "feed hello");
                self.status.server_version = Some(version);
            }
            IncomingKind::Snapshot(mission) => {
                self.status.snapshots += 1;
                self.apply_snapshot(*mission, scene);
            }
            IncomingKind::Event(delta) => {
                self.status.events += 1;
                self.apply_delta(*delta, scene);
            }
            IncomingKind::Other(msg) => tracing::debug!(?msg, "ignoring feed message"),
            IncomingKind::Error(e) => self.status.last_error = Some(e),
        }
    }

    /// Replaces the whole mission; absent parts are removed from the scene.
    pub fn apply_snapshot(&mut self, mission: MissionSnapshot, scene: &mut SceneCoordinator) {
        tracing::info!(
            stations = mission.stations.as_ref().map_or(0, Vec::len),
            has_system = mission.system.is_some(),
            has_ephemeris = mission.ephemeris.is_some(),
            "applying snapshot"
        );
        self.set_stations(mission.stations, scene);
        // Stored first so the satellite install below picks them up.
        self.topologies = mission.topologies.map(topologies_by_constellation);
        self.set_satellites(mission.system, mission.ephemeris, scene);
        self.set_eligibilities(mission.eligibilities, scene);
    }

    pub fn apply_delta(&mut self, delta: Delta, scene: &mut SceneCoordinator) {
        match delta {
            Delta::SetStations { stations } => self.set_stations(Some(stations), scene),
            Delta::RemoveStations => self.set_stations(None, scene),
            Delta::SetSatellites { system, ephemeris } => {
                self.set_satellites(Some(system), Some(ephemeris), scene);
                // Windows were computed against the previous ephemeris.
                self.set_eligibilities(None, scene);
            }
            Delta::RemoveSatellites => self.set_satellites(None, None, scene),
            Delta::SetTopologies { topologies } => self.set_topologies(topologies, scene),
            Delta::SetEligibilities { windows } => self.set_eligibilities(Some(windows), scene),
            Delta::RemoveEligibilities => self.set_eligibilities(None, scene),
        }
    }

    fn set_stations(&mut self, stations: Option<Vec<Station>>, scene: &mut SceneCoordinator) {
        self.stations = stations;
        match self.stations.as_deref() {
            Some(stations) => {
                scene.set_stations(stations);
            }
            None => {
                scene.remove_stations();
            }
        }
    }

    fn set_satellites(
        &mut self,
        system: Option<System>,
        response: Option<EphemerisResponse>,
        scene: &mut SceneCoordinator,
    ) {
        self.system = system;
        self.ephemeris = match response.map(|r| r.decode()) {
            Some(Ok(ephemeris)) => Some(ephemeris),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "ephemeris could not be decoded");
                self.status.last_error = Some(e.to_string());
                None
            }
            None => None,
        };

        match (self.system.as_ref(), self.ephemeris.as_ref()) {
            (Some(system), Some(ephemeris)) => {
                scene.set_satellites(system, ephemeris);
                if let Some(topologies) = self.topologies.as_ref() {
                    scene.set_topologies(Some(topologies));
                }
            }
            _ => {
                scene.remove_satellites();
            }
        }
    }

    fn set_topologies(
        &mut self,
        topologies: Vec<TopologyWithConstellation>,
        scene: &mut SceneCoordinator,
    ) {
        self.topologies = Some(topologies_by_constellation(topologies));
        if self.ephemeris.is_some() {
            scene.set_topologies(self.topologies.as_ref());
        }
    }

    fn set_eligibilities(
        &mut self,
        windows: Option<Vec<EligibilityWindow>>,
        scene: &mut SceneCoordinator,
    ) {
        self.eligibilities = windows;
        match self.eligibilities.as_deref() {
            Some(windows) => {
                scene.set_eligibilities(windows);
            }
            None => {
                scene.remove_eligibilities();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::fixtures;
    use crate::scene::{CollectionId, EntityKey, SceneSettings};
    use smartlink_core::FloatDataFormat;

    fn response(ids: &[u64]) -> EphemerisResponse {
        EphemerisResponse::from_samples(
            fixtures::horizon(),
            FloatDataFormat::default(),
            ids.iter()
                .map(|id| (*id, vec![[7000.0, *id as f64, 0.0], [7000.0, 0.0, 100.0]])),
        )
    }

    fn keys(scene: &SceneCoordinator, pred: impl Fn(&EntityKey) -> bool) -> usize {
        let v = scene.viewer().expect("mounted");
        v.collections()
            .flat_map(|c| c.keys())
            .filter(|&k| pred(k))
            .count()
    }

    fn snapshot() -> MissionSnapshot {
        MissionSnapshot {
            stations: Some(vec![fixtures::station(1)]),
            system: Some(fixtures::system(&[(1, vec![vec![1, 2]])])),
            ephemeris: Some(response(&[1, 2])),
            topologies: Some(vec![fixtures::topology(1, 5, &[(1, 2)], &[])]),
            eligibilities: Some(vec![fixtures::window(1, 1, 0, 10)]),
        }
    }

    #[test]
    fn snapshot_installs_every_layer() {
        let mut scene = SceneCoordinator::mount(SceneSettings::default());
        let mut store = MissionStore::default();
        store.apply_snapshot(snapshot(), &mut scene);

        assert_eq!(keys(&scene, |k| matches!(k, EntityKey::Station(_))), 1);
        assert_eq!(keys(&scene, |k| matches!(k, EntityKey::Satellite(_))), 2);
        assert_eq!(keys(&scene, EntityKey::is_topology), 1);
        assert_eq!(keys(&scene, EntityKey::is_eligibility), 1);

        // An empty snapshot clears everything again.
        store.apply_snapshot(MissionSnapshot::default(), &mut scene);
        assert_eq!(scene.viewer().unwrap().entity_count(), 0);
    }

    #[test]
    fn topologies_wait_for_ephemeris() {
        let mut scene = SceneCoordinator::mount(SceneSettings::default());
        let mut store = MissionStore::default();
        store.apply_delta(
            Delta::SetTopologies {
                topologies: vec![fixtures::topology(1, 5, &[(1, 2)], &[])],
            },
            &mut scene,
        );
        assert_eq!(keys(&scene, EntityKey::is_topology), 0);

        store.apply_delta(
            Delta::SetSatellites {
                system: fixtures::system(&[(1, vec![vec![1, 2]])]),
                ephemeris: response(&[1, 2]),
            },
            &mut scene,
        );
        assert_eq!(keys(&scene, EntityKey::is_topology), 1);
    }

    #[test]
    fn new_ephemeris_clears_eligibilities() {
        let mut scene = SceneCoordinator::mount(SceneSettings::default());
        let mut store = MissionStore::default();
        store.apply_snapshot(snapshot(), &mut scene);

        store.apply_delta(
            Delta::SetSatellites {
                system: fixtures::system(&[(1, vec![vec![1, 2]])]),
                ephemeris: response(&[1, 2]),
            },
            &mut scene,
        );
        assert_eq!(store.eligibility_count(), 0);
        assert_eq!(keys(&scene, EntityKey::is_eligibility), 0);
        assert_eq!(keys(&scene, EntityKey::is_topology), 1);
    }

    #[test]
    fn undecodable_ephemeris_removes_satellites() {
        let mut scene = SceneCoordinator::mount(SceneSettings::default());
        let mut store = MissionStore::default();
        store.apply_snapshot(snapshot(), &mut scene);

        let mut bad = response(&[1, 2]);
        if let Some(e) = bad.ephemeris.get_mut(&1) {
            e.position.x_km = "not base64!".to_string();
        }
        store.apply_delta(
            Delta::SetSatellites {
                system: fixtures::system(&[(1, vec![vec![1, 2]])]),
                ephemeris: bad,
            },
            &mut scene,
        );
        assert!(store.ephemeris().is_none());
        assert!(store.status.last_error.is_some());
        assert!(scene
            .viewer()
            .unwrap()
            .collection(CollectionId::Constellation(1))
            .is_none());
    }

    #[test]
    fn feed_status_tracks_connection() {
        let mut scene = SceneCoordinator::unmounted();
        let mut store = MissionStore::default();
        store.handle(Incoming::connected("/tmp/s.sock".into()), &mut scene);
        assert!(store.status.connected);
        store.handle(
            Incoming::from_msg(
                "/tmp/s.sock".into(),
                smartlink_core::Msg::Event {
                    delta: Delta::RemoveStations,
                },
            ),
            &mut scene,
        );
        store.handle(Incoming::disconnected("/tmp/s.sock".into()), &mut scene);
        assert!(!store.status.connected);
        assert_eq!(store.status.events, 1);
        assert_eq!(store.status.endpoint.as_deref(), Some("/tmp/s.sock"));
    }
}
