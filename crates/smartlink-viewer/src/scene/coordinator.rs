//! Entry point of the scene synchronization engine.
//!
//! The store calls `set_*`/`remove_*` with typed payloads; render systems read
//! [`SceneCoordinator::frame`]; pointer systems call [`SceneCoordinator::hover`] and
//! [`SceneCoordinator::click`]. Nothing else touches the layers.
//!
//! Every operation is a logged no-op once the coordinator is disposed (or before it
//! is mounted), and none of them panic.

use bevy::prelude::Resource;
use chrono::{DateTime, Utc};
use smartlink_core::{
    ConstellationId, EligibilityWindow, Ephemeris, SatelliteId, Station, System,
    TopologyWithConstellation,
};
use std::collections::HashMap;

use crate::scene::collection::EntityCollection;
use crate::scene::eligibilities::EligibilityLayer;
use crate::scene::ids::{CollectionId, EntityRef};
use crate::scene::interaction::PickHandler;
use crate::scene::satellites::{SatelliteDetails, SatelliteLayer, SatelliteLookup};
use crate::scene::stations::StationLayer;
use crate::scene::toolbar::{ConstellationChoice, EligibilityFilter, Toolbar, TopologyFilter};
use crate::scene::topologies::TopologyLayer;
use crate::scene::viewer::{Frame, SceneViewer};
use crate::scene::SyncReport;

const CUSTOM_COLLECTION_NAME: &str = "customPrimCollec";

pub type TopologyMap = HashMap<ConstellationId, TopologyWithConstellation>;

#[derive(Debug, Clone, PartialEq)]
pub struct SceneSettings {
    pub satellite_pixel_size: f32,
    pub station_pixel_size: f32,
    pub hover_pixel_size: f32,
    pub link_width: f32,
    pub clock_multiplier: f64,
    /// Hold topologies/eligibilities that arrive before any satellites and
    /// replay them once satellites are installed.
    pub defer_dependent_layers: bool,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            satellite_pixel_size: 10.0,
            station_pixel_size: 12.0,
            hover_pixel_size: 16.0,
            link_width: 2.0,
            clock_multiplier: 1.0,
            defer_dependent_layers: true,
        }
    }
}

#[derive(Debug)]
struct MountedScene {
    viewer: SceneViewer,
    toolbar: Toolbar,
    stations: StationLayer,
    satellites: SatelliteLayer,
    topologies: TopologyLayer,
    eligibilities: EligibilityLayer,
    picker: PickHandler,
    pending_topologies: Option<TopologyMap>,
    pending_eligibilities: Option<Vec<EligibilityWindow>>,
}

impl MountedScene {
    fn new(settings: &SceneSettings) -> Self {
        let mut viewer = SceneViewer::new();
        viewer.clock.multiplier = settings.clock_multiplier;
        let stations = StationLayer::mount(&mut viewer, settings.station_pixel_size);
        viewer.add_collection(EntityCollection::new(
            CollectionId::Custom,
            CUSTOM_COLLECTION_NAME,
        ));
        Self {
            viewer,
            toolbar: Toolbar::new(settings.link_width),
            stations,
            satellites: SatelliteLayer::new(settings.satellite_pixel_size),
            topologies: TopologyLayer::default(),
            eligibilities: EligibilityLayer::default(),
            picker: PickHandler::new(settings.hover_pixel_size),
            pending_topologies: None,
            pending_eligibilities: None,
        }
    }

    fn set_topologies(&mut self, topologies: Option<&TopologyMap>) -> SyncReport {
        self.topologies
            .set(&mut self.viewer, &self.satellites, &mut self.toolbar, topologies)
    }

    fn set_eligibilities(&mut self, windows: &[EligibilityWindow]) -> SyncReport {
        self.eligibilities
            .set(&mut self.viewer, &self.satellites, &mut self.toolbar, windows)
    }

    fn forget_hover_in(&mut self, matches: impl Fn(CollectionId) -> bool) {
        self.picker.forget_where(|r| matches(r.collection));
    }

    fn select_constellation(&mut self, choice: ConstellationChoice) {
        let presence = self.topologies.presence();
        self.toolbar
            .on_constellation_changed(&mut self.viewer, &self.satellites, &presence, choice);
    }
}

#[derive(Resource, Debug, Default)]
pub struct SceneCoordinator {
    settings: SceneSettings,
    scene: Option<MountedScene>,
}

impl SceneCoordinator {
    pub fn mount(settings: SceneSettings) -> Self {
        let scene = MountedScene::new(&settings);
        tracing::info!("scene mounted");
        Self {
            settings,
            scene: Some(scene),
        }
    }

    /// A coordinator with no viewer; every operation is a no-op.
    pub fn unmounted() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self) -> bool {
        self.scene.is_some()
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    fn scene_mut(&mut self, op: &'static str) -> Option<&mut MountedScene> {
        if self.scene.is_none() {
            tracing::debug!(op, "scene not mounted, ignoring");
        }
        self.scene.as_mut()
    }

    pub fn viewer(&self) -> Option<&SceneViewer> {
        self.scene.as_ref().map(|s| &s.viewer)
    }

    pub fn toolbar(&self) -> Option<&Toolbar> {
        self.scene.as_ref().map(|s| &s.toolbar)
    }

    pub fn satellite_count(&self) -> usize {
        self.scene
            .as_ref()
            .map_or(0, |s| s.satellites.satellite_count())
    }

    pub fn satellite_details(&self, id: SatelliteId) -> Option<&SatelliteDetails> {
        self.scene.as_ref()?.satellites.details(id)
    }

    pub fn hovered(&self) -> Option<EntityRef> {
        self.scene.as_ref()?.picker.hovered()
    }

    pub fn frame(&self) -> Frame {
        self.viewer().map(SceneViewer::frame).unwrap_or_default()
    }

    pub fn set_stations(&mut self, stations: &[Station]) -> SyncReport {
        let Some(scene) = self.scene_mut("set_stations") else {
            return SyncReport::default();
        };
        scene.forget_hover_in(|c| c == CollectionId::Stations);
        if stations.is_empty() {
            return scene.stations.remove(&mut scene.viewer);
        }
        scene.stations.set(&mut scene.viewer, stations)
    }

    pub fn remove_stations(&mut self) -> SyncReport {
        let Some(scene) = self.scene_mut("remove_stations") else {
            return SyncReport::default();
        };
        scene.forget_hover_in(|c| c == CollectionId::Stations);
        scene.stations.remove(&mut scene.viewer)
    }

    pub fn set_satellites(&mut self, system: &System, ephemeris: &Ephemeris) -> SyncReport {
        let Some(scene) = self.scene_mut("set_satellites") else {
            return SyncReport::default();
        };
        scene.forget_hover_in(|c| matches!(c, CollectionId::Constellation(_)));
        let mut report = scene.satellites.set(
            &mut scene.viewer,
            &mut scene.toolbar,
            system,
            ephemeris,
        );
        report += scene.topologies.reinstall(
            &mut scene.viewer,
            &scene.satellites,
            &mut scene.toolbar,
        );
        // The selector was reset to `All`: bring visibility and widths in line.
        scene.select_constellation(ConstellationChoice::All);

        if let Some(topologies) = scene.pending_topologies.take() {
            tracing::info!(count = topologies.len(), "replaying deferred topologies");
            report += scene.set_topologies(Some(&topologies));
        }
        if let Some(windows) = scene.pending_eligibilities.take() {
            tracing::info!(count = windows.len(), "replaying deferred eligibilities");
            report += scene.set_eligibilities(&windows);
        }
        report
    }

    /// Removes satellites and the topology links that depend on them.
    pub fn remove_satellites(&mut self) -> SyncReport {
        let Some(scene) = self.scene_mut("remove_satellites") else {
            return SyncReport::default();
        };
        scene.forget_hover_in(|c| matches!(c, CollectionId::Constellation(_)));
        let mut report = scene
            .satellites
            .remove(&mut scene.viewer, &mut scene.toolbar);
        report.removed += scene
            .topologies
            .remove_all(&mut scene.viewer, &mut scene.toolbar);
        scene.toolbar.hide_satellite_selectors();
        report
    }

    pub fn set_topologies(&mut self, topologies: Option<&TopologyMap>) -> SyncReport {
        let defer = self.settings.defer_dependent_layers;
        let Some(scene) = self.scene_mut("set_topologies") else {
            return SyncReport::default();
        };
        if !scene.satellites.is_installed() {
            scene.pending_topologies = match topologies {
                Some(t) if defer => {
                    tracing::warn!(count = t.len(), "topologies before satellites, deferring");
                    Some(t.clone())
                }
                _ => None,
            };
            return SyncReport::default();
        }
        scene.set_topologies(topologies)
    }

    pub fn set_eligibilities(&mut self, windows: &[EligibilityWindow]) -> SyncReport {
        let defer = self.settings.defer_dependent_layers;
        if windows.is_empty() {
            return self.remove_eligibilities();
        }
        let Some(scene) = self.scene_mut("set_eligibilities") else {
            return SyncReport::default();
        };
        if !scene.satellites.is_installed() {
            if defer {
                tracing::warn!(count = windows.len(), "eligibilities before satellites, deferring");
                scene.pending_eligibilities = Some(windows.to_vec());
            } else {
                tracing::warn!(count = windows.len(), "eligibilities before satellites, dropping");
            }
            return SyncReport::default();
        }
        scene.set_eligibilities(windows)
    }

    pub fn remove_eligibilities(&mut self) -> SyncReport {
        let Some(scene) = self.scene_mut("remove_eligibilities") else {
            return SyncReport::default();
        };
        scene.pending_eligibilities = None;
        scene
            .eligibilities
            .remove(&mut scene.viewer, &mut scene.toolbar)
    }

    /// Releases every entity and the viewer. Safe to call more than once.
    pub fn dispose(&mut self) -> SyncReport {
        let Some(mut scene) = self.scene.take() else {
            return SyncReport::default();
        };
        scene.picker.reset();
        let removed = scene.viewer.remove_all();
        tracing::info!(removed, "scene disposed");
        SyncReport {
            removed,
            ..SyncReport::default()
        }
    }

    pub fn hover(&mut self, picked: Option<EntityRef>) {
        if let Some(scene) = self.scene.as_mut() {
            scene.picker.on_move(&mut scene.viewer, picked);
        }
    }

    pub fn click(&mut self, picked: Option<EntityRef>) -> Option<bool> {
        let scene = self.scene.as_mut()?;
        scene.picker.on_click(&mut scene.viewer, picked)
    }

    pub fn reset_clock(&mut self) {
        if let Some(scene) = self.scene_mut("reset_clock") {
            scene.toolbar.reset_clock(&mut scene.viewer);
        }
    }

    pub fn select_constellation(&mut self, choice: ConstellationChoice) {
        if let Some(scene) = self.scene_mut("select_constellation") {
            scene.select_constellation(choice);
        }
    }

    pub fn select_topology_filter(&mut self, filter: TopologyFilter) {
        if let Some(scene) = self.scene_mut("select_topology_filter") {
            scene
                .toolbar
                .on_topology_filter_changed(&mut scene.viewer, filter);
        }
    }

    pub fn select_eligibility_filter(&mut self, filter: EligibilityFilter) {
        if let Some(scene) = self.scene_mut("select_eligibility_filter") {
            scene
                .toolbar
                .on_eligibility_filter_changed(&mut scene.viewer, filter);
        }
    }

    /// Advances the clock by `real_dt_s` wall seconds.
    pub fn tick(&mut self, real_dt_s: f64) -> Option<DateTime<Utc>> {
        let scene = self.scene.as_mut()?;
        Some(scene.viewer.clock.tick(real_dt_s))
    }

    pub fn set_animating(&mut self, animate: bool) {
        if let Some(scene) = self.scene.as_mut() {
            scene.viewer.clock.should_animate = animate;
        }
    }

    pub fn set_clock_multiplier(&mut self, multiplier: f64) {
        self.settings.clock_multiplier = multiplier;
        if let Some(scene) = self.scene.as_mut() {
            scene.viewer.clock.multiplier = multiplier;
        }
    }

    /// Moves the clock to `offset_s` seconds into the timeline.
    pub fn scrub(&mut self, offset_s: f64) {
        if let Some(scene) = self.scene.as_mut() {
            let t = scene.viewer.timeline.at_offset(offset_s);
            scene.viewer.clock.set_current(t);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::fixtures;
    use crate::scene::ids::EntityKey;

    fn mounted() -> SceneCoordinator {
        SceneCoordinator::mount(SceneSettings::default())
    }

    fn count(c: &SceneCoordinator, pred: impl Fn(&EntityKey) -> bool) -> usize {
        c.viewer()
            .map(|v| {
                v.collections()
                    .flat_map(|col| col.keys())
                    .filter(|&k| pred(k))
                    .count()
            })
            .unwrap_or(0)
    }

    fn topology_map(items: Vec<TopologyWithConstellation>) -> TopologyMap {
        fixtures::topologies(items)
    }

    fn install(c: &mut SceneCoordinator) {
        c.set_stations(&[fixtures::station(1), fixtures::station(2)]);
        c.set_satellites(
            &fixtures::system(&[(1, vec![vec![1, 2], vec![3, 4]]), (2, vec![vec![5, 6]])]),
            &fixtures::ephemeris(&[1, 2, 3, 4, 5, 6]),
        );
        c.set_topologies(Some(&topology_map(vec![
            fixtures::topology(1, 10, &[(1, 2), (3, 4)], &[(1, 3)]),
            fixtures::topology(2, 20, &[(5, 6)], &[]),
        ])));
        c.set_eligibilities(&[fixtures::window(1, 1, 0, 10), fixtures::window(5, 2, 5, 15)]);
    }

    #[test]
    fn removal_is_idempotent() {
        let mut c = mounted();
        install(&mut c);

        for _ in 0..2 {
            c.remove_eligibilities();
            c.remove_satellites();
            c.remove_stations();
        }
        assert_eq!(c.viewer().unwrap().entity_count(), 0);

        let first = c.dispose();
        assert_eq!(first.removed, 0);
        assert_eq!(c.dispose(), SyncReport::default());
        assert!(!c.is_mounted());
    }

    #[test]
    fn repeated_sets_do_not_leak() {
        let mut c = mounted();
        install(&mut c);
        let baseline = c.viewer().unwrap().entity_count();
        assert_eq!(baseline, 2 + 6 + 4 + 2);

        install(&mut c);
        install(&mut c);
        assert_eq!(c.viewer().unwrap().entity_count(), baseline);
    }

    #[test]
    fn remove_satellites_drops_topology_links() {
        let mut c = mounted();
        install(&mut c);
        c.remove_satellites();

        assert_eq!(count(&c, EntityKey::is_topology), 0);
        assert_eq!(count(&c, |k| matches!(k, EntityKey::Satellite(_))), 0);
        let tb = c.toolbar().unwrap();
        assert!(!tb.constellation.visible);
        assert!(!tb.topology.visible);

        // Topologies come back as new creations once satellites return.
        c.set_satellites(
            &fixtures::system(&[(1, vec![vec![1, 2], vec![3, 4]])]),
            &fixtures::ephemeris(&[1, 2, 3, 4]),
        );
        let report = c.set_topologies(Some(&topology_map(vec![fixtures::topology(
            1,
            10,
            &[(1, 2)],
            &[],
        )])));
        assert_eq!(report.created, 1);
    }

    #[test]
    fn new_system_prunes_topologies_of_missing_constellations() {
        let mut c = mounted();
        install(&mut c);
        c.set_satellites(
            &fixtures::system(&[(2, vec![vec![5, 6]])]),
            &fixtures::ephemeris(&[5, 6]),
        );
        assert_eq!(count(&c, |k| k.is_topology_of(1)), 0);
        assert_eq!(count(&c, |k| k.is_topology_of(2)), 1);
    }

    #[test]
    fn links_skipped_for_missing_tracks_appear_with_full_ephemeris() {
        let mut c = mounted();
        let system = fixtures::system(&[(1, vec![vec![1, 2], vec![3, 4]])]);
        let topologies = topology_map(vec![fixtures::topology(1, 10, &[(1, 2), (3, 4)], &[])]);

        c.set_satellites(&system, &fixtures::ephemeris(&[1, 2, 3]));
        let report = c.set_topologies(Some(&topologies));
        assert_eq!((report.created, report.skipped), (1, 1));

        c.set_satellites(&system, &fixtures::ephemeris(&[1, 2, 3, 4]));
        assert_eq!(count(&c, |k| k.is_topology_of(1)), 2);

        // Same topology id again: nothing left to create.
        let report = c.set_topologies(Some(&topologies));
        assert_eq!(report.created, 0);
        assert_eq!(count(&c, |k| k.is_topology_of(1)), 2);
    }

    #[test]
    fn links_to_replaced_satellites_are_dropped() {
        let mut c = mounted();
        c.set_satellites(
            &fixtures::system(&[(1, vec![vec![1, 2]])]),
            &fixtures::ephemeris(&[1, 2]),
        );
        c.set_topologies(Some(&topology_map(vec![fixtures::topology(
            1,
            10,
            &[],
            &[(1, 2)],
        )])));
        assert_eq!(count(&c, EntityKey::is_topology), 1);

        c.set_satellites(
            &fixtures::system(&[(1, vec![vec![8, 9]])]),
            &fixtures::ephemeris(&[8, 9]),
        );
        assert_eq!(count(&c, EntityKey::is_topology), 0);
        assert!(c.frame().lines.is_empty());

        c.set_topologies(Some(&topology_map(vec![fixtures::topology(
            1,
            11,
            &[],
            &[(8, 9)],
        )])));
        let links: Vec<String> = c
            .viewer()
            .unwrap()
            .collection(CollectionId::Custom)
            .unwrap()
            .keys()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(links, vec!["TOPO_ConstId-1_inter-plane_SAT1-8_SAT2-9"]);
    }

    #[test]
    fn dependent_layers_wait_for_satellites() {
        let mut c = mounted();
        c.set_stations(&[fixtures::station(1)]);
        let early = c.set_topologies(Some(&topology_map(vec![fixtures::topology(
            1,
            10,
            &[(1, 2)],
            &[],
        )])));
        assert_eq!(early, SyncReport::default());
        c.set_eligibilities(&[fixtures::window(1, 1, 0, 10)]);
        assert_eq!(count(&c, |k| k.is_topology() || k.is_eligibility()), 0);

        let report = c.set_satellites(
            &fixtures::system(&[(1, vec![vec![1, 2]])]),
            &fixtures::ephemeris(&[1, 2]),
        );
        assert_eq!(report.created, 2 + 1 + 1);
        assert_eq!(count(&c, EntityKey::is_topology), 1);
        assert_eq!(count(&c, EntityKey::is_eligibility), 1);
    }

    #[test]
    fn without_deferral_early_layers_are_dropped() {
        let mut c = SceneCoordinator::mount(SceneSettings {
            defer_dependent_layers: false,
            ..SceneSettings::default()
        });
        c.set_topologies(Some(&topology_map(vec![fixtures::topology(
            1,
            10,
            &[(1, 2)],
            &[],
        )])));
        c.set_eligibilities(&[fixtures::window(1, 1, 0, 10)]);
        c.set_satellites(
            &fixtures::system(&[(1, vec![vec![1, 2]])]),
            &fixtures::ephemeris(&[1, 2]),
        );
        assert_eq!(count(&c, |k| k.is_topology() || k.is_eligibility()), 0);
    }

    #[test]
    fn removing_eligibilities_cancels_pending_ones() {
        let mut c = mounted();
        c.set_eligibilities(&[fixtures::window(1, 1, 0, 10)]);
        c.remove_eligibilities();
        c.set_satellites(
            &fixtures::system(&[(1, vec![vec![1]])]),
            &fixtures::ephemeris(&[1]),
        );
        assert_eq!(count(&c, EntityKey::is_eligibility), 0);
    }

    #[test]
    fn disposed_coordinator_ignores_everything() {
        let mut c = mounted();
        install(&mut c);
        assert!(c.dispose().removed > 0);

        assert_eq!(c.set_stations(&[fixtures::station(3)]), SyncReport::default());
        assert_eq!(
            c.set_satellites(&fixtures::system(&[(1, vec![vec![1]])]), &fixtures::ephemeris(&[1])),
            SyncReport::default()
        );
        c.set_eligibilities(&[fixtures::window(1, 1, 0, 1)]);
        c.hover(Some(EntityRef::satellite(1, 1)));
        assert_eq!(c.click(Some(EntityRef::satellite(1, 1))), None);
        c.reset_clock();
        c.select_constellation(ConstellationChoice::All);
        assert_eq!(c.tick(1.0), None);
        assert!(c.frame().points.is_empty());
        assert!(c.viewer().is_none());

        let mut never = SceneCoordinator::unmounted();
        assert_eq!(never.remove_satellites(), SyncReport::default());
        assert_eq!(never.dispose(), SyncReport::default());
    }

    #[test]
    fn hover_and_click_through_coordinator() {
        let mut c = mounted();
        install(&mut c);
        let sat = EntityRef::satellite(1, 2);

        c.hover(Some(sat));
        assert_eq!(c.hovered(), Some(sat));
        let e = c.viewer().unwrap().entity(&sat).unwrap();
        assert_eq!(e.point.as_ref().unwrap().pixel_size, 16.0);

        assert_eq!(c.click(Some(sat)), Some(true));
        assert_eq!(c.click(Some(EntityRef::station(1))), None);
        assert_eq!(c.satellite_details(2).unwrap().index, 2);
    }

    #[test]
    fn reinstalled_satellite_can_be_hovered_again() {
        let mut c = mounted();
        install(&mut c);
        let sat = EntityRef::satellite(1, 2);
        c.hover(Some(sat));

        install(&mut c);
        assert_eq!(c.hovered(), None);
        let pixel_size = |c: &SceneCoordinator| {
            c.viewer().unwrap().entity(&sat).unwrap().point.as_ref().unwrap().pixel_size
        };
        assert_eq!(pixel_size(&c), 10.0);

        c.hover(Some(sat));
        assert_eq!(c.hovered(), Some(sat));
        assert_eq!(pixel_size(&c), 16.0);

        c.remove_satellites();
        assert_eq!(c.hovered(), None);
    }

    #[test]
    fn replacing_stations_forgets_only_station_hover() {
        let mut c = mounted();
        install(&mut c);
        c.hover(Some(EntityRef::satellite(1, 1)));
        c.set_stations(&[fixtures::station(1)]);
        assert_eq!(c.hovered(), Some(EntityRef::satellite(1, 1)));

        c.hover(Some(EntityRef::station(1)));
        c.set_stations(&[fixtures::station(1)]);
        assert_eq!(c.hovered(), None);
    }

    #[test]
    fn clock_controls() {
        let mut c = mounted();
        install(&mut c);
        let start = fixtures::horizon().start;

        c.set_clock_multiplier(60.0);
        c.tick(1.0);
        assert_eq!(
            c.viewer().unwrap().clock.current_time,
            start + chrono::Duration::minutes(1)
        );
        c.reset_clock();
        assert_eq!(c.viewer().unwrap().clock.current_time, start);

        c.set_animating(false);
        c.tick(10.0);
        assert_eq!(c.viewer().unwrap().clock.current_time, start);

        c.scrub(600.0);
        assert_eq!(
            c.viewer().unwrap().clock.current_time,
            start + chrono::Duration::minutes(10)
        );
    }

    #[test]
    fn constellation_selection_through_coordinator() {
        let mut c = mounted();
        install(&mut c);
        c.select_constellation(ConstellationChoice::Constellation(2));

        let v = c.viewer().unwrap();
        assert!(!v.collection(CollectionId::Constellation(1)).unwrap().show);
        assert!(v.collection(CollectionId::Constellation(2)).unwrap().show);
        let tb = c.toolbar().unwrap();
        assert!(tb.topology.visible);
        assert!(!tb.topology.contains(TopologyFilter::Inter));

        c.select_topology_filter(TopologyFilter::None);
        assert!(c.frame().lines.iter().all(|l| l.entity.key.is_eligibility()));
        c.select_eligibility_filter(EligibilityFilter::Hide);
        assert!(c.frame().lines.is_empty());
    }
}
