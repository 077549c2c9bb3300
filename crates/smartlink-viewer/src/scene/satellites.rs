use bevy::color::Color;
use smartlink_core::{
    ConstellationId, Ephemeris, SampledPosition, SatelliteId, SatelliteOrbit, System,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::scene::clock::ClockRange;
use crate::scene::collection::EntityCollection;
use crate::scene::entity::{LabelGraphics, PointGraphics, PositionProperty, SceneEntity};
use crate::scene::ids::{CollectionId, EntityKey, EntityRef};
use crate::scene::toolbar::Toolbar;
use crate::scene::viewer::SceneViewer;
use crate::scene::SyncReport;

/// Constellation colors, assigned by position in the system.
pub const PALETTE: [Color; 4] = [
    Color::srgb(0.0, 0.0, 1.0),
    Color::srgb(0.0, 0.545, 0.545),
    Color::srgb(0.0, 0.0, 0.545),
    Color::srgb(0.282, 0.239, 0.545),
];

/// Read-only view of the installed satellites, handed to the layers that link to them.
pub trait SatelliteLookup {
    fn is_installed(&self) -> bool;

    fn constellation_of(&self, satellite: SatelliteId) -> Option<ConstellationId>;

    /// Constellation ids in system order.
    fn constellation_ids(&self) -> Vec<ConstellationId>;

    /// Live reference to a rendered satellite.
    fn satellite_ref(&self, satellite: SatelliteId) -> Option<EntityRef> {
        self.constellation_of(satellite)
            .map(|cid| EntityRef::satellite(cid, satellite))
    }
}

/// Per-satellite data kept for tooltips.
#[derive(Debug, Clone)]
pub struct SatelliteDetails {
    pub constellation_name: String,
    pub plane: usize,
    pub index: usize,
    pub orbit: SatelliteOrbit,
    pub velocity: Option<Arc<SampledPosition>>,
}

#[derive(Debug, Default)]
pub struct SatelliteLayer {
    pixel_size: f32,
    installed: bool,
    constellations: Vec<ConstellationId>,
    corres_sat_const: HashMap<SatelliteId, ConstellationId>,
    details: HashMap<SatelliteId, SatelliteDetails>,
}

impl SatelliteLayer {
    pub fn new(pixel_size: f32) -> Self {
        Self {
            pixel_size,
            ..Self::default()
        }
    }

    pub fn details(&self, satellite: SatelliteId) -> Option<&SatelliteDetails> {
        self.details.get(&satellite)
    }

    pub fn satellite_count(&self) -> usize {
        self.corres_sat_const.len()
    }

    pub fn set(
        &mut self,
        viewer: &mut SceneViewer,
        toolbar: &mut Toolbar,
        system: &System,
        ephemeris: &Ephemeris,
    ) -> SyncReport {
        let mut report = SyncReport {
            removed: self.teardown(viewer),
            ..SyncReport::default()
        };

        let mut options = Vec::with_capacity(system.constellations.len());
        for (i, constellation) in system.constellations.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            let cid = constellation.id;
            if self.constellations.contains(&cid) {
                let dropped = constellation.satellite_ids().count();
                tracing::warn!(
                    constellation_id = cid,
                    satellites = dropped,
                    "duplicate constellation in system, ignoring"
                );
                report.skipped += dropped;
                continue;
            }
            let mut collection =
                EntityCollection::new(CollectionId::Constellation(cid), constellation.name.clone());

            for (plane_idx, plane) in constellation.satellites.iter().enumerate() {
                for (sat_idx, satellite) in plane.iter().enumerate() {
                    let Some(track) = ephemeris.track(satellite.id) else {
                        tracing::debug!(
                            satellite_id = satellite.id,
                            constellation_id = cid,
                            "no ephemeris for satellite, skipping"
                        );
                        report.skipped += 1;
                        continue;
                    };

                    let label = format!("Satellite ({}, {})", plane_idx + 1, sat_idx + 1);
                    let entity = SceneEntity::point(
                        EntityKey::Satellite(satellite.id),
                        PositionProperty::Sampled(Arc::clone(&track.position)),
                        PointGraphics::new(self.pixel_size, color),
                    )
                    .with_label(Some(LabelGraphics::hidden(label)))
                    .selectable();

                    if let Err(e) = collection.add(entity) {
                        tracing::debug!(error = %e, "skipping satellite");
                        report.skipped += 1;
                        continue;
                    }
                    report.created += 1;
                    self.corres_sat_const.insert(satellite.id, cid);
                    self.details.insert(
                        satellite.id,
                        SatelliteDetails {
                            constellation_name: constellation.name.clone(),
                            plane: plane_idx + 1,
                            index: sat_idx + 1,
                            orbit: satellite.orbit.clone(),
                            velocity: track.velocity.clone(),
                        },
                    );
                }
            }

            viewer.add_collection(collection);
            self.constellations.push(cid);
            options.push((cid, constellation.name.clone()));
        }

        let horizon = &ephemeris.horizon;
        viewer
            .clock
            .set_bounds(horizon.start, horizon.end, ClockRange::LoopStop);
        viewer.timeline.zoom_to(horizon.start, horizon.end);
        toolbar.set_constellation_options(&options);
        self.installed = true;

        tracing::info!(
            system_id = system.id,
            constellations = self.constellations.len(),
            created = report.created,
            skipped = report.skipped,
            "satellites installed"
        );
        report
    }

    pub fn remove(&mut self, viewer: &mut SceneViewer, toolbar: &mut Toolbar) -> SyncReport {
        toolbar.hide_satellite_selectors();
        SyncReport {
            removed: self.teardown(viewer),
            ..SyncReport::default()
        }
    }

    fn teardown(&mut self, viewer: &mut SceneViewer) -> usize {
        let removed = self
            .constellations
            .drain(..)
            .filter_map(|cid| viewer.remove_collection(CollectionId::Constellation(cid)))
            .map(|c| c.len())
            .sum();
        self.corres_sat_const.clear();
        self.details.clear();
        self.installed = false;
        removed
    }
}

impl SatelliteLookup for SatelliteLayer {
    fn is_installed(&self) -> bool {
        self.installed
    }

    fn constellation_of(&self, satellite: SatelliteId) -> Option<ConstellationId> {
        self.corres_sat_const.get(&satellite).copied()
    }

    fn constellation_ids(&self) -> Vec<ConstellationId> {
        self.constellations.clone()
    }
}
