use bevy::color::Color;
use smartlink_core::Station;

use crate::scene::collection::EntityCollection;
use crate::scene::entity::{LabelGraphics, PointGraphics, PositionProperty, SceneEntity};
use crate::scene::ids::{CollectionId, EntityKey};
use crate::scene::viewer::SceneViewer;
use crate::scene::SyncReport;
use crate::util::geo::location_to_ecef;

pub const STATION_COLOR: Color = Color::srgb(0.647, 0.165, 0.165);

const COLLECTION_NAME: &str = "stations";

#[derive(Debug)]
pub struct StationLayer {
    pixel_size: f32,
}

impl StationLayer {
    /// Registers the (empty) station collection with the viewer.
    pub fn mount(viewer: &mut SceneViewer, pixel_size: f32) -> Self {
        viewer.add_collection(EntityCollection::new(CollectionId::Stations, COLLECTION_NAME));
        Self { pixel_size }
    }

    pub fn set(&mut self, viewer: &mut SceneViewer, stations: &[Station]) -> SyncReport {
        let Some(collection) = viewer.collection_mut(CollectionId::Stations) else {
            return SyncReport::default();
        };
        let mut report = SyncReport {
            removed: collection.remove_all(),
            ..SyncReport::default()
        };

        for station in stations {
            let entity = SceneEntity::point(
                EntityKey::Station(station.id),
                PositionProperty::Constant(location_to_ecef(&station.location)),
                PointGraphics::new(self.pixel_size, STATION_COLOR),
            )
            .with_label(station.label().map(LabelGraphics::hidden));

            match collection.add(entity) {
                Ok(()) => report.created += 1,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping station");
                    report.skipped += 1;
                }
            }
        }
        tracing::info!(created = report.created, "stations installed");
        report
    }

    pub fn remove(&mut self, viewer: &mut SceneViewer) -> SyncReport {
        let removed = viewer
            .collection_mut(CollectionId::Stations)
            .map(EntityCollection::remove_all)
            .unwrap_or(0);
        SyncReport {
            removed,
            ..SyncReport::default()
        }
    }
}
