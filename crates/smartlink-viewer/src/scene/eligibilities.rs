use bevy::color::Color;
use smallvec::smallvec;
use smartlink_core::EligibilityWindow;

use crate::scene::entity::{PolylineGraphics, SceneEntity, TimeWindow, Visibility};
use crate::scene::ids::{CollectionId, EntityKey, EntityRef};
use crate::scene::satellites::SatelliteLookup;
use crate::scene::toolbar::Toolbar;
use crate::scene::viewer::SceneViewer;
use crate::scene::SyncReport;

pub const ELIGIBILITY_COLOR: Color = Color::srgb(0.541, 0.169, 0.886);

/// Satellite to station links, each visible only inside its window.
#[derive(Debug, Default)]
pub struct EligibilityLayer {
    installed: usize,
}

impl EligibilityLayer {
    pub fn installed(&self) -> usize {
        self.installed
    }

    pub fn set(
        &mut self,
        viewer: &mut SceneViewer,
        lookup: &dyn SatelliteLookup,
        toolbar: &mut Toolbar,
        windows: &[EligibilityWindow],
    ) -> SyncReport {
        if windows.is_empty() {
            return self.remove(viewer, toolbar);
        }
        toolbar.show_eligibility_select();

        let Some(custom) = viewer.collection_mut(CollectionId::Custom) else {
            return SyncReport::default();
        };
        let mut report = SyncReport {
            removed: custom.remove_where(EntityKey::is_eligibility),
            ..SyncReport::default()
        };

        for window in windows {
            let Some(satellite) = lookup.satellite_ref(window.satellite_id) else {
                tracing::debug!(
                    satellite_id = window.satellite_id,
                    station_id = window.station_id,
                    "eligibility satellite not rendered, skipping"
                );
                report.skipped += 1;
                continue;
            };
            let key = EntityKey::Eligibility {
                satellite: window.satellite_id,
                station: window.station_id,
                start: window.start,
            };
            if custom.contains(&key) {
                tracing::debug!(id = %key, "duplicate eligibility window");
                report.skipped += 1;
                continue;
            }

            // The station end resolves lazily; it may be installed later.
            let line = PolylineGraphics {
                positions: smallvec![satellite, EntityRef::station(window.station_id)],
                width: toolbar.eligibility_width(lookup, window.satellite_id),
                color: ELIGIBILITY_COLOR,
                show: Visibility::During(TimeWindow {
                    start: window.start,
                    end: window.end,
                }),
            };
            match custom.add(SceneEntity::polyline(key, line)) {
                Ok(()) => report.created += 1,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping eligibility");
                    report.skipped += 1;
                }
            }
        }

        self.installed = report.created;
        tracing::info!(
            created = report.created,
            skipped = report.skipped,
            "eligibilities installed"
        );
        report
    }

    pub fn remove(&mut self, viewer: &mut SceneViewer, toolbar: &mut Toolbar) -> SyncReport {
        toolbar.hide_eligibility_select();
        self.installed = 0;
        let removed = viewer
            .collection_mut(CollectionId::Custom)
            .map(|c| c.remove_where(EntityKey::is_eligibility))
            .unwrap_or(0);
        SyncReport {
            removed,
            ..SyncReport::default()
        }
    }
}
