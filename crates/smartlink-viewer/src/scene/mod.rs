//! Scene synchronization engine: keeps the viewer's entity graph consistent with
//! the mission data across the station, satellite, topology and eligibility layers.

pub mod clock;
pub mod collection;
pub mod coordinator;
pub mod eligibilities;
pub mod entity;
pub mod ids;
pub mod interaction;
pub mod satellites;
pub mod stations;
pub mod toolbar;
pub mod topologies;
pub mod viewer;

#[cfg(test)]
pub(crate) mod fixtures;

use std::ops::AddAssign;

pub use coordinator::{SceneCoordinator, SceneSettings, TopologyMap};
pub use ids::{CollectionId, EntityKey, EntityRef};
pub use toolbar::{ConstellationChoice, EligibilityFilter, TopologyFilter};
pub use viewer::{Frame, LinePrim, PointPrim};

/// What a layer operation did to the scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub removed: usize,
    /// Items omitted because a referenced entity is not rendered (or duplicated).
    pub skipped: usize,
}

impl AddAssign for SyncReport {
    fn add_assign(&mut self, rhs: Self) {
        self.created += rhs.created;
        self.removed += rhs.removed;
        self.skipped += rhs.skipped;
    }
}
