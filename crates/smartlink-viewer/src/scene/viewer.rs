use bevy::color::Color;
use bevy::math::DVec3;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::scene::clock::{SceneClock, Timeline};
use crate::scene::collection::EntityCollection;
use crate::scene::entity::SceneEntity;
use crate::scene::ids::{CollectionId, EntityRef};

#[derive(Debug, Clone)]
pub struct PointPrim {
    pub entity: EntityRef,
    pub position: DVec3,
    pub pixel_size: f32,
    pub color: Color,
    pub label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LinePrim {
    pub entity: EntityRef,
    pub from: DVec3,
    pub to: DVec3,
    pub width: f32,
    pub color: Color,
}

/// Everything drawable at one clock instant.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub points: Vec<PointPrim>,
    pub lines: Vec<LinePrim>,
}

/// Entity collections, clock and timeline: what the render loop reads.
#[derive(Debug, Default)]
pub struct SceneViewer {
    collections: IndexMap<CollectionId, EntityCollection>,
    pub clock: SceneClock,
    pub timeline: Timeline,
}

impl SceneViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any collection registered under the same id.
    pub fn add_collection(&mut self, collection: EntityCollection) {
        self.collections.insert(collection.id, collection);
    }

    pub fn remove_collection(&mut self, id: CollectionId) -> Option<EntityCollection> {
        self.collections.shift_remove(&id)
    }

    pub fn collection(&self, id: CollectionId) -> Option<&EntityCollection> {
        self.collections.get(&id)
    }

    pub fn collection_mut(&mut self, id: CollectionId) -> Option<&mut EntityCollection> {
        self.collections.get_mut(&id)
    }

    pub fn collections(&self) -> impl Iterator<Item = &EntityCollection> {
        self.collections.values()
    }

    pub fn entity(&self, r: &EntityRef) -> Option<&SceneEntity> {
        self.collections.get(&r.collection)?.get(&r.key)
    }

    pub fn entity_mut(&mut self, r: &EntityRef) -> Option<&mut SceneEntity> {
        self.collections.get_mut(&r.collection)?.get_mut(&r.key)
    }

    pub fn entity_count(&self) -> usize {
        self.collections.values().map(EntityCollection::len).sum()
    }

    /// Follows the reference to whatever entity currently holds that key.
    pub fn resolve_position(&self, r: &EntityRef, t: DateTime<Utc>) -> Option<DVec3> {
        self.entity(r)?.position.as_ref()?.value_at(t)
    }

    pub fn remove_all(&mut self) -> usize {
        let n = self.entity_count();
        self.collections.clear();
        n
    }

    pub fn frame(&self) -> Frame {
        self.frame_at(self.clock.current_time)
    }

    pub fn frame_at(&self, t: DateTime<Utc>) -> Frame {
        let mut frame = Frame::default();
        for collection in self.collections.values().filter(|c| c.show) {
            for entity in collection.values().filter(|e| e.show) {
                let entity_ref = EntityRef::new(collection.id, entity.key);
                if let (Some(point), Some(pos)) = (
                    entity.point.as_ref(),
                    entity.position.as_ref().and_then(|p| p.value_at(t)),
                ) {
                    frame.points.push(PointPrim {
                        entity: entity_ref,
                        position: pos,
                        pixel_size: point.pixel_size,
                        color: point.color,
                        label: entity
                            .label
                            .as_ref()
                            .filter(|l| l.show)
                            .map(|l| l.text.clone()),
                    });
                }
                let Some(line) = entity.polyline.as_ref() else {
                    continue;
                };
                if line.width <= 0.0 || !line.show.at(t) {
                    continue;
                }
                let resolved: Option<Vec<DVec3>> = line
                    .positions
                    .iter()
                    .map(|r| self.resolve_position(r, t))
                    .collect();
                let Some(resolved) = resolved else {
                    continue;
                };
                for pair in resolved.windows(2) {
                    frame.lines.push(LinePrim {
                        entity: entity_ref,
                        from: pair[0],
                        to: pair[1],
                        width: line.width,
                        color: line.color,
                    });
                }
            }
        }
        frame
    }
}
