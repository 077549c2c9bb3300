use indexmap::IndexMap;

use crate::scene::entity::SceneEntity;
use crate::scene::ids::{CollectionId, EntityKey};

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("entity {id} already exists in collection {collection}")]
    DuplicateId { collection: CollectionId, id: String },
}

/// Named, insertion-ordered set of entities (one "data source").
#[derive(Debug, Clone)]
pub struct EntityCollection {
    pub id: CollectionId,
    pub name: String,
    pub show: bool,
    entities: IndexMap<EntityKey, SceneEntity>,
}

impl EntityCollection {
    pub fn new(id: CollectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            show: true,
            entities: IndexMap::new(),
        }
    }

    pub fn add(&mut self, entity: SceneEntity) -> Result<(), SceneError> {
        if self.entities.contains_key(&entity.key) {
            return Err(SceneError::DuplicateId {
                collection: self.id,
                id: entity.key.to_string(),
            });
        }
        self.entities.insert(entity.key, entity);
        Ok(())
    }

    pub fn get(&self, key: &EntityKey) -> Option<&SceneEntity> {
        self.entities.get(key)
    }

    pub fn get_mut(&mut self, key: &EntityKey) -> Option<&mut SceneEntity> {
        self.entities.get_mut(key)
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entities.contains_key(key)
    }

    pub fn remove(&mut self, key: &EntityKey) -> Option<SceneEntity> {
        self.entities.shift_remove(key)
    }

    /// Removes every entity whose key matches; returns how many went away.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&EntityKey) -> bool) -> usize {
        let before = self.entities.len();
        self.entities.retain(|k, _| !pred(k));
        before - self.entities.len()
    }

    pub fn remove_all(&mut self) -> usize {
        let n = self.entities.len();
        self.entities.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &SceneEntity> {
        self.entities.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut SceneEntity> {
        self.entities.values_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &EntityKey> {
        self.entities.keys()
    }
}
