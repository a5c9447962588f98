//! Snapshot containers
//!
//! A snapshot is an encoded blob plus the id of the object it was taken from.
//! Entity blobs hold the entity's component records; scene blobs hold the
//! entity snapshots of every entity in the scene.

use serde::{Deserialize, Serialize};

use crate::ecs::component::ComponentData;
use crate::ecs::entity::Entity;
use crate::ecs::id_pool::Identifier;
use crate::ecs::scene::Scene;

/// Captured content of a scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneState {
    scene_id: Identifier,
    data: Vec<u8>,
}

impl SceneState {
    pub(crate) const fn new(scene_id: Identifier, data: Vec<u8>) -> Self {
        Self { scene_id, data }
    }

    /// Id of the captured scene
    pub const fn scene_id(&self) -> Identifier {
        self.scene_id
    }

    /// Handle of the captured scene
    pub const fn scene(&self) -> Scene {
        Scene::from_raw(self.scene_id)
    }

    /// Encoded content
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Captured content of an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityState {
    entity_id: Identifier,
    data: Vec<u8>,
}

impl EntityState {
    pub(crate) const fn new(entity_id: Identifier, data: Vec<u8>) -> Self {
        Self { entity_id, data }
    }

    /// Id of the captured entity
    pub const fn entity_id(&self) -> Identifier {
        self.entity_id
    }

    /// Handle of the captured entity
    pub const fn entity(&self) -> Entity {
        Entity::from_raw(self.entity_id)
    }

    /// Encoded content
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// One component inside an entity snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ComponentRecord {
    pub id: Identifier,
    pub data: ComponentData,
}
