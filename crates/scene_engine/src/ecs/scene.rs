//! Scene handles

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::EngineContext;
use crate::ecs::component::{Component, ComponentKind};
use crate::ecs::component_handle::ComponentHandle;
use crate::ecs::database::Database;
use crate::ecs::entity::Entity;
use crate::ecs::error::EcsError;
use crate::ecs::id_pool::{IdNamespace, Identifier};
use crate::ecs::state::SceneState;
use crate::events::SceneEventKind;

/// Handle of a world partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Scene(Identifier);

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene #{}", self.0)
    }
}

impl Scene {
    pub(crate) const fn from_raw(id: Identifier) -> Self {
        Self(id)
    }

    /// Raw id
    pub const fn id(self) -> Identifier {
        self.0
    }

    /// Create an empty scene
    pub fn create(ctx: &mut EngineContext) -> Result<Self, EcsError> {
        ctx.database_mut().create_scene()
    }

    /// Look up a live scene
    pub fn instance(db: &Database, id: Identifier) -> Option<Self> {
        db.scene(id)
    }

    /// Whether the scene is alive
    pub fn exists(self, db: &Database) -> bool {
        db.contains_scene(self)
    }

    /// Whether this is the Global scene
    pub fn is_global(self, ctx: &EngineContext) -> bool {
        ctx.global() == self
    }

    /// Whether this is the Current scene
    pub fn is_current(self, ctx: &EngineContext) -> bool {
        ctx.current() == Some(self)
    }

    /// Destroy the scene with every entity and component in it
    ///
    /// `EntityRemoved` is published for each entity first. Destroying the
    /// Current scene leaves no scene current.
    pub fn destroy(self, ctx: &mut EngineContext) -> Result<(), EcsError> {
        if self.is_global(ctx) {
            return Err(EcsError::GlobalSceneProtected);
        }
        if !ctx.database().contains_scene(self) {
            return Err(EcsError::UnknownScene(self.0));
        }

        for entity in ctx.database().entities_in_scene(self) {
            ctx.notify_scene_changed(self, SceneEventKind::EntityRemoved, entity);
        }
        ctx.database_mut().destroy_scene(self);
        if self.is_current(ctx) {
            ctx.set_current(None);
        }
        Ok(())
    }

    /// Move `entity` into this scene; see [`Entity::assign_to_scene`]
    pub fn add_entity(self, ctx: &mut EngineContext, entity: Entity) -> Result<(), EcsError> {
        entity.assign_to_scene(ctx, self)
    }

    /// Entities of the scene
    pub fn entities(self, db: &Database) -> Vec<Entity> {
        db.entities_in_scene(self)
    }

    /// Entities of the scene holding a component of every listed kind
    pub fn entities_with(self, db: &Database, kinds: &[ComponentKind]) -> Vec<Entity> {
        db.entities_in_scene_with(self, kinds)
    }

    /// Components of type `T` owned by entities of the scene
    pub fn components<T: Component>(self, db: &Database) -> Vec<ComponentHandle<T>> {
        db.components_in_scene(self, T::KIND)
            .into_iter()
            .map(ComponentHandle::from_id)
            .collect()
    }

    /// Number of entities in the scene
    pub fn entity_count(self, db: &Database) -> usize {
        db.entity_count_in_scene(self)
    }

    /// Number of components owned by entities of the scene
    pub fn component_count(self, db: &Database) -> usize {
        db.component_count_in_scene(self)
    }

    /// Number of components of type `T` owned by entities of the scene
    pub fn component_count_of<T: Component>(self, db: &Database) -> usize {
        db.component_count_of_kind_in_scene(self, T::KIND)
    }

    /// Capture every entity of the scene with its components
    pub fn save_state(self, ctx: &EngineContext) -> Result<SceneState, EcsError> {
        ctx.database().save_scene_state(ctx.codec(), self)
    }

    /// Return the scene to a captured state
    ///
    /// Restoring replaces rather than merges: entities that joined the scene
    /// after the capture are destroyed, and so are components attached to
    /// captured entities since then. The Global scene is the exception for
    /// whole entities: it hosts what outlives scene switches, so entities
    /// that joined it later are kept. Captured entities and components come
    /// back under their original ids. Entities that were elsewhere get
    /// `EntityRemoved` on their old scene and `EntityAdded` here; every
    /// restored component gets `ComponentDeserialized`.
    ///
    /// The snapshot is decoded before anything is touched, so a corrupt blob
    /// leaves the scene unchanged.
    pub fn restore_state(self, ctx: &mut EngineContext, state: &SceneState) -> Result<(), EcsError> {
        if state.scene() != self {
            return Err(EcsError::SnapshotMismatch {
                namespace: IdNamespace::Scene,
                expected: self.0,
                found: state.scene_id(),
            });
        }
        if !ctx.database().contains_scene(self) {
            return Err(EcsError::UnknownScene(self.0));
        }

        let codec = *ctx.codec();
        let decoded = Database::decode_scene_state(&codec, state)?
            .iter()
            .map(|entity_state| {
                Ok((
                    entity_state.entity(),
                    Database::decode_entity_state(&codec, entity_state)?,
                ))
            })
            .collect::<Result<Vec<_>, EcsError>>()?;

        if !self.is_global(ctx) {
            let captured: BTreeSet<Entity> = decoded.iter().map(|(entity, _)| *entity).collect();
            for entity in self.entities(ctx.database()) {
                if !captured.contains(&entity) {
                    entity.destroy(ctx)?;
                }
            }
        }

        for (entity, records) in decoded {
            let previous = ctx.database().scene_of(entity);
            if let Some(previous) = previous.filter(|previous| *previous != self) {
                ctx.notify_scene_changed(previous, SceneEventKind::EntityRemoved, entity);
            }

            ctx.database_mut().insert_entity_record(entity);
            ctx.database_mut().assign_entity_to_scene(entity, self);
            entity.restore_records(ctx, records)?;

            if previous != Some(self) {
                ctx.notify_scene_changed(self, SceneEventKind::EntityAdded, entity);
            }
        }
        Ok(())
    }
}
