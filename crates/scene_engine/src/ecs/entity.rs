//! Entity handles
//!
//! An entity is just an id; its content is the set of components attached to
//! it. The methods here forward to the database and publish the matching
//! notifications.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::EngineContext;
use crate::ecs::component::{Component, ComponentKind};
use crate::ecs::component_handle::{ComponentHandle, ComponentId};
use crate::ecs::database::Database;
use crate::ecs::error::EcsError;
use crate::ecs::id_pool::{IdNamespace, Identifier};
use crate::ecs::scene::Scene;
use crate::ecs::state::{ComponentRecord, EntityState};
use crate::events::{EntityEventKind, SceneEventKind};

/// Handle of a game object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entity(Identifier);

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity #{}", self.0)
    }
}

impl Entity {
    pub(crate) const fn from_raw(id: Identifier) -> Self {
        Self(id)
    }

    /// Raw id
    pub const fn id(self) -> Identifier {
        self.0
    }

    /// Create an entity without components and without a scene
    pub fn create(ctx: &mut EngineContext) -> Result<Self, EcsError> {
        ctx.database_mut().create_entity()
    }

    /// Look up a live entity
    pub fn instance(db: &Database, id: Identifier) -> Option<Self> {
        db.entity(id)
    }

    /// Whether the entity is alive
    pub fn exists(self, db: &Database) -> bool {
        db.contains_entity(self)
    }

    /// Destroy the entity and every component attached to it
    ///
    /// Publishes `EntityRemoved` on its scene first.
    pub fn destroy(self, ctx: &mut EngineContext) -> Result<(), EcsError> {
        if !ctx.database().contains_entity(self) {
            return Err(EcsError::UnknownEntity(self.0));
        }
        if let Some(scene) = ctx.database().scene_of(self) {
            ctx.notify_scene_changed(scene, SceneEventKind::EntityRemoved, self);
        }
        ctx.database_mut().destroy_entity(self);
        Ok(())
    }

    /// Scene hosting the entity
    pub fn scene(self, db: &Database) -> Option<Scene> {
        db.scene_of(self)
    }

    /// Move the entity, with all its components, into `scene`
    ///
    /// A no-op if it is already there. Publishes `EntityRemoved` on the old
    /// scene before the move and `EntityAdded` on the new one after it.
    pub fn assign_to_scene(self, ctx: &mut EngineContext, scene: Scene) -> Result<(), EcsError> {
        let db = ctx.database();
        if !db.contains_entity(self) {
            return Err(EcsError::UnknownEntity(self.0));
        }
        if !db.contains_scene(scene) {
            return Err(EcsError::UnknownScene(scene.id()));
        }

        let previous = db.scene_of(self);
        if previous == Some(scene) {
            return Ok(());
        }
        if let Some(previous) = previous {
            ctx.notify_scene_changed(previous, SceneEventKind::EntityRemoved, self);
        }
        ctx.database_mut().assign_entity_to_scene(self, scene);
        ctx.notify_scene_changed(scene, SceneEventKind::EntityAdded, self);
        Ok(())
    }

    /// Attach an existing component
    ///
    /// Fails with [`EcsError::DuplicateComponentType`] if the entity already
    /// holds another `T`.
    pub fn add_component<T: Component>(
        self,
        ctx: &mut EngineContext,
        component: ComponentHandle<T>,
    ) -> Result<(), EcsError> {
        component.assign_to_entity(ctx, self)
    }

    /// Register `value` as a new component and attach it
    ///
    /// Nothing is registered if the entity already holds a `T`.
    pub fn add_new<T: Component>(self, ctx: &mut EngineContext, value: T) -> Result<ComponentHandle<T>, EcsError> {
        if !ctx.database().contains_entity(self) {
            return Err(EcsError::UnknownEntity(self.0));
        }
        if self.has::<T>(ctx.database()) {
            return Err(EcsError::DuplicateComponentType {
                entity: self.0,
                kind: T::KIND,
            });
        }

        let component = ComponentHandle::create(ctx, value)?;
        component.assign_to_entity(ctx, self)?;
        Ok(component)
    }

    /// The entity's component of type `T`
    pub fn component<T: Component>(self, db: &Database) -> Option<ComponentHandle<T>> {
        db.component_of(self, T::KIND).map(ComponentHandle::from_id)
    }

    /// Content of the entity's component of type `T`
    pub fn get<T: Component>(self, db: &Database) -> Option<&T> {
        db.component_of(self, T::KIND).and_then(|id| db.component(id))
    }

    /// Whether a `T` is attached
    pub fn has<T: Component>(self, db: &Database) -> bool {
        db.component_of(self, T::KIND).is_some()
    }

    /// Whether a component of every listed kind is attached
    pub fn has_all(self, db: &Database, kinds: &[ComponentKind]) -> bool {
        db.has_all(self, kinds)
    }

    /// Attached components, ordered by kind
    pub fn components(self, db: &Database) -> Vec<(ComponentKind, ComponentId)> {
        db.components_of(self)
    }

    /// Number of attached components
    pub fn component_count(self, db: &Database) -> usize {
        db.components_of(self).len()
    }

    /// Capture the entity's components
    pub fn save_state(self, ctx: &EngineContext) -> Result<EntityState, EcsError> {
        ctx.database().save_entity_state(ctx.codec(), self)
    }

    /// Return the entity's components to a captured state
    ///
    /// Components attached since the capture are destroyed, every captured
    /// component is written back under its id and reattached, and
    /// `ComponentDeserialized` is published for each of them.
    pub fn restore_state(self, ctx: &mut EngineContext, state: &EntityState) -> Result<(), EcsError> {
        if state.entity() != self {
            return Err(EcsError::SnapshotMismatch {
                namespace: IdNamespace::Entity,
                expected: self.0,
                found: state.entity_id(),
            });
        }

        let records = Database::decode_entity_state(ctx.codec(), state)?;
        self.restore_records(ctx, records)
    }

    pub(crate) fn restore_records(self, ctx: &mut EngineContext, records: Vec<ComponentRecord>) -> Result<(), EcsError> {
        let captured: BTreeSet<ComponentId> = records.iter().map(|r| ComponentId::from_raw(r.id)).collect();

        for (_, component) in self.components(ctx.database()) {
            if !captured.contains(&component) {
                component.destroy(ctx)?;
            }
        }

        for component in &captured {
            let host = ctx.database().entity_of(*component);
            if let Some(host) = host.filter(|host| *host != self) {
                ctx.notify_entity_changed(host, EntityEventKind::ComponentRemoved, *component);
            }
        }

        let restored = ctx.database_mut().apply_component_records(self, records);
        for component in restored {
            ctx.notify_entity_changed(self, EntityEventKind::ComponentDeserialized, component);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::ecs::components::{AudioSource, Collider, Movement, Transform};
    use crate::events::EntityChanged;
    use crate::foundation::math::Vec3;
    use crate::persistence::BlobCodec;

    fn context() -> EngineContext {
        EngineContext::new(BlobCodec::default()).unwrap()
    }

    fn record_entity_events(ctx: &mut EngineContext) -> Rc<RefCell<Vec<EntityChanged>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        ctx.bus_mut()
            .subscribe_entity(move |_, event| sink.borrow_mut().push(*event));
        log
    }

    #[test]
    fn duplicate_component_type_is_rejected() {
        let mut ctx = context();
        let entity = Entity::create(&mut ctx).unwrap();
        let first = entity.add_new(&mut ctx, Transform::new()).unwrap();

        let second = ComponentHandle::create(&mut ctx, Transform::new()).unwrap();
        let err = entity.add_component(&mut ctx, second).unwrap_err();
        assert!(matches!(
            err,
            EcsError::DuplicateComponentType {
                kind: ComponentKind::Transform,
                ..
            }
        ));
        assert_eq!(entity.component::<Transform>(ctx.database()), Some(first));
        assert_eq!(entity.component_count(ctx.database()), 1);

        let before = ctx.database().component_count();
        assert!(entity.add_new(&mut ctx, Transform::new()).is_err());
        assert_eq!(ctx.database().component_count(), before);
    }

    #[test]
    fn reattaching_to_the_same_entity_is_silent() {
        let mut ctx = context();
        let entity = Entity::create(&mut ctx).unwrap();
        let global = ctx.global();
        entity.assign_to_scene(&mut ctx, global).unwrap();
        let collider = entity.add_new(&mut ctx, Collider::new()).unwrap();

        let log = record_entity_events(&mut ctx);
        entity.add_component(&mut ctx, collider).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn moving_a_component_publishes_removed_then_added() {
        let mut ctx = context();
        let global = ctx.global();
        let first = Entity::create(&mut ctx).unwrap();
        let second = Entity::create(&mut ctx).unwrap();
        first.assign_to_scene(&mut ctx, global).unwrap();
        second.assign_to_scene(&mut ctx, global).unwrap();
        let movement = first.add_new(&mut ctx, Movement::new()).unwrap();

        let log = record_entity_events(&mut ctx);
        second.add_component(&mut ctx, movement).unwrap();

        let events: Vec<_> = log.borrow().iter().map(|e| (e.entity, e.kind)).collect();
        assert_eq!(
            events,
            vec![
                (first, EntityEventKind::ComponentRemoved),
                (second, EntityEventKind::ComponentAdded)
            ]
        );
        assert!(!first.has::<Movement>(ctx.database()));
    }

    #[test]
    fn component_removal_is_published_while_still_resolvable() {
        let mut ctx = context();
        let entity = Entity::create(&mut ctx).unwrap();
        let global = ctx.global();
        entity.assign_to_scene(&mut ctx, global).unwrap();
        let source = entity.add_new(&mut ctx, AudioSource::new("beep")).unwrap();

        let resolved = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&resolved);
        ctx.bus_mut().subscribe_entity(move |db, event| {
            if event.kind == EntityEventKind::ComponentRemoved {
                *sink.borrow_mut() = db.entity_of(event.component);
            }
        });

        source.destroy(&mut ctx).unwrap();
        assert_eq!(*resolved.borrow(), Some(entity));
        assert!(!entity.has::<AudioSource>(ctx.database()));
    }

    #[test]
    fn destroying_publishes_entity_removed_first() {
        let mut ctx = context();
        let entity = Entity::create(&mut ctx).unwrap();
        entity.add_new(&mut ctx, Transform::new()).unwrap();
        let global = ctx.global();
        entity.assign_to_scene(&mut ctx, global).unwrap();

        let components_seen = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&components_seen);
        ctx.bus_mut().subscribe_scene(move |db, event| {
            *sink.borrow_mut() = db.components_of(event.entity).len();
        });

        entity.destroy(&mut ctx).unwrap();
        assert_eq!(*components_seen.borrow(), 1);
        assert!(!entity.exists(ctx.database()));
        assert!(matches!(entity.destroy(&mut ctx), Err(EcsError::UnknownEntity(_))));
    }

    #[test]
    fn restore_discards_later_components_and_values() {
        let mut ctx = context();
        let entity = Entity::create(&mut ctx).unwrap();
        let global = ctx.global();
        entity.assign_to_scene(&mut ctx, global).unwrap();
        let transform = entity
            .add_new(&mut ctx, Transform::new().with_position(Vec3::new(1.0, 1.0, 1.0)))
            .unwrap();
        let state = entity.save_state(&ctx).unwrap();

        transform.update(&mut ctx, |t| t.set_position(Vec3::zeros())).unwrap();
        let late = entity.add_new(&mut ctx, Movement::new()).unwrap();

        let log = record_entity_events(&mut ctx);
        entity.restore_state(&mut ctx, &state).unwrap();

        assert_eq!(
            entity.get::<Transform>(ctx.database()).unwrap().position(),
            Vec3::new(1.0, 1.0, 1.0)
        );
        assert!(!ctx.database().contains_component(late.erased()));
        let kinds: Vec<_> = log.borrow().iter().map(|e| (e.component, e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (late.erased(), EntityEventKind::ComponentRemoved),
                (transform.erased(), EntityEventKind::ComponentDeserialized)
            ]
        );
    }

    #[test]
    fn snapshot_of_another_entity_is_refused() {
        let mut ctx = context();
        let first = Entity::create(&mut ctx).unwrap();
        let second = Entity::create(&mut ctx).unwrap();
        let state = first.save_state(&ctx).unwrap();

        assert!(matches!(
            second.restore_state(&mut ctx, &state),
            Err(EcsError::SnapshotMismatch { .. })
        ));
    }
}
