//! Component handles
//!
//! A component only becomes reachable through [`ComponentHandle::create`],
//! which registers it with the database first, so there is no way to hold a
//! component that is not registered.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::context::EngineContext;
use crate::ecs::component::{Component, ComponentKind, PropertyChange, PropertyValue};
use crate::ecs::database::Database;
use crate::ecs::entity::Entity;
use crate::ecs::error::EcsError;
use crate::ecs::id_pool::Identifier;
use crate::events::EntityEventKind;

/// Untyped handle of a registered component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(Identifier);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component #{}", self.0)
    }
}

impl ComponentId {
    pub(crate) const fn from_raw(id: Identifier) -> Self {
        Self(id)
    }

    /// Raw id
    pub const fn id(self) -> Identifier {
        self.0
    }

    /// Look up a registered component
    pub fn instance(db: &Database, id: Identifier) -> Option<Self> {
        db.component_id(id)
    }

    /// Type of the component
    pub fn kind(self, db: &Database) -> Option<ComponentKind> {
        db.kind_of(self)
    }

    /// Entity hosting the component
    pub fn entity(self, db: &Database) -> Option<Entity> {
        db.entity_of(self)
    }

    /// Typed handle, if the component is of type `T`
    pub fn typed<T: Component>(self, db: &Database) -> Option<ComponentHandle<T>> {
        (db.kind_of(self) == Some(T::KIND)).then(|| ComponentHandle::from_id(self))
    }

    /// Attach the component to `entity`
    ///
    /// A no-op if it is already attached there. Fails with
    /// [`EcsError::DuplicateComponentType`] if the entity holds another
    /// component of the same type. Publishes `ComponentRemoved` on the previous
    /// host before the move and `ComponentAdded` on the new host after it.
    pub fn assign_to_entity(self, ctx: &mut EngineContext, entity: Entity) -> Result<(), EcsError> {
        let db = ctx.database();
        let kind = db.kind_of(self).ok_or(EcsError::UnknownComponent(self.0))?;
        if !db.contains_entity(entity) {
            return Err(EcsError::UnknownEntity(entity.id()));
        }

        let previous = db.entity_of(self);
        if previous == Some(entity) {
            return Ok(());
        }
        if db.component_of(entity, kind).is_some_and(|occupant| occupant != self) {
            return Err(EcsError::DuplicateComponentType {
                entity: entity.id(),
                kind,
            });
        }

        if let Some(previous) = previous {
            ctx.notify_entity_changed(previous, EntityEventKind::ComponentRemoved, self);
        }
        ctx.database_mut().assign_component_to_entity(self, entity);
        ctx.notify_entity_changed(entity, EntityEventKind::ComponentAdded, self);
        Ok(())
    }

    /// Destroy the component
    ///
    /// If attached, `ComponentRemoved` is published while the component can
    /// still be resolved to its host, then it is unregistered.
    pub fn destroy(self, ctx: &mut EngineContext) -> Result<(), EcsError> {
        if !ctx.database().contains_component(self) {
            return Err(EcsError::UnknownComponent(self.0));
        }
        if let Some(host) = ctx.database().entity_of(self) {
            ctx.notify_entity_changed(host, EntityEventKind::ComponentRemoved, self);
        }
        ctx.database_mut().unregister_component(self);
        Ok(())
    }
}

/// Typed handle of a registered component of type `T`
pub struct ComponentHandle<T> {
    id: ComponentId,
    marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ComponentHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ComponentHandle<T> {}

impl<T> PartialEq for ComponentHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ComponentHandle<T> {}

impl<T> PartialOrd for ComponentHandle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for ComponentHandle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T> Hash for ComponentHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: Component> fmt::Debug for ComponentHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", T::KIND, self.id.0)
    }
}

impl<T> From<ComponentHandle<T>> for ComponentId {
    fn from(handle: ComponentHandle<T>) -> Self {
        handle.id
    }
}

impl<T: Component> ComponentHandle<T> {
    pub(crate) const fn from_id(id: ComponentId) -> Self {
        Self {
            id,
            marker: PhantomData,
        }
    }

    /// Register a new, unattached component
    pub fn create(ctx: &mut EngineContext, value: T) -> Result<Self, EcsError> {
        let id = ctx.database_mut().register_component(value.into_data())?;
        Ok(Self::from_id(id))
    }

    /// Look up a registered component of type `T`
    pub fn instance(db: &Database, id: Identifier) -> Option<Self> {
        db.component_id(id).and_then(|id| id.typed(db))
    }

    /// Raw id
    pub const fn id(self) -> Identifier {
        self.id.0
    }

    /// Untyped handle
    pub const fn erased(self) -> ComponentId {
        self.id
    }

    /// Current content
    pub fn get(self, db: &Database) -> Option<&T> {
        db.component(self.id)
    }

    /// Entity hosting the component
    pub fn entity(self, db: &Database) -> Option<Entity> {
        db.entity_of(self.id)
    }

    /// Attach to `entity`; see [`ComponentId::assign_to_entity`]
    pub fn assign_to_entity(self, ctx: &mut EngineContext, entity: Entity) -> Result<(), EcsError> {
        self.id.assign_to_entity(ctx, entity)
    }

    /// Destroy the component; see [`ComponentId::destroy`]
    pub fn destroy(self, ctx: &mut EngineContext) -> Result<(), EcsError> {
        self.id.destroy(ctx)
    }

    /// Mutate the component through its setters and publish what changed
    ///
    /// `edit` returns the [`PropertyChange`]s reported by the setters it
    /// called; setters report nothing for writes that keep the value, so
    /// those publish nothing. Returns the number of recorded changes.
    ///
    /// ```
    /// # use scene_engine::prelude::*;
    /// # let mut ctx = EngineContext::new(BlobCodec::default()).unwrap();
    /// let transform = ComponentHandle::create(&mut ctx, Transform::new()).unwrap();
    /// let changed = transform
    ///     .update(&mut ctx, |t| t.set_position(Vec3::new(1.0, 0.0, 0.0)))
    ///     .unwrap();
    /// assert_eq!(changed, 1);
    /// ```
    pub fn update<R>(self, ctx: &mut EngineContext, edit: impl FnOnce(&mut T) -> R) -> Result<usize, EcsError>
    where
        R: IntoIterator<Item = PropertyChange>,
    {
        let value = ctx
            .database_mut()
            .component_data_mut(self.id)
            .and_then(T::from_data_mut)
            .ok_or(EcsError::UnknownComponent(self.id.0))?;

        let changes: Vec<PropertyChange> = edit(value).into_iter().collect();
        for change in &changes {
            ctx.notify_component_changed(self, change.property, change.old_value.clone());
        }
        Ok(changes.len())
    }

    /// Publish a change notification without going through a setter
    pub fn notify_changed(
        self,
        ctx: &mut EngineContext,
        property: &'static str,
        old_value: Option<PropertyValue>,
    ) -> bool {
        ctx.notify_component_changed(self, property, old_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Collider, Transform};
    use crate::persistence::BlobCodec;

    fn context() -> EngineContext {
        EngineContext::new(BlobCodec::default()).unwrap()
    }

    #[test]
    fn created_components_are_registered_and_floating() {
        let mut ctx = context();
        let handle = ComponentHandle::create(&mut ctx, Collider::new()).unwrap();

        assert!(ctx.database().contains_component(handle.erased()));
        assert_eq!(handle.entity(ctx.database()), None);
        assert_eq!(ComponentHandle::<Collider>::instance(ctx.database(), handle.id()), Some(handle));
        assert_eq!(ComponentHandle::<Transform>::instance(ctx.database(), handle.id()), None);
    }

    #[test]
    fn manual_notifications_follow_the_visibility_filter() {
        let mut ctx = context();
        let global = ctx.global();
        let hidden = crate::ecs::Scene::create(&mut ctx).unwrap();
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = std::rc::Rc::clone(&seen);
        ctx.bus_mut()
            .subscribe_component::<Transform, _>(move |_, event| sink.borrow_mut().push(event.property));

        let entity = Entity::create(&mut ctx).unwrap();
        let transform = entity.add_new(&mut ctx, Transform::new()).unwrap();
        assert!(!transform.notify_changed(&mut ctx, "Position", None));

        entity.assign_to_scene(&mut ctx, global).unwrap();
        assert!(transform.notify_changed(&mut ctx, "Position", None));

        entity.assign_to_scene(&mut ctx, hidden).unwrap();
        assert!(!transform.notify_changed(&mut ctx, "Scale", None));
        assert_eq!(*seen.borrow(), vec!["Position"]);
    }

    #[test]
    fn update_on_a_destroyed_component_fails() {
        let mut ctx = context();
        let handle = ComponentHandle::create(&mut ctx, Transform::new()).unwrap();
        handle.destroy(&mut ctx).unwrap();

        assert!(matches!(
            handle.update(&mut ctx, |t| t.reset_orientation()),
            Err(EcsError::UnknownComponent(_))
        ));
        assert!(matches!(handle.destroy(&mut ctx), Err(EcsError::UnknownComponent(_))));
    }

    #[test]
    fn update_counts_only_real_changes() {
        let mut ctx = context();
        let handle = ComponentHandle::create(&mut ctx, Collider::new()).unwrap();

        let changed = handle
            .update(&mut ctx, |c| [c.set_mass(1.0), c.set_be_precise(true)].into_iter().flatten())
            .unwrap();
        assert_eq!(changed, 1);
        assert!(handle.get(ctx.database()).unwrap().be_precise());
    }
}
