//! Change notifications
//!
//! Three channels connect the database to domain systems:
//!
//! - component channels, one per component kind, for property changes
//! - the entity channel, for components being added, removed or restored
//! - the scene channel, for entities joining or leaving a scene
//!
//! All of them are gated by [`Visibility`]: only objects living in the
//! Current or the Global scene produce notifications.

mod bus;

pub use bus::{ChangeNotificationBus, SubscriptionId, Visibility};

use crate::ecs::{Component, ComponentHandle, ComponentId, ComponentKind, Entity, PropertyValue, Scene};

/// What happened to a scene's entity set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneEventKind {
    /// An entity joined the scene
    EntityAdded,
    /// An entity is about to leave the scene
    EntityRemoved,
}

/// What happened to an entity's component set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityEventKind {
    /// A component was attached
    ComponentAdded,
    /// A component is about to be detached or destroyed
    ComponentRemoved,
    /// A component's content was replaced from a snapshot
    ComponentDeserialized,
}

/// Notification on the scene channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneChanged {
    /// Scene whose entity set changed
    pub scene: Scene,
    /// Kind of change
    pub kind: SceneEventKind,
    /// Entity that joined or left
    pub entity: Entity,
}

/// Notification on the entity channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityChanged {
    /// Entity whose component set changed
    pub entity: Entity,
    /// Kind of change
    pub kind: EntityEventKind,
    /// Component concerned
    pub component: ComponentId,
    /// Type of the component concerned
    pub component_kind: ComponentKind,
}

/// Notification on a component channel
///
/// `value` already holds the new property value.
#[derive(Debug)]
pub struct ComponentChanged<'a, T: Component> {
    /// Component that changed
    pub component: ComponentHandle<T>,
    /// Current content of the component
    pub value: &'a T,
    /// Entity hosting the component
    pub entity: Entity,
    /// Scene hosting the entity
    pub scene: Scene,
    /// Name of the changed property
    pub property: &'static str,
    /// Value before the change, when the sender provided it
    pub old_value: Option<PropertyValue>,
}
