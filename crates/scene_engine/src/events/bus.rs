use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use super::{ComponentChanged, EntityChanged, SceneChanged};
use crate::ecs::{Component, ComponentHandle, ComponentKind, Database, PropertyValue, Scene, SharedSystem};
use crate::resources::SharedResourceProvider;

type SceneHandler = Box<dyn FnMut(&Database, &SceneChanged)>;
type EntityHandler = Box<dyn FnMut(&Database, &EntityChanged)>;
type ComponentHandler<T> = Box<dyn for<'a> FnMut(&Database, &ComponentChanged<'a, T>)>;

/// Token returned by every `subscribe_*` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// The scenes whose objects may produce notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    /// The always resident scene
    pub global: Scene,
    /// The active scene, if one is loaded
    pub current: Option<Scene>,
}

impl Visibility {
    /// Whether objects of `scene` are visible
    pub fn admits(&self, scene: Scene) -> bool {
        scene == self.global || self.current == Some(scene)
    }
}

trait ErasedChannel {
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
    fn len(&self) -> usize;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct ComponentChannel<T: Component> {
    handlers: Vec<(SubscriptionId, ComponentHandler<T>)>,
}

impl<T: Component> ErasedChannel for ComponentChannel<T> {
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        remove_handler(&mut self.handlers, id)
    }

    fn len(&self) -> usize {
        self.handlers.len()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn remove_handler<H>(handlers: &mut Vec<(SubscriptionId, H)>, id: SubscriptionId) -> bool {
    let before = handlers.len();
    handlers.retain(|(subscription, _)| *subscription != id);
    handlers.len() != before
}

/// Publish/subscribe hub for database changes
///
/// Closures subscribe to individual channels. Domain systems are attached as
/// a whole and receive the entity and scene channels plus scene switches.
/// Dispatch is synchronous. A system that is busy (for instance the one whose
/// `update` caused the change) gets the notification queued and receives it
/// from [`deliver_deferred`](Self::deliver_deferred) once it is released.
#[derive(Default)]
pub struct ChangeNotificationBus {
    next_subscription: u64,
    component_channels: HashMap<ComponentKind, Box<dyn ErasedChannel>>,
    entity_handlers: Vec<(SubscriptionId, EntityHandler)>,
    scene_handlers: Vec<(SubscriptionId, SceneHandler)>,
    systems: Vec<SharedSystem>,
    deferred: Vec<(usize, Deferred)>,
}

/// Notification held back for a busy system
#[derive(Debug, Clone, Copy)]
enum Deferred {
    Entity(EntityChanged),
    Scene(SceneChanged),
}

impl fmt::Debug for ChangeNotificationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let component_handlers: usize = self.component_channels.values().map(|c| c.len()).sum();
        f.debug_struct("ChangeNotificationBus")
            .field("component_handlers", &component_handlers)
            .field("entity_handlers", &self.entity_handlers.len())
            .field("scene_handlers", &self.scene_handlers.len())
            .field("systems", &self.systems.len())
            .field("deferred", &self.deferred.len())
            .finish()
    }
}

impl ChangeNotificationBus {
    /// Create a bus without subscribers
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> SubscriptionId {
        self.next_subscription += 1;
        SubscriptionId(self.next_subscription)
    }

    /// Listen to property changes of components of type `T`
    pub fn subscribe_component<T, F>(&mut self, handler: F) -> SubscriptionId
    where
        T: Component,
        F: for<'a> FnMut(&Database, &ComponentChanged<'a, T>) + 'static,
    {
        let id = self.next_id();
        let channel = self
            .component_channels
            .entry(T::KIND)
            .or_insert_with(|| {
                Box::new(ComponentChannel::<T> { handlers: Vec::new() }) as Box<dyn ErasedChannel>
            });

        if let Some(channel) = channel.as_any_mut().downcast_mut::<ComponentChannel<T>>() {
            channel.handlers.push((id, Box::new(handler)));
        }
        id
    }

    /// Listen to components being added to, removed from or restored on entities
    pub fn subscribe_entity(&mut self, handler: impl FnMut(&Database, &EntityChanged) + 'static) -> SubscriptionId {
        let id = self.next_id();
        self.entity_handlers.push((id, Box::new(handler)));
        id
    }

    /// Listen to entities joining or leaving scenes
    pub fn subscribe_scene(&mut self, handler: impl FnMut(&Database, &SceneChanged) + 'static) -> SubscriptionId {
        let id = self.next_id();
        self.scene_handlers.push((id, Box::new(handler)));
        id
    }

    /// Remove a subscription from whichever channel holds it
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        remove_handler(&mut self.entity_handlers, id)
            || remove_handler(&mut self.scene_handlers, id)
            || self
                .component_channels
                .values_mut()
                .any(|channel| channel.unsubscribe(id))
    }

    /// Number of closures listening to a component kind
    pub fn component_subscriber_count(&self, kind: ComponentKind) -> usize {
        self.component_channels.get(&kind).map_or(0, |channel| channel.len())
    }

    /// Attach a domain system to the entity, scene and scene-switch channels
    pub fn attach_system(&mut self, system: SharedSystem) {
        self.systems.push(system);
    }

    /// Detach every domain system, returning them
    pub fn detach_systems(&mut self) -> Vec<SharedSystem> {
        self.deferred.clear();
        std::mem::take(&mut self.systems)
    }

    /// Attached domain systems
    pub fn systems(&self) -> &[SharedSystem] {
        &self.systems
    }

    /// Publish a property change of a component
    ///
    /// Silently dropped when nobody listens to `T`, the component is gone or
    /// floating, its entity has no scene, or that scene is not visible.
    /// Returns whether subscribers were invoked.
    pub fn publish_component_changed<T: Component>(
        &mut self,
        db: &Database,
        visibility: Visibility,
        component: ComponentHandle<T>,
        property: &'static str,
        old_value: Option<PropertyValue>,
    ) -> bool {
        let Some(channel) = self.component_channels.get_mut(&T::KIND) else {
            return false;
        };
        if channel.len() == 0 {
            return false;
        }
        let Some(value) = component.get(db) else {
            return false;
        };
        let Some(entity) = db.entity_of(component.erased()) else {
            return false;
        };
        let Some(scene) = db.scene_of(entity) else {
            return false;
        };
        if !visibility.admits(scene) {
            log::trace!("Suppressed {}.{property} change in hidden {scene}", T::KIND);
            return false;
        }
        let Some(channel) = channel.as_any_mut().downcast_mut::<ComponentChannel<T>>() else {
            return false;
        };

        let event = ComponentChanged {
            component,
            value,
            entity,
            scene,
            property,
            old_value,
        };
        for (_, handler) in &mut channel.handlers {
            handler(db, &event);
        }
        true
    }

    /// Publish a change of an entity's component set
    ///
    /// Dropped unless the entity lives in a visible scene. Returns whether
    /// anyone was notified.
    pub fn publish_entity_changed(&mut self, db: &Database, visibility: Visibility, event: EntityChanged) -> bool {
        if !db.scene_of(event.entity).is_some_and(|scene| visibility.admits(scene)) {
            return false;
        }
        if self.entity_handlers.is_empty() && self.systems.is_empty() {
            return false;
        }

        log::trace!("{:?} {} {} on {}", event.kind, event.component_kind, event.component, event.entity);
        for (_, handler) in &mut self.entity_handlers {
            handler(db, &event);
        }
        for (index, system) in self.systems.iter().enumerate() {
            match system.try_borrow_mut() {
                Ok(mut system) => system.on_entity_changed(db, &event),
                Err(_) => {
                    log::trace!("Deferred {:?} for busy system #{index}", event.kind);
                    self.deferred.push((index, Deferred::Entity(event)));
                }
            }
        }
        true
    }

    /// Publish a change of a scene's entity set
    ///
    /// Dropped unless the scene itself is visible.
    pub fn publish_scene_changed(&mut self, db: &Database, visibility: Visibility, event: SceneChanged) -> bool {
        if !visibility.admits(event.scene) {
            return false;
        }
        if self.scene_handlers.is_empty() && self.systems.is_empty() {
            return false;
        }

        log::trace!("{:?} {} in {}", event.kind, event.entity, event.scene);
        for (_, handler) in &mut self.scene_handlers {
            handler(db, &event);
        }
        for (index, system) in self.systems.iter().enumerate() {
            match system.try_borrow_mut() {
                Ok(mut system) => system.on_scene_changed(db, &event),
                Err(_) => {
                    log::trace!("Deferred {:?} for busy system #{index}", event.kind);
                    self.deferred.push((index, Deferred::Scene(event)));
                }
            }
        }
        true
    }

    /// Number of notifications waiting for a busy system
    pub fn deferred_count(&self) -> usize {
        self.deferred.len()
    }

    /// Hand queued notifications to systems that are no longer busy
    ///
    /// Notifications keep their publishing order per system. Those whose
    /// system is still borrowed stay queued. Returns how many were delivered.
    pub fn deliver_deferred(&mut self, db: &Database) -> usize {
        if self.deferred.is_empty() {
            return 0;
        }

        let mut delivered = 0;
        let mut still_busy = Vec::new();
        for (index, notification) in std::mem::take(&mut self.deferred) {
            let Some(system) = self.systems.get(index) else {
                continue;
            };
            let Ok(mut system) = system.try_borrow_mut() else {
                still_busy.push((index, notification));
                continue;
            };
            match notification {
                Deferred::Entity(event) => system.on_entity_changed(db, &event),
                Deferred::Scene(event) => system.on_scene_changed(db, &event),
            }
            delivered += 1;
        }
        self.deferred = still_busy;
        delivered
    }

    /// Tell every attached system that the active scene is about to change
    pub fn broadcast_scenes_will_switch(
        &mut self,
        db: &Database,
        old: Option<Scene>,
        new: Option<Scene>,
        provider: Option<&SharedResourceProvider>,
    ) {
        log::debug!("Scenes will switch: {old:?} -> {new:?}");
        for system in &self.systems {
            match system.try_borrow_mut() {
                Ok(mut system) => system.on_scenes_will_switch(db, old, new, provider.cloned()),
                Err(_) => log::warn!("A busy system missed the switch {old:?} -> {new:?}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::ecs::components::{Movement, Transform};
    use crate::ecs::{ComponentHandle, Entity};
    use crate::events::{EntityEventKind, SceneEventKind};

    fn hosted_transform(db: &mut Database, scene: Scene) -> (Entity, ComponentHandle<Transform>) {
        let entity = db.create_entity().unwrap();
        let id = db.register_component(Transform::new().into_data()).unwrap();
        db.assign_component_to_entity(id, entity);
        db.assign_entity_to_scene(entity, scene);
        (entity, ComponentHandle::from_id(id))
    }

    fn fixture() -> (Database, Visibility, Scene) {
        let mut db = Database::new();
        let global = db.create_scene().unwrap();
        let current = db.create_scene().unwrap();
        let hidden = db.create_scene().unwrap();
        (
            db,
            Visibility {
                global,
                current: Some(current),
            },
            hidden,
        )
    }

    #[test]
    fn visibility_admits_global_and_current_only() {
        let (_, visibility, hidden) = fixture();
        assert!(visibility.admits(visibility.global));
        assert!(visibility.admits(visibility.current.unwrap()));
        assert!(!visibility.admits(hidden));
    }

    #[test]
    fn component_changes_reach_typed_subscribers() {
        let (mut db, visibility, _) = fixture();
        let (entity, transform) = hosted_transform(&mut db, visibility.current.unwrap());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let mut bus = ChangeNotificationBus::new();
        let sink = Rc::clone(&seen);
        bus.subscribe_component::<Transform, _>(move |_, event| {
            sink.borrow_mut().push((event.entity, event.property));
        });

        assert!(bus.publish_component_changed(&db, visibility, transform, "Position", None));
        assert_eq!(*seen.borrow(), vec![(entity, "Position")]);
    }

    #[test]
    fn hidden_floating_and_unsubscribed_changes_are_dropped() {
        let (mut db, visibility, hidden) = fixture();
        let (_, in_hidden) = hosted_transform(&mut db, hidden);
        let floating = ComponentHandle::<Transform>::from_id(
            db.register_component(Transform::new().into_data()).unwrap(),
        );
        let count = Rc::new(RefCell::new(0));

        let mut bus = ChangeNotificationBus::new();
        assert!(!bus.publish_component_changed(&db, visibility, in_hidden, "Position", None));

        let sink = Rc::clone(&count);
        bus.subscribe_component::<Transform, _>(move |_, _| *sink.borrow_mut() += 1);
        assert!(!bus.publish_component_changed(&db, visibility, in_hidden, "Position", None));
        assert!(!bus.publish_component_changed(&db, visibility, floating, "Position", None));
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn channels_are_keyed_by_component_kind() {
        let (mut db, visibility, _) = fixture();
        let (_, transform) = hosted_transform(&mut db, visibility.global);

        let mut bus = ChangeNotificationBus::new();
        bus.subscribe_component::<Movement, _>(|_, _| panic!("wrong channel"));
        assert!(!bus.publish_component_changed(&db, visibility, transform, "Position", None));
        assert_eq!(bus.component_subscriber_count(ComponentKind::Movement), 1);
        assert_eq!(bus.component_subscriber_count(ComponentKind::Transform), 0);
    }

    #[test]
    fn entity_channel_applies_the_visibility_filter() {
        let (mut db, visibility, hidden) = fixture();
        let (visible_entity, visible) = hosted_transform(&mut db, visibility.global);
        let (hidden_entity, secret) = hosted_transform(&mut db, hidden);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let mut bus = ChangeNotificationBus::new();
        let sink = Rc::clone(&seen);
        bus.subscribe_entity(move |_, event| sink.borrow_mut().push(event.entity));

        let added = |entity, component: ComponentHandle<Transform>| EntityChanged {
            entity,
            kind: EntityEventKind::ComponentAdded,
            component: component.erased(),
            component_kind: ComponentKind::Transform,
        };
        assert!(bus.publish_entity_changed(&db, visibility, added(visible_entity, visible)));
        assert!(!bus.publish_entity_changed(&db, visibility, added(hidden_entity, secret)));
        assert_eq!(*seen.borrow(), vec![visible_entity]);
    }

    #[test]
    fn scene_channel_checks_the_scene_itself() {
        let (mut db, visibility, hidden) = fixture();
        let entity = db.create_entity().unwrap();
        let count = Rc::new(RefCell::new(0));

        let mut bus = ChangeNotificationBus::new();
        let sink = Rc::clone(&count);
        let id = bus.subscribe_scene(move |_, _| *sink.borrow_mut() += 1);

        let event = |scene| SceneChanged {
            scene,
            kind: SceneEventKind::EntityAdded,
            entity,
        };
        assert!(bus.publish_scene_changed(&db, visibility, event(visibility.current.unwrap())));
        assert!(!bus.publish_scene_changed(&db, visibility, event(hidden)));
        assert_eq!(*count.borrow(), 1);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert!(!bus.publish_scene_changed(&db, visibility, event(visibility.global)));
    }

    #[derive(Default)]
    struct Journal {
        entity_events: Vec<EntityEventKind>,
        scene_events: Vec<SceneEventKind>,
    }

    impl crate::ecs::DomainSystem for Journal {
        fn name(&self) -> &str {
            "journal"
        }

        fn update(
            &mut self,
            _ctx: &mut crate::context::EngineContext,
            _elapsed: std::time::Duration,
        ) -> Result<(), crate::ecs::SystemError> {
            Ok(())
        }

        fn on_entity_changed(&mut self, _db: &Database, event: &EntityChanged) {
            self.entity_events.push(event.kind);
        }

        fn on_scene_changed(&mut self, _db: &Database, event: &SceneChanged) {
            self.scene_events.push(event.kind);
        }
    }

    #[test]
    fn busy_systems_receive_notifications_once_released() {
        let (mut db, visibility, _) = fixture();
        let (entity, transform) = hosted_transform(&mut db, visibility.global);
        let journal = Rc::new(RefCell::new(Journal::default()));

        let mut bus = ChangeNotificationBus::new();
        bus.attach_system(Rc::clone(&journal) as SharedSystem);

        let busy = journal.borrow_mut();
        assert!(bus.publish_entity_changed(
            &db,
            visibility,
            EntityChanged {
                entity,
                kind: EntityEventKind::ComponentAdded,
                component: transform.erased(),
                component_kind: ComponentKind::Transform,
            },
        ));
        assert!(bus.publish_scene_changed(
            &db,
            visibility,
            SceneChanged {
                scene: visibility.global,
                kind: SceneEventKind::EntityAdded,
                entity,
            },
        ));
        assert_eq!(bus.deferred_count(), 2);
        assert_eq!(bus.deliver_deferred(&db), 0);
        drop(busy);

        assert_eq!(bus.deliver_deferred(&db), 2);
        assert_eq!(bus.deferred_count(), 0);
        assert_eq!(journal.borrow().entity_events, vec![EntityEventKind::ComponentAdded]);
        assert_eq!(journal.borrow().scene_events, vec![SceneEventKind::EntityAdded]);
    }

    #[test]
    fn component_subscriptions_can_be_removed() {
        let mut bus = ChangeNotificationBus::new();
        let id = bus.subscribe_component::<Transform, _>(|_, _| {});
        assert!(bus.unsubscribe(id));
        assert_eq!(bus.component_subscriber_count(ComponentKind::Transform), 0);
    }
}
