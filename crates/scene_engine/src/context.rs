//! The engine context
//!
//! Owns the database, the notification bus, the snapshot codec and the two
//! distinguished scenes. Exactly one context exists per running game; it is
//! passed explicitly to everything that reads or mutates game state.

use crate::ecs::{Component, ComponentHandle, ComponentId, Database, EcsError, Entity, PropertyValue, Scene};
use crate::events::{
    ChangeNotificationBus, EntityChanged, EntityEventKind, SceneChanged, SceneEventKind, Visibility,
};
use crate::persistence::BlobCodec;
use crate::resources::SharedResourceProvider;

/// Database, notification bus and scene singletons of one game
#[derive(Debug)]
pub struct EngineContext {
    database: Database,
    bus: ChangeNotificationBus,
    codec: BlobCodec,
    global: Scene,
    current: Option<Scene>,
}

impl EngineContext {
    /// Create a context with a fresh database holding only the Global scene
    pub fn new(codec: BlobCodec) -> Result<Self, EcsError> {
        let mut database = Database::new();
        let global = database.create_scene()?;
        log::debug!("Created global {global}");

        Ok(Self {
            database,
            bus: ChangeNotificationBus::new(),
            codec,
            global,
            current: None,
        })
    }

    /// Read access to the database
    pub fn database(&self) -> &Database {
        &self.database
    }

    pub(crate) fn database_mut(&mut self) -> &mut Database {
        &mut self.database
    }

    /// The notification bus
    pub fn bus(&self) -> &ChangeNotificationBus {
        &self.bus
    }

    /// The notification bus, for subscribing
    pub fn bus_mut(&mut self) -> &mut ChangeNotificationBus {
        &mut self.bus
    }

    /// Snapshot codec
    pub fn codec(&self) -> &BlobCodec {
        &self.codec
    }

    /// The always resident scene
    pub fn global(&self) -> Scene {
        self.global
    }

    /// The active scene, if any has been loaded
    pub fn current(&self) -> Option<Scene> {
        self.current
    }

    pub(crate) fn set_current(&mut self, scene: Option<Scene>) {
        self.current = scene;
    }

    /// Scenes whose objects currently produce notifications
    pub fn visibility(&self) -> Visibility {
        Visibility {
            global: self.global,
            current: self.current,
        }
    }

    pub(crate) fn notify_scene_changed(&mut self, scene: Scene, kind: SceneEventKind, entity: Entity) -> bool {
        let visibility = self.visibility();
        self.bus
            .publish_scene_changed(&self.database, visibility, SceneChanged { scene, kind, entity })
    }

    pub(crate) fn notify_entity_changed(
        &mut self,
        entity: Entity,
        kind: EntityEventKind,
        component: ComponentId,
    ) -> bool {
        let Some(component_kind) = self.database.kind_of(component) else {
            return false;
        };
        let visibility = self.visibility();
        self.bus.publish_entity_changed(
            &self.database,
            visibility,
            EntityChanged {
                entity,
                kind,
                component,
                component_kind,
            },
        )
    }

    pub(crate) fn notify_component_changed<T: Component>(
        &mut self,
        component: ComponentHandle<T>,
        property: &'static str,
        old_value: Option<PropertyValue>,
    ) -> bool {
        let visibility = self.visibility();
        self.bus
            .publish_component_changed(&self.database, visibility, component, property, old_value)
    }

    /// Hand notifications queued for busy systems to those now free
    pub fn deliver_deferred(&mut self) -> usize {
        self.bus.deliver_deferred(&self.database)
    }

    pub(crate) fn broadcast_scenes_will_switch(
        &mut self,
        old: Option<Scene>,
        new: Option<Scene>,
        provider: Option<&SharedResourceProvider>,
    ) {
        self.bus
            .broadcast_scenes_will_switch(&self.database, old, new, provider);
    }
}
