//! The entity-component database
//!
//! A multi-index in-memory store for scenes, entities and components. Besides
//! the primary tables it keeps the ownership graph in both directions:
//!
//! - entity to component, keyed by component kind (one slot per kind)
//! - scene to entity, plus the reverse entity to scene lookup
//! - scene to component, keyed by kind, mirroring the entities of the scene
//!
//! Mutation is crate private; game code goes through the [`Entity`], [`Scene`]
//! and [`ComponentHandle`](crate::ecs::ComponentHandle) facades, which take
//! care of change notifications and usage checks. The database itself trusts
//! its callers and only guards against missing keys.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::ecs::component::{Component, ComponentData, ComponentKind};
use crate::ecs::component_handle::ComponentId;
use crate::ecs::entity::Entity;
use crate::ecs::error::EcsError;
use crate::ecs::id_pool::{IdNamespace, IdPoolRegistry, Identifier, INVALID_ID};
use crate::ecs::scene::Scene;
use crate::ecs::state::{ComponentRecord, EntityState, SceneState};
use crate::persistence::BlobCodec;

type KindIndex = BTreeMap<ComponentKind, BTreeSet<ComponentId>>;

/// Registry of all scenes, entities and components
#[derive(Debug, Default)]
pub struct Database {
    pools: IdPoolRegistry,

    scenes: BTreeSet<Scene>,
    entities: BTreeSet<Entity>,
    components: BTreeMap<ComponentId, ComponentData>,

    entities_by_scene: HashMap<Scene, BTreeSet<Entity>>,
    components_by_scene: HashMap<Scene, KindIndex>,
    components_by_entity: HashMap<Entity, BTreeMap<ComponentKind, ComponentId>>,

    scene_of_entity: HashMap<Entity, Scene>,
    entity_of_component: HashMap<ComponentId, Entity>,
}

impl Database {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Creation and destruction
    // ------------------------------------------------------------------

    pub(crate) fn create_scene(&mut self) -> Result<Scene, EcsError> {
        let scenes = &self.scenes;
        let id = self
            .pools
            .get_or_create(IdNamespace::Scene)
            .next_available(|id| scenes.contains(&Scene::from_raw(id)));
        if id == INVALID_ID {
            return Err(EcsError::AllocatorExhausted(IdNamespace::Scene));
        }

        let scene = Scene::from_raw(id);
        self.insert_scene_record(scene);
        log::trace!("Created {scene}");
        Ok(scene)
    }

    pub(crate) fn create_entity(&mut self) -> Result<Entity, EcsError> {
        let entities = &self.entities;
        let id = self
            .pools
            .get_or_create(IdNamespace::Entity)
            .next_available(|id| entities.contains(&Entity::from_raw(id)));
        if id == INVALID_ID {
            return Err(EcsError::AllocatorExhausted(IdNamespace::Entity));
        }

        let entity = Entity::from_raw(id);
        self.insert_entity_record(entity);
        log::trace!("Created {entity}");
        Ok(entity)
    }

    pub(crate) fn register_component(&mut self, data: ComponentData) -> Result<ComponentId, EcsError> {
        let components = &self.components;
        let id = self
            .pools
            .get_or_create(IdNamespace::Component)
            .next_available(|id| components.contains_key(&ComponentId::from_raw(id)));
        if id == INVALID_ID {
            return Err(EcsError::AllocatorExhausted(IdNamespace::Component));
        }

        let component = ComponentId::from_raw(id);
        log::trace!("Registered {} {component}", data.kind());
        self.components.insert(component, data);
        Ok(component)
    }

    /// Destroys every entity of the scene, then the scene itself
    pub(crate) fn destroy_scene(&mut self, scene: Scene) {
        if !self.scenes.contains(&scene) {
            return;
        }

        let entities: Vec<Entity> = self.entities_in_scene(scene);
        for entity in entities {
            self.destroy_entity(entity);
        }

        self.entities_by_scene.remove(&scene);
        self.components_by_scene.remove(&scene);
        self.scenes.remove(&scene);
        log::trace!("Destroyed {scene}");
    }

    /// Unregisters every component of the entity, then removes the entity
    pub(crate) fn destroy_entity(&mut self, entity: Entity) {
        if !self.entities.contains(&entity) {
            return;
        }

        for (_, component) in self.components_of(entity) {
            self.unregister_component(component);
        }

        if let Some(scene) = self.scene_of_entity.get(&entity).copied() {
            self.remove_entity_from_scene(entity, scene);
        }

        self.components_by_entity.remove(&entity);
        self.entities.remove(&entity);
        log::trace!("Destroyed {entity}");
    }

    pub(crate) fn unregister_component(&mut self, component: ComponentId) {
        let Some(kind) = self.kind_of(component) else {
            return;
        };

        if let Some(entity) = self.entity_of_component.remove(&component) {
            self.unlink_component(component, kind, entity);
        }
        self.components.remove(&component);
        log::trace!("Unregistered {kind} {component}");
    }

    // ------------------------------------------------------------------
    // Ownership
    // ------------------------------------------------------------------

    /// Moves the entity and the scene index entries of all its components
    pub(crate) fn assign_entity_to_scene(&mut self, entity: Entity, scene: Scene) {
        if !self.entities.contains(&entity) || !self.scenes.contains(&scene) {
            log::warn!("Ignoring assignment of {entity} to {scene}: unknown id");
            return;
        }

        let previous = self.scene_of_entity.get(&entity).copied();
        if previous == Some(scene) {
            return;
        }
        if let Some(previous) = previous {
            self.remove_entity_from_scene(entity, previous);
        }

        self.entities_by_scene.entry(scene).or_default().insert(entity);
        self.scene_of_entity.insert(entity, scene);

        let owned = self.components_of(entity);
        let index = self.components_by_scene.entry(scene).or_default();
        for (kind, component) in owned {
            index.entry(kind).or_default().insert(component);
        }
    }

    /// Attaches the component to the entity's slot for its kind
    ///
    /// A component attached elsewhere is detached first. A different component
    /// already occupying the slot is detached and left floating.
    pub(crate) fn assign_component_to_entity(&mut self, component: ComponentId, entity: Entity) {
        let Some(kind) = self.kind_of(component) else {
            log::warn!("Ignoring assignment of unknown {component} to {entity}");
            return;
        };
        if !self.entities.contains(&entity) {
            log::warn!("Ignoring assignment of {component} to unknown {entity}");
            return;
        }

        let previous = self.entity_of_component.get(&component).copied();
        if previous == Some(entity) {
            return;
        }
        if let Some(previous) = previous {
            self.entity_of_component.remove(&component);
            self.unlink_component(component, kind, previous);
        }

        let occupant = self.component_of(entity, kind);
        if let Some(occupant) = occupant {
            log::warn!("{entity} already holds {kind} {occupant}; detaching it for {component}");
            self.entity_of_component.remove(&occupant);
            self.unlink_component(occupant, kind, entity);
        }

        self.components_by_entity.entry(entity).or_default().insert(kind, component);
        self.entity_of_component.insert(component, entity);
        if let Some(scene) = self.scene_of_entity.get(&entity).copied() {
            self.components_by_scene
                .entry(scene)
                .or_default()
                .entry(kind)
                .or_default()
                .insert(component);
        }
    }

    fn remove_entity_from_scene(&mut self, entity: Entity, scene: Scene) {
        if let Some(members) = self.entities_by_scene.get_mut(&scene) {
            members.remove(&entity);
        }
        self.scene_of_entity.remove(&entity);

        let owned = self.components_of(entity);
        if let Some(index) = self.components_by_scene.get_mut(&scene) {
            for (kind, component) in owned {
                remove_from_kind_index(index, kind, component);
            }
        }
    }

    /// Clears the entity slot and scene index entry of a component
    ///
    /// The component to entity link must already be removed by the caller.
    fn unlink_component(&mut self, component: ComponentId, kind: ComponentKind, entity: Entity) {
        if let Some(slots) = self.components_by_entity.get_mut(&entity) {
            if slots.get(&kind) == Some(&component) {
                slots.remove(&kind);
            }
        }

        if let Some(scene) = self.scene_of_entity.get(&entity) {
            if let Some(index) = self.components_by_scene.get_mut(scene) {
                remove_from_kind_index(index, kind, component);
            }
        }
    }

    fn insert_scene_record(&mut self, scene: Scene) {
        self.scenes.insert(scene);
        self.entities_by_scene.entry(scene).or_default();
        self.components_by_scene.entry(scene).or_default();
    }

    pub(crate) fn insert_entity_record(&mut self, entity: Entity) {
        self.entities.insert(entity);
        self.components_by_entity.entry(entity).or_default();
    }

    /// Insert or overwrite a component payload under a fixed id
    ///
    /// If the id is attached and the payload changes kind, it is detached first.
    pub(crate) fn insert_component_record(&mut self, component: ComponentId, data: ComponentData) {
        if let Some(kind) = self.kind_of(component) {
            if kind != data.kind() {
                if let Some(entity) = self.entity_of_component.remove(&component) {
                    self.unlink_component(component, kind, entity);
                }
            }
        }
        self.components.insert(component, data);
    }

    pub(crate) fn component_data_mut(&mut self, component: ComponentId) -> Option<&mut ComponentData> {
        self.components.get_mut(&component)
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    /// Scene handle for an id, if the scene exists
    pub fn scene(&self, id: Identifier) -> Option<Scene> {
        let scene = Scene::from_raw(id);
        self.scenes.contains(&scene).then_some(scene)
    }

    /// Entity handle for an id, if the entity exists
    pub fn entity(&self, id: Identifier) -> Option<Entity> {
        let entity = Entity::from_raw(id);
        self.entities.contains(&entity).then_some(entity)
    }

    /// Component id for a raw id, if the component is registered
    pub fn component_id(&self, id: Identifier) -> Option<ComponentId> {
        let component = ComponentId::from_raw(id);
        self.components.contains_key(&component).then_some(component)
    }

    /// Whether the scene exists
    pub fn contains_scene(&self, scene: Scene) -> bool {
        self.scenes.contains(&scene)
    }

    /// Whether the entity exists
    pub fn contains_entity(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    /// Whether the component is registered
    pub fn contains_component(&self, component: ComponentId) -> bool {
        self.components.contains_key(&component)
    }

    /// Type-erased payload of a component
    pub fn component_data(&self, component: ComponentId) -> Option<&ComponentData> {
        self.components.get(&component)
    }

    /// Typed view of a component; `None` if missing or of another type
    pub fn component<T: Component>(&self, component: ComponentId) -> Option<&T> {
        self.components.get(&component).and_then(T::from_data)
    }

    /// Kind of a registered component
    pub fn kind_of(&self, component: ComponentId) -> Option<ComponentKind> {
        self.components.get(&component).map(ComponentData::kind)
    }

    /// All scenes in id order
    pub fn scenes(&self) -> impl Iterator<Item = Scene> + '_ {
        self.scenes.iter().copied()
    }

    /// All entities in id order
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().copied()
    }

    /// Every registered component of a kind, attached or floating
    pub fn components_of_kind(&self, kind: ComponentKind) -> Vec<ComponentId> {
        self.components
            .iter()
            .filter(|(_, data)| data.kind() == kind)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Components of a kind owned by entities of the scene
    pub fn components_in_scene(&self, scene: Scene, kind: ComponentKind) -> Vec<ComponentId> {
        self.components_by_scene
            .get(&scene)
            .and_then(|index| index.get(&kind))
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Entities of the scene
    pub fn entities_in_scene(&self, scene: Scene) -> Vec<Entity> {
        self.entities_by_scene
            .get(&scene)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Entities holding a component of every listed kind
    pub fn entities_with(&self, kinds: &[ComponentKind]) -> Vec<Entity> {
        self.entities
            .iter()
            .copied()
            .filter(|entity| self.has_all(*entity, kinds))
            .collect()
    }

    /// Entities of the scene holding a component of every listed kind
    pub fn entities_in_scene_with(&self, scene: Scene, kinds: &[ComponentKind]) -> Vec<Entity> {
        self.entities_by_scene
            .get(&scene)
            .map(|members| {
                members
                    .iter()
                    .copied()
                    .filter(|entity| self.has_all(*entity, kinds))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the entity's kinds are a superset of `kinds`
    pub fn has_all(&self, entity: Entity, kinds: &[ComponentKind]) -> bool {
        self.components_by_entity
            .get(&entity)
            .is_some_and(|slots| kinds.iter().all(|kind| slots.contains_key(kind)))
    }

    /// Scene hosting the entity
    pub fn scene_of(&self, entity: Entity) -> Option<Scene> {
        self.scene_of_entity.get(&entity).copied()
    }

    /// Entity hosting the component
    pub fn entity_of(&self, component: ComponentId) -> Option<Entity> {
        self.entity_of_component.get(&component).copied()
    }

    /// The entity's component of a kind
    pub fn component_of(&self, entity: Entity, kind: ComponentKind) -> Option<ComponentId> {
        self.components_by_entity
            .get(&entity)
            .and_then(|slots| slots.get(&kind))
            .copied()
    }

    /// All components of the entity, ordered by kind
    pub fn components_of(&self, entity: Entity) -> Vec<(ComponentKind, ComponentId)> {
        self.components_by_entity
            .get(&entity)
            .map(|slots| slots.iter().map(|(kind, id)| (*kind, *id)).collect())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Counts
    // ------------------------------------------------------------------

    /// Number of scenes
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Number of entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of registered components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Number of entities in the scene
    pub fn entity_count_in_scene(&self, scene: Scene) -> usize {
        self.entities_by_scene.get(&scene).map_or(0, BTreeSet::len)
    }

    /// Number of components owned by entities of the scene
    pub fn component_count_in_scene(&self, scene: Scene) -> usize {
        self.components_by_scene
            .get(&scene)
            .map_or(0, |index| index.values().map(BTreeSet::len).sum())
    }

    /// Number of registered components of a kind, attached or floating
    pub fn component_count_of_kind(&self, kind: ComponentKind) -> usize {
        self.components.values().filter(|data| data.kind() == kind).count()
    }

    /// Number of components of a kind owned by entities of the scene
    pub fn component_count_of_kind_in_scene(&self, scene: Scene, kind: ComponentKind) -> usize {
        self.components_by_scene
            .get(&scene)
            .and_then(|index| index.get(&kind))
            .map_or(0, BTreeSet::len)
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Capture the components of an entity
    pub fn save_entity_state(&self, codec: &BlobCodec, entity: Entity) -> Result<EntityState, EcsError> {
        if !self.entities.contains(&entity) {
            return Err(EcsError::UnknownEntity(entity.id()));
        }

        let records: Vec<ComponentRecord> = self
            .components_of(entity)
            .into_iter()
            .filter_map(|(_, id)| {
                self.components.get(&id).map(|data| ComponentRecord {
                    id: id.id(),
                    data: data.clone(),
                })
            })
            .collect();

        Ok(EntityState::new(entity.id(), codec.encode(&records)?))
    }

    /// Capture every entity of a scene with its components
    pub fn save_scene_state(&self, codec: &BlobCodec, scene: Scene) -> Result<SceneState, EcsError> {
        if !self.scenes.contains(&scene) {
            return Err(EcsError::UnknownScene(scene.id()));
        }

        let states = self
            .entities_in_scene(scene)
            .into_iter()
            .map(|entity| self.save_entity_state(codec, entity))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SceneState::new(scene.id(), codec.encode(&states)?))
    }

    /// Overlay an entity snapshot
    ///
    /// Re-creates the entity if needed, writes every recorded component under
    /// its recorded id and attaches it. Components the entity gained after the
    /// snapshot are left alone. Returns the restored component ids.
    pub fn restore_entity_state(
        &mut self,
        codec: &BlobCodec,
        state: &EntityState,
    ) -> Result<Vec<ComponentId>, EcsError> {
        let records = Self::decode_entity_state(codec, state)?;
        Ok(self.apply_component_records(state.entity(), records))
    }

    /// Overlay a scene snapshot
    ///
    /// Re-creates the scene and its entities if needed and re-establishes
    /// membership and ownership. Entities that joined the scene after the
    /// snapshot are left alone. Returns the restored entities.
    pub fn restore_scene_state(&mut self, codec: &BlobCodec, state: &SceneState) -> Result<Vec<Entity>, EcsError> {
        let entity_states = Self::decode_scene_state(codec, state)?;
        let decoded = entity_states
            .iter()
            .map(|entity_state| Ok((entity_state.entity(), Self::decode_entity_state(codec, entity_state)?)))
            .collect::<Result<Vec<_>, EcsError>>()?;

        let scene = state.scene();
        self.insert_scene_record(scene);

        let mut restored = Vec::with_capacity(decoded.len());
        for (entity, records) in decoded {
            self.insert_entity_record(entity);
            self.assign_entity_to_scene(entity, scene);
            self.apply_component_records(entity, records);
            restored.push(entity);
        }
        Ok(restored)
    }

    pub(crate) fn decode_entity_state(
        codec: &BlobCodec,
        state: &EntityState,
    ) -> Result<Vec<ComponentRecord>, EcsError> {
        Ok(codec.decode(state.data())?)
    }

    pub(crate) fn decode_scene_state(codec: &BlobCodec, state: &SceneState) -> Result<Vec<EntityState>, EcsError> {
        Ok(codec.decode(state.data())?)
    }

    pub(crate) fn apply_component_records(&mut self, entity: Entity, records: Vec<ComponentRecord>) -> Vec<ComponentId> {
        self.insert_entity_record(entity);

        let mut restored = Vec::with_capacity(records.len());
        for record in records {
            let component = ComponentId::from_raw(record.id);
            self.insert_component_record(component, record.data);
            self.assign_component_to_entity(component, entity);
            restored.push(component);
        }
        restored
    }

    // ------------------------------------------------------------------
    // Consistency
    // ------------------------------------------------------------------

    /// Describe every broken ownership invariant; empty when consistent
    pub fn integrity_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for (entity, slots) in &self.components_by_entity {
            if !self.entities.contains(entity) {
                violations.push(format!("component slots kept for dead {entity}"));
            }
            for (kind, component) in slots {
                if self.kind_of(*component) != Some(*kind) {
                    violations.push(format!("{entity} slot {kind} holds {component} of another kind"));
                }
                if self.entity_of(*component) != Some(*entity) {
                    violations.push(format!("{component} in slot of {entity} points elsewhere"));
                }
            }
        }

        for (component, entity) in &self.entity_of_component {
            let slot = self
                .kind_of(*component)
                .and_then(|kind| self.component_of(*entity, kind));
            if slot != Some(*component) {
                violations.push(format!("{component} claims {entity} but is not in its slot"));
            }
        }

        for (scene, members) in &self.entities_by_scene {
            if !self.scenes.contains(scene) {
                violations.push(format!("entity index kept for dead {scene}"));
            }
            for entity in members {
                if self.scene_of(*entity) != Some(*scene) {
                    violations.push(format!("{entity} listed in {scene} but hosted elsewhere"));
                }
            }
        }

        for (entity, scene) in &self.scene_of_entity {
            let listed = self
                .entities_by_scene
                .get(scene)
                .is_some_and(|members| members.contains(entity));
            if !listed || !self.entities.contains(entity) {
                violations.push(format!("{entity} claims {scene} but is not listed"));
            }
        }

        for (scene, index) in &self.components_by_scene {
            for (kind, ids) in index {
                for component in ids {
                    let hosted = self.entity_of(*component).and_then(|entity| self.scene_of(entity));
                    if hosted != Some(*scene) || self.kind_of(*component) != Some(*kind) {
                        violations.push(format!("{component} indexed under {scene}/{kind} incorrectly"));
                    }
                }
            }
        }

        for (entity, scene) in &self.scene_of_entity {
            for (kind, component) in self.components_of(*entity) {
                let indexed = self
                    .components_by_scene
                    .get(scene)
                    .and_then(|index| index.get(&kind))
                    .is_some_and(|ids| ids.contains(&component));
                if !indexed {
                    violations.push(format!("{component} of {entity} missing from {scene} index"));
                }
            }
        }

        violations
    }
}

fn remove_from_kind_index(index: &mut KindIndex, kind: ComponentKind, component: ComponentId) {
    if let Some(ids) = index.get_mut(&kind) {
        ids.remove(&component);
        if ids.is_empty() {
            index.remove(&kind);
        }
    }
}
