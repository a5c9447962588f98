//! Scene Manager - named scenes, switching and snapshots

use std::collections::HashMap;
use std::fmt;

use crate::config::PersistenceConfig;
use crate::context::EngineContext;
use crate::ecs::{EcsError, Identifier, Scene, SceneState};
use crate::persistence::{read_file, write_file, PersistenceError};
use crate::resources::SharedResourceProvider;

/// Name under which the Global scene is managed
pub const GLOBAL_SCENE_NAME: &str = "Global";

/// Scene lifecycle errors
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// Another managed scene already uses this name
    #[error("A scene named '{0}' already exists")]
    DuplicateName(String),

    /// No managed scene has this name
    #[error("No scene named '{0}'")]
    UnknownName(String),

    /// The scene is not managed by this manager
    #[error("Scene {0} is not managed")]
    UnknownScene(Identifier),

    /// The Global scene is always loaded and cannot be switched to
    #[error("The global scene cannot be loaded as the current scene")]
    GlobalSceneNotLoadable,

    /// The operation needs an active scene
    #[error("No scene is loaded")]
    NoCurrentScene,

    /// The scene was never loaded, so there is nothing to restart from
    #[error("Scene {0} has no baseline")]
    NoBaseline(Identifier),

    /// Quick restore without a previous quick save
    #[error("Nothing was quick saved")]
    NoQuickSave,

    /// A save file belongs to another game layout
    #[error("Save file global scene {found} does not match global scene {expected}")]
    ForeignSave {
        /// Id of the live Global scene
        expected: Identifier,
        /// Id recorded in the save file
        found: Identifier,
    },

    /// Entity-component error
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// Save file error
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

struct ManagedScene {
    name: String,
    scene: Scene,
    provider: Option<SharedResourceProvider>,
}

impl fmt::Debug for ManagedScene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedScene")
            .field("name", &self.name)
            .field("scene", &self.scene)
            .field("has_provider", &self.provider.is_some())
            .finish()
    }
}

/// Global and active scene captured together
#[derive(Debug, Clone)]
struct SnapshotPair {
    global: SceneState,
    scene: SceneState,
}

impl SnapshotPair {
    fn capture(ctx: &EngineContext, scene: Scene) -> Result<Self, EcsError> {
        Ok(Self {
            global: ctx.global().save_state(ctx)?,
            scene: scene.save_state(ctx)?,
        })
    }

    /// Restore Global first, then the scene
    fn restore(&self, ctx: &mut EngineContext) -> Result<(), EcsError> {
        let global = ctx.global();
        global.restore_state(ctx, &self.global)?;
        self.scene.scene().restore_state(ctx, &self.scene)
    }
}

/// Owns scene names, resource providers and lifecycle snapshots
///
/// Managed scenes keep their creation order; the Global scene is always the
/// first one and is skipped by [`load_next`](Self::load_next) and
/// [`load_previous`](Self::load_previous).
#[derive(Debug)]
pub struct SceneManager {
    scenes: Vec<ManagedScene>,
    baselines: HashMap<Scene, SnapshotPair>,
    quick_save: Option<SnapshotPair>,
    initial_load: bool,
    persistence: PersistenceConfig,
}

impl SceneManager {
    /// Create a manager that knows only the Global scene of `ctx`
    pub fn new(ctx: &EngineContext, persistence: PersistenceConfig) -> Self {
        Self {
            scenes: vec![ManagedScene {
                name: GLOBAL_SCENE_NAME.to_string(),
                scene: ctx.global(),
                provider: None,
            }],
            baselines: HashMap::new(),
            quick_save: None,
            initial_load: true,
            persistence,
        }
    }

    /// Save file settings
    pub fn persistence(&self) -> &PersistenceConfig {
        &self.persistence
    }

    /// Set the resource provider handed out when Global is first loaded
    pub fn set_global_provider(&mut self, provider: Option<SharedResourceProvider>) {
        self.scenes[0].provider = provider;
    }

    /// Create and manage a new scene
    pub fn new_scene(
        &mut self,
        ctx: &mut EngineContext,
        name: impl Into<String>,
        provider: Option<SharedResourceProvider>,
    ) -> Result<Scene, SceneError> {
        let name = name.into();
        if self.scene_by_name(&name).is_some() {
            return Err(SceneError::DuplicateName(name));
        }

        let scene = Scene::create(ctx)?;
        log::debug!("Created {scene} as '{name}'");
        self.scenes.push(ManagedScene {
            name,
            scene,
            provider,
        });
        Ok(scene)
    }

    /// Managed scene with this name
    pub fn scene_by_name(&self, name: &str) -> Option<Scene> {
        self.scenes
            .iter()
            .find(|managed| managed.name == name)
            .map(|managed| managed.scene)
    }

    /// Name of a managed scene
    pub fn name_of(&self, scene: Scene) -> Option<&str> {
        self.managed(scene).map(|managed| managed.name.as_str())
    }

    /// Resource provider of a managed scene
    pub fn provider_of(&self, scene: Scene) -> Option<SharedResourceProvider> {
        self.managed(scene).and_then(|managed| managed.provider.clone())
    }

    /// Non-global scenes in creation order
    pub fn scenes(&self) -> impl Iterator<Item = (&str, Scene)> + '_ {
        self.scenes
            .iter()
            .skip(1)
            .map(|managed| (managed.name.as_str(), managed.scene))
    }

    /// Whether [`load_scene`](Self::load_scene) has ever captured a baseline for `scene`
    pub fn has_baseline(&self, scene: Scene) -> bool {
        self.baselines.contains_key(&scene)
    }

    /// Whether [`quick_restore`](Self::quick_restore) has something to restore
    pub fn has_quick_save(&self) -> bool {
        self.quick_save.is_some()
    }

    fn managed(&self, scene: Scene) -> Option<&ManagedScene> {
        self.scenes.iter().find(|managed| managed.scene == scene)
    }

    fn index_of(&self, scene: Scene) -> Option<usize> {
        self.scenes.iter().position(|managed| managed.scene == scene)
    }

    /// Make `target` the current scene
    ///
    /// The first call ever announces the Global scene to the domain systems.
    /// Loading the current scene again does nothing. Otherwise the systems
    /// hear about the switch while the old scene is still current, the old
    /// scene's provider is emptied and `target` becomes current. The first
    /// time a scene is loaded, Global and the scene are captured as its
    /// baseline; every later load restores both from that baseline.
    pub fn load_scene(&mut self, ctx: &mut EngineContext, target: Scene) -> Result<(), SceneError> {
        if target == ctx.global() {
            return Err(SceneError::GlobalSceneNotLoadable);
        }
        let provider = self
            .managed(target)
            .ok_or(SceneError::UnknownScene(target.id()))?
            .provider
            .clone();

        if self.initial_load {
            self.initial_load = false;
            let global = ctx.global();
            let global_provider = self.scenes[0].provider.clone();
            ctx.broadcast_scenes_will_switch(None, Some(global), global_provider.as_ref());
        }

        let old = ctx.current();
        if old == Some(target) {
            return Ok(());
        }

        log::info!(
            "Switching scene: {} -> {}",
            old.and_then(|scene| self.name_of(scene)).unwrap_or("<none>"),
            self.name_of(target).unwrap_or("<unnamed>"),
        );
        ctx.broadcast_scenes_will_switch(old, Some(target), provider.as_ref());
        if let Some(old) = old {
            self.unload_provider(old);
        }
        ctx.set_current(Some(target));

        match self.baselines.get(&target) {
            Some(baseline) => baseline.restore(ctx)?,
            None => {
                let baseline = SnapshotPair::capture(ctx, target)?;
                self.baselines.insert(target, baseline);
            }
        }
        Ok(())
    }

    /// Load a managed scene by name
    pub fn load_scene_by_name(&mut self, ctx: &mut EngineContext, name: &str) -> Result<(), SceneError> {
        let scene = self
            .scene_by_name(name)
            .ok_or_else(|| SceneError::UnknownName(name.to_string()))?;
        self.load_scene(ctx, scene)
    }

    /// Load the scene created after the current one, wrapping to the first
    pub fn load_next(&mut self, ctx: &mut EngineContext) -> Result<(), SceneError> {
        let (index, count) = self.current_position(ctx)?;
        let next = if index + 1 < count { index + 1 } else { 1 };
        let scene = self.scenes[next].scene;
        self.load_scene(ctx, scene)
    }

    /// Load the scene created before the current one, wrapping to the last
    pub fn load_previous(&mut self, ctx: &mut EngineContext) -> Result<(), SceneError> {
        let (index, count) = self.current_position(ctx)?;
        let previous = if index > 1 { index - 1 } else { count - 1 };
        let scene = self.scenes[previous].scene;
        self.load_scene(ctx, scene)
    }

    fn current_position(&self, ctx: &EngineContext) -> Result<(usize, usize), SceneError> {
        let current = ctx.current().ok_or(SceneError::NoCurrentScene)?;
        let index = self
            .index_of(current)
            .ok_or(SceneError::UnknownScene(current.id()))?;
        Ok((index, self.scenes.len()))
    }

    /// Put Global and the current scene back to their baseline
    pub fn restart_current_scene(&mut self, ctx: &mut EngineContext) -> Result<(), SceneError> {
        let current = ctx.current().ok_or(SceneError::NoCurrentScene)?;
        let baseline = self
            .baselines
            .get(&current)
            .ok_or(SceneError::NoBaseline(current.id()))?;

        log::info!("Restarting {current}");
        baseline.restore(ctx)?;
        Ok(())
    }

    /// Keep an in-memory snapshot of Global and the current scene
    pub fn quick_save(&mut self, ctx: &EngineContext) -> Result<(), SceneError> {
        let current = ctx.current().ok_or(SceneError::NoCurrentScene)?;
        self.quick_save = Some(SnapshotPair::capture(ctx, current)?);
        log::debug!("Quick saved {current}");
        Ok(())
    }

    /// Return to the last quick save, switching scenes if needed
    pub fn quick_restore(&mut self, ctx: &mut EngineContext) -> Result<(), SceneError> {
        let snapshot = self.quick_save.clone().ok_or(SceneError::NoQuickSave)?;
        let target = snapshot.scene.scene();

        self.switch_and_overlay(ctx, &snapshot)?;
        log::debug!("Quick restored {target}");
        Ok(())
    }

    /// Write the scene called `name` and Global to the save slot `name`
    ///
    /// Failures are logged and reported as `false`.
    pub fn disk_save(&self, ctx: &EngineContext, name: &str) -> bool {
        let Some(scene) = self.scene_by_name(name) else {
            log::error!("Disk save failed: no scene named '{name}'");
            return false;
        };
        self.report_disk_save(ctx, scene, name)
    }

    /// Write the current scene and Global to the slot named after the current scene
    pub fn disk_save_current(&self, ctx: &EngineContext) -> bool {
        let Some(current) = ctx.current() else {
            log::error!("Disk save failed: no scene is loaded");
            return false;
        };
        let Some(name) = self.name_of(current) else {
            log::error!("Disk save failed: {current} is not managed");
            return false;
        };
        self.report_disk_save(ctx, current, name)
    }

    fn report_disk_save(&self, ctx: &EngineContext, scene: Scene, slot: &str) -> bool {
        match self.write_slot(ctx, scene, slot) {
            Ok(()) => {
                log::info!("Saved {scene} to slot '{slot}'");
                true
            }
            Err(e) => {
                log::error!("Disk save of slot '{slot}' failed: {e}");
                false
            }
        }
    }

    fn write_slot(&self, ctx: &EngineContext, scene: Scene, slot: &str) -> Result<(), SceneError> {
        let codec = ctx.codec();

        let state = scene.save_state(ctx)?;
        write_file(&self.persistence.scene_file(slot), &codec.encode(&state)?)?;

        let global = ctx.global().save_state(ctx)?;
        write_file(&self.persistence.global_file(slot), &codec.encode(&global)?)?;
        Ok(())
    }

    /// Restore the save slot `name` and switch to its scene
    ///
    /// Both files are read and decoded before anything changes, so a missing
    /// or corrupt slot leaves the game untouched. Failures are logged and
    /// reported as `false`.
    pub fn disk_restore(&mut self, ctx: &mut EngineContext, name: &str) -> bool {
        match self.restore_slot(ctx, name) {
            Ok(scene) => {
                log::info!("Restored {scene} from slot '{name}'");
                true
            }
            Err(e) => {
                log::error!("Disk restore of slot '{name}' failed: {e}");
                false
            }
        }
    }

    fn restore_slot(&mut self, ctx: &mut EngineContext, slot: &str) -> Result<Scene, SceneError> {
        let codec = *ctx.codec();
        let global: SceneState = codec.decode(&read_file(&self.persistence.global_file(slot))?)?;
        let scene: SceneState = codec.decode(&read_file(&self.persistence.scene_file(slot))?)?;

        if global.scene() != ctx.global() {
            return Err(SceneError::ForeignSave {
                expected: ctx.global().id(),
                found: global.scene_id(),
            });
        }
        let target = scene.scene();
        if self.managed(target).is_none() {
            return Err(SceneError::UnknownScene(target.id()));
        }

        self.switch_and_overlay(ctx, &SnapshotPair { global, scene })?;
        Ok(target)
    }

    /// Switch to the snapshot's scene, then put the snapshot in place
    ///
    /// A switch that finds a baseline restores it first; the overlay wins.
    /// A switch that creates the baseline would capture pre-restore state,
    /// so the baseline is retaken from the restored world.
    fn switch_and_overlay(&mut self, ctx: &mut EngineContext, snapshot: &SnapshotPair) -> Result<(), SceneError> {
        let target = snapshot.scene.scene();
        let first_visit = !self.baselines.contains_key(&target);

        self.load_scene(ctx, target)?;
        snapshot.restore(ctx)?;

        if first_visit {
            self.baselines.insert(target, SnapshotPair::capture(ctx, target)?);
        }
        Ok(())
    }

    fn unload_provider(&self, scene: Scene) {
        let Some(provider) = self.provider_of(scene) else {
            return;
        };
        match provider.try_borrow_mut() {
            Ok(mut provider) => provider.unload_all(),
            Err(_) => log::warn!("Resource provider of {scene} is busy; leftovers stay loaded"),
        };
    }

    /// Switch away from the current scene and empty every resource provider
    pub fn dispose(&mut self, ctx: &mut EngineContext) {
        if let Some(current) = ctx.current() {
            ctx.broadcast_scenes_will_switch(Some(current), None, None);
            ctx.set_current(None);
        }
        for managed in &self.scenes {
            self.unload_provider(managed.scene);
        }
        log::debug!("Scene manager disposed");
    }
}
