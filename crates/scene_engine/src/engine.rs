//! Core engine implementation

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use thiserror::Error;

use crate::application::Application;
use crate::config::EngineConfig;
use crate::context::EngineContext;
use crate::ecs::{DomainSystem, EcsError, Scene, SharedSystem, SystemError};
use crate::foundation::logging;
use crate::foundation::time::{FrameClock, Stopwatch};
use crate::persistence::BlobCodec;
use crate::resources::SharedResourceProvider;
use crate::scene::{SceneError, SceneManager};

/// A domain system together with its update profile
struct SystemSlot {
    system: SharedSystem,
    profile: Stopwatch,
}

impl SystemSlot {
    fn name(&self) -> String {
        self.system
            .try_borrow()
            .map_or_else(|_| "<busy>".to_string(), |system| system.name().to_string())
    }
}

/// Main engine struct
///
/// Owns the game state, the scene manager and the domain systems, and drives
/// them frame by frame.
pub struct Engine {
    context: EngineContext,
    scenes: SceneManager,
    systems: Vec<SystemSlot>,
    config: EngineConfig,
    clock: FrameClock,
    running: bool,
    initialized: bool,
    disposed: bool,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        log::info!("Initializing engine...");

        let context = EngineContext::new(BlobCodec::new(config.persistence.codec))
            .map_err(|e| EngineError::InitializationFailed(format!("Engine context: {e}")))?;
        let scenes = SceneManager::new(&context, config.persistence.clone());

        Ok(Self {
            context,
            scenes,
            systems: Vec::new(),
            config,
            clock: FrameClock::new(),
            running: true,
            initialized: false,
            disposed: false,
        })
    }

    /// Run the engine main loop with the given application
    ///
    /// The loop ends once [`quit`](Self::quit) is called.
    pub fn run<T: Application>(config: EngineConfig, app: &mut T) -> Result<(), EngineError> {
        logging::init_with_filter(&config.logging.filter);
        let mut engine = Self::new(config)?;

        app.initialize(&mut engine)
            .map_err(|e| EngineError::ApplicationError(format!("App initialization: {e}")))?;
        engine.initialize()?;

        log::info!("Starting main loop...");

        while engine.running {
            let elapsed = engine.clock.tick();

            app.update(&mut engine, elapsed)
                .map_err(|e| EngineError::ApplicationError(format!("App update: {e}")))?;

            engine.update(elapsed)?;
        }

        app.cleanup(&mut engine);
        engine.dispose();

        log::info!("Engine shutdown complete");
        Ok(())
    }

    /// Register a domain system
    ///
    /// The system starts receiving scene and entity notifications right
    /// away. If the engine is already initialized, so is the system.
    pub fn add_system<S: DomainSystem + 'static>(&mut self, system: S) -> Result<Rc<RefCell<S>>, EngineError> {
        let system = Rc::new(RefCell::new(system));
        let shared: SharedSystem = system.clone();

        if self.initialized {
            Self::initialize_system(&mut self.context, &shared)?;
        }
        log::debug!("Added system '{}'", system.borrow().name());

        self.context.bus_mut().attach_system(Rc::clone(&shared));
        self.systems.push(SystemSlot {
            system: shared,
            profile: Stopwatch::new(),
        });
        Ok(system)
    }

    fn initialize_system(context: &mut EngineContext, system: &SharedSystem) -> Result<(), EngineError> {
        let mut system = system
            .try_borrow_mut()
            .map_err(|_| EngineError::InitializationFailed("System is busy".to_string()))?;
        system.initialize(context).map_err(|source| EngineError::System {
            system: system.name().to_string(),
            source,
        })
    }

    /// Initialize every system and make sure a scene is available
    ///
    /// When no scene is managed yet and the configuration asks for it, a
    /// default scene is created and loaded. Calling this twice does nothing.
    pub fn initialize(&mut self) -> Result<(), EngineError> {
        if self.initialized {
            return Ok(());
        }

        for slot in &self.systems {
            Self::initialize_system(&mut self.context, &slot.system)?;
        }

        if self.config.create_default_scene && self.scenes.scenes().next().is_none() {
            let name = self.config.default_scene_name.clone();
            let scene = self.scenes.new_scene(&mut self.context, name, None)?;
            self.scenes.load_scene(&mut self.context, scene)?;
        }

        self.initialized = true;
        log::info!("Engine initialized with {} systems", self.systems.len());
        Ok(())
    }

    /// Update every domain system once
    ///
    /// A system that is already borrowed (because it is the caller) is
    /// skipped for this frame. Notifications a system caused during its own
    /// update are delivered to it right after the update returns.
    pub fn update(&mut self, elapsed: Duration) -> Result<(), EngineError> {
        for slot in &mut self.systems {
            let result = {
                let Ok(mut system) = slot.system.try_borrow_mut() else {
                    log::warn!("Skipping busy system this frame");
                    continue;
                };

                slot.profile.start();
                let result = system.update(&mut self.context, elapsed);
                slot.profile.stop();
                result.map_err(|source| EngineError::System {
                    system: system.name().to_string(),
                    source,
                })
            };

            self.context.deliver_deferred();
            result?;
        }
        Ok(())
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Whether the main loop keeps going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Average update time per system, in registration order
    pub fn system_timings(&self) -> Vec<(String, Duration)> {
        self.systems
            .iter()
            .map(|slot| (slot.name(), slot.profile.average_lap()))
            .collect()
    }

    /// Get the engine context
    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    /// Get mutable access to the engine context
    pub fn context_mut(&mut self) -> &mut EngineContext {
        &mut self.context
    }

    /// Get the scene manager
    pub fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    /// Scene manager and context together, for calls that need both
    pub fn scenes_mut(&mut self) -> (&mut SceneManager, &mut EngineContext) {
        (&mut self.scenes, &mut self.context)
    }

    /// Get the engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Frame timing
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Create and manage a new scene
    pub fn new_scene(
        &mut self,
        name: impl Into<String>,
        provider: Option<SharedResourceProvider>,
    ) -> Result<Scene, SceneError> {
        self.scenes.new_scene(&mut self.context, name, provider)
    }

    /// Make `scene` the current scene
    pub fn load_scene(&mut self, scene: Scene) -> Result<(), SceneError> {
        self.scenes.load_scene(&mut self.context, scene)
    }

    /// Load a managed scene by name
    pub fn load_scene_by_name(&mut self, name: &str) -> Result<(), SceneError> {
        self.scenes.load_scene_by_name(&mut self.context, name)
    }

    /// Load the next managed scene
    pub fn load_next(&mut self) -> Result<(), SceneError> {
        self.scenes.load_next(&mut self.context)
    }

    /// Load the previous managed scene
    pub fn load_previous(&mut self) -> Result<(), SceneError> {
        self.scenes.load_previous(&mut self.context)
    }

    /// Put Global and the current scene back to their baseline
    pub fn restart_current_scene(&mut self) -> Result<(), SceneError> {
        self.scenes.restart_current_scene(&mut self.context)
    }

    /// Keep an in-memory snapshot of Global and the current scene
    pub fn quick_save(&mut self) -> Result<(), SceneError> {
        self.scenes.quick_save(&self.context)
    }

    /// Return to the last quick save
    pub fn quick_restore(&mut self) -> Result<(), SceneError> {
        self.scenes.quick_restore(&mut self.context)
    }

    /// Save the current scene and Global to disk
    pub fn disk_save(&self) -> bool {
        self.scenes.disk_save_current(&self.context)
    }

    /// Restore a save slot from disk
    pub fn disk_restore(&mut self, name: &str) -> bool {
        self.scenes.disk_restore(&mut self.context, name)
    }

    /// Unload the current scene and dispose every system
    ///
    /// Runs automatically on drop; calling it again does nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        self.scenes.dispose(&mut self.context);
        for slot in &self.systems {
            match slot.system.try_borrow_mut() {
                Ok(mut system) => system.dispose(),
                Err(_) => log::warn!("Could not dispose a busy system"),
            }
        }
        self.context.bus_mut().detach_systems();
        self.systems.clear();
        log::debug!("Engine disposed");
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// A domain system reported an error
    #[error("System '{system}' failed: {source}")]
    System {
        /// Name of the failing system
        system: String,
        /// What went wrong
        #[source]
        source: SystemError,
    },

    /// Scene lifecycle error
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Entity-component error
    #[error("ECS error: {0}")]
    Ecs(#[from] EcsError),

    /// Application error
    #[error("Application error: {0}")]
    ApplicationError(String),
}
