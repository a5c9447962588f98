//! Domain system contract
//!
//! Rendering, physics, audio and input live outside the core. They plug in by
//! implementing [`DomainSystem`]; the engine drives `update`, the scene
//! manager announces scene switches, and the notification bus forwards
//! entity and scene changes of visible scenes.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::context::EngineContext;
use crate::ecs::{Database, EcsError, Scene};
use crate::events::{EntityChanged, SceneChanged, SceneEventKind};
use crate::resources::SharedResourceProvider;

/// Shared handle to a domain system
pub type SharedSystem = Rc<RefCell<dyn DomainSystem>>;

/// Errors a domain system reports to the engine
#[derive(thiserror::Error, Debug)]
pub enum SystemError {
    /// Database usage error raised inside the system
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// System specific failure
    #[error("{0}")]
    Failed(String),
}

/// A subsystem consuming component data
pub trait DomainSystem {
    /// Name used in logs and timings
    fn name(&self) -> &str;

    /// Called once before the first update
    ///
    /// A good place to subscribe to component channels.
    fn initialize(&mut self, _ctx: &mut EngineContext) -> Result<(), SystemError> {
        Ok(())
    }

    /// Advance the system by one frame
    fn update(&mut self, ctx: &mut EngineContext, elapsed: Duration) -> Result<(), SystemError>;

    /// The active scene is about to change from `old` to `new`
    ///
    /// The default replays `EntityRemoved` for every entity of `old`, hands the
    /// provider to [`accept_resource_provider`](Self::accept_resource_provider),
    /// replays `EntityAdded` for every entity of `new`, and finally calls
    /// [`clean_up_after_scene_switch`](Self::clean_up_after_scene_switch).
    fn on_scenes_will_switch(
        &mut self,
        db: &Database,
        old: Option<Scene>,
        new: Option<Scene>,
        provider: Option<SharedResourceProvider>,
    ) {
        if let Some(old) = old {
            for entity in db.entities_in_scene(old) {
                self.on_scene_changed(
                    db,
                    &SceneChanged {
                        scene: old,
                        kind: SceneEventKind::EntityRemoved,
                        entity,
                    },
                );
            }
        }

        self.accept_resource_provider(provider);

        if let Some(new) = new {
            for entity in db.entities_in_scene(new) {
                self.on_scene_changed(
                    db,
                    &SceneChanged {
                        scene: new,
                        kind: SceneEventKind::EntityAdded,
                        entity,
                    },
                );
            }
        }

        self.clean_up_after_scene_switch();
    }

    /// Receive the resource provider of the scene being switched to
    fn accept_resource_provider(&mut self, _provider: Option<SharedResourceProvider>) {}

    /// Called at the end of the default scene switch handling
    fn clean_up_after_scene_switch(&mut self) {}

    /// An entity joined or is about to leave a visible scene
    fn on_scene_changed(&mut self, _db: &Database, _event: &SceneChanged) {}

    /// A component was added to, removed from or restored on a visible entity
    fn on_entity_changed(&mut self, _db: &Database, _event: &EntityChanged) {}

    /// Release everything; called once at shutdown
    fn dispose(&mut self) {}
}
