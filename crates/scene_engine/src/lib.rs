//! # Scene Engine
//!
//! The core of a component-based game engine: an entity-component database
//! partitioned into scenes, change notifications scoped to the visible
//! scenes, and a scene lifecycle with restart, quick save and disk save.
//!
//! ## Features
//!
//! - **Entity-Component Database**: scenes own entities, entities own at most one component per type
//! - **Change Notifications**: per component type, per entity and per scene channels
//! - **Visibility Filter**: only the Global and the Current scene wake domain systems
//! - **Scene Lifecycle**: baselines for restart, in-memory quick saves, save slots on disk
//! - **Domain Systems**: rendering, physics, audio and input plug in through one trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//! use std::time::Duration;
//!
//! struct MyGame;
//!
//! impl Application for MyGame {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let level = engine.new_scene("level", None)?;
//!         let ctx = engine.context_mut();
//!         let ship = Entity::create(ctx)?;
//!         ship.add_new(ctx, Transform::new())?;
//!         ship.assign_to_scene(ctx, level)?;
//!         engine.load_scene(level)?;
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, engine: &mut Engine, _elapsed: Duration) -> Result<(), AppError> {
//!         engine.quit();
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     Engine::run(EngineConfig::default(), &mut MyGame)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod context;
pub mod ecs;
pub mod events;
pub mod foundation;
pub mod persistence;
pub mod resources;
pub mod scene;

mod application;
mod engine;

pub use application::{AppError, Application};
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, EngineConfig, LoggingConfig, PersistenceConfig},
        context::EngineContext,
        ecs::{
            components::{AudioListener, AudioSource, Collider, EntityInfo, Movement, PlayState, Transform},
            Component, ComponentHandle, ComponentId, ComponentKind, Database, DomainSystem, EcsError, Entity,
            PropertyChange, PropertyValue, Scene, SharedSystem, SystemError,
        },
        events::{ComponentChanged, EntityChanged, EntityEventKind, SceneChanged, SceneEventKind},
        foundation::{
            math::{Quat, Vec3},
            time::{FrameClock, Stopwatch},
        },
        persistence::{BlobCodec, CodecKind},
        resources::{ResourceError, ResourceProvider, SharedResourceProvider},
        scene::{SceneError, SceneManager},
        AppError, Application, Engine, EngineError,
    };
}
