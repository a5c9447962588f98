//! Application trait and lifecycle management

use std::time::Duration;

use thiserror::Error;

use crate::ecs::EcsError;
use crate::engine::{Engine, EngineError};
use crate::scene::SceneError;

/// Application lifecycle trait
///
/// Implement this trait to drive a game with [`Engine::run`].
pub trait Application {
    /// Initialize the application
    ///
    /// Called once after the engine and its systems are initialized. Create
    /// scenes, spawn entities and load the first scene here.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Update the application
    ///
    /// Called every frame before the domain systems run.
    ///
    /// # Arguments
    /// * `engine` - Mutable reference to the engine
    /// * `elapsed` - Time since the last frame
    fn update(&mut self, engine: &mut Engine, elapsed: Duration) -> Result<(), AppError>;

    /// Cleanup the application
    ///
    /// Called once when the main loop ends, before the engine is disposed.
    fn cleanup(&mut self, _engine: &mut Engine) {}
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Scene lifecycle error
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Entity-component error
    #[error("ECS error: {0}")]
    Ecs(#[from] EcsError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
