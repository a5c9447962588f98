//! Scene lifecycle
//!
//! The [`SceneManager`] names scenes, tracks which one is active and keeps
//! the snapshots behind restart, quick save and disk save:
//!
//! ```text
//! no scene loaded --load--> Global + scene X --load--> Global + scene Y
//!                                 ^                          |
//!                                 +-------- load X ----------+
//! ```
//!
//! Every switch is announced to the domain systems before any state changes.

mod scene_manager;

pub use scene_manager::{SceneError, SceneManager, GLOBAL_SCENE_NAME};
