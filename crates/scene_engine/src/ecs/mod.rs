//! Entity-component database
//!
//! Scenes own entities, entities own at most one component per type, and the
//! [`Database`] indexes all of them. Handles ([`Scene`], [`Entity`],
//! [`ComponentHandle`]) are plain ids; every operation goes through the
//! [`EngineContext`](crate::context::EngineContext) so mutations publish their
//! notifications.

pub mod component;
pub mod component_handle;
pub mod components;
pub mod database;
pub mod entity;
pub mod error;
pub mod id_pool;
pub mod scene;
pub mod state;
pub mod system;

pub use component::{Component, ComponentData, ComponentKind, PropertyChange, PropertyValue};
pub use component_handle::{ComponentHandle, ComponentId};
pub use database::Database;
pub use entity::Entity;
pub use error::EcsError;
pub use id_pool::{IdNamespace, IdPool, IdPoolRegistry, Identifier, INVALID_ID, START_ID};
pub use scene::Scene;
pub use state::{EntityState, SceneState};
pub use system::{DomainSystem, SharedSystem, SystemError};
