//! Built-in component types
//!
//! Components are plain data. Property setters perform the dirty-check and
//! return a [`PropertyChange`](crate::ecs::PropertyChange) when the stored value
//! actually changed; publishing that change is the job of
//! [`ComponentHandle::update`](crate::ecs::ComponentHandle::update).

pub mod audio;
pub mod collider;
pub mod entity_info;
pub mod movement;
pub mod transform;

pub use audio::{AudioListener, AudioSource, PlayState};
pub use collider::Collider;
pub use entity_info::EntityInfo;
pub use movement::Movement;
pub use transform::Transform;
