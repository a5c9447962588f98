//! Errors raised by the entity-component layer

use crate::ecs::component::ComponentKind;
use crate::ecs::id_pool::{IdNamespace, Identifier};
use crate::persistence::PersistenceError;

/// Entity-component usage and snapshot errors
///
/// Lookups never fail with these; they return `None` instead.
#[derive(thiserror::Error, Debug)]
pub enum EcsError {
    /// An entity already holds a different component of this type
    #[error("Entity {entity} already has a {kind} component")]
    DuplicateComponentType {
        /// Entity the component was added to
        entity: Identifier,
        /// Type of the rejected component
        kind: ComponentKind,
    },

    /// No free id is left in a namespace
    #[error("No free {0} id left")]
    AllocatorExhausted(IdNamespace),

    /// Scene id does not resolve
    #[error("Unknown scene {0}")]
    UnknownScene(Identifier),

    /// Entity id does not resolve
    #[error("Unknown entity {0}")]
    UnknownEntity(Identifier),

    /// Component id does not resolve, or resolves to another type
    #[error("Unknown component {0}")]
    UnknownComponent(Identifier),

    /// The Global scene cannot be destroyed
    #[error("The global scene cannot be destroyed")]
    GlobalSceneProtected,

    /// A snapshot was applied to a different object than it was taken from
    #[error("Snapshot of {namespace} {found} cannot be restored into {namespace} {expected}")]
    SnapshotMismatch {
        /// Namespace of the object
        namespace: IdNamespace,
        /// Id of the receiving object
        expected: Identifier,
        /// Id recorded in the snapshot
        found: Identifier,
    },

    /// Encoding or decoding a snapshot failed
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] PersistenceError),
}
