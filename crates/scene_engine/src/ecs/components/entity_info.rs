//! Descriptive metadata attached to an entity

use serde::{Deserialize, Serialize};

/// Name and free-form tag of an entity
///
/// Purely informational; no domain system listens to it, so its fields are
/// public and writing them publishes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityInfo {
    /// Display name
    pub name: String,
    /// Game specific tag
    pub data: Option<String>,
}

impl EntityInfo {
    /// Info with a name and no tag
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: None,
        }
    }

    /// Builder: attach a tag
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }
}
