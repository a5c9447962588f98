//! Resource provider boundary
//!
//! Every managed scene may own a resource provider. When a scene becomes
//! active its provider is handed to the domain systems, which load assets
//! through it by name. The core never looks at asset names or asset types.

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to a resource provider
pub type SharedResourceProvider = Rc<RefCell<dyn ResourceProvider>>;

/// Errors raised while loading assets
#[derive(thiserror::Error, Debug)]
pub enum ResourceError {
    /// No asset with this name
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// The asset exists but has another type
    #[error("Asset '{asset}' is not a {expected}")]
    TypeMismatch {
        /// Asset name
        asset: String,
        /// Requested type
        expected: &'static str,
    },

    /// The provider failed to load the asset
    #[error("Failed to load '{asset}': {message}")]
    Load {
        /// Asset name
        asset: String,
        /// Provider specific reason
        message: String,
    },
}

/// Loads assets by name on behalf of domain systems
pub trait ResourceProvider {
    /// Load (or fetch a cached) asset of any type
    fn load_any(&mut self, asset_name: &str) -> Result<Rc<dyn Any>, ResourceError>;

    /// Drop everything loaded so far
    fn unload_all(&mut self);
}

impl dyn ResourceProvider {
    /// Load an asset and downcast it to `T`
    pub fn load<T: Any>(&mut self, asset_name: &str) -> Result<Rc<T>, ResourceError> {
        self.load_any(asset_name)?
            .downcast::<T>()
            .map_err(|_| ResourceError::TypeMismatch {
                asset: asset_name.to_string(),
                expected: type_name::<T>(),
            })
    }
}
