//! Process-wide default registry.
//!
//! Convenience for callers that want one shared set of groups. Code that can
//! pass a [`Registry`] explicitly should do so instead.

use std::sync::Arc;

use crate::error::Result;
use crate::registry::Registry;
use crate::ring::Ring;

lazy_static::lazy_static! {
    static ref DEFAULT_REGISTRY: Arc<Registry> = Arc::new(Registry::new());
}

/// Handle to the default registry.
pub fn registry() -> Arc<Registry> {
    Arc::clone(&DEFAULT_REGISTRY)
}

/// Create a group in the default registry.
pub fn create_group(name: &str, replicas: usize) -> Result<Arc<Ring>> {
    DEFAULT_REGISTRY.create_group(name, replicas)
}

/// Get a group from the default registry.
pub fn get_group(name: &str) -> Result<Arc<Ring>> {
    DEFAULT_REGISTRY.get_group(name)
}

/// Remove a group from the default registry.
pub fn remove_group(name: &str) -> Result<Arc<Ring>> {
    DEFAULT_REGISTRY.remove_group(name)
}

/// Serialize the default registry.
pub fn serialize() -> Result<Vec<u8>> {
    DEFAULT_REGISTRY.serialize()
}

/// Restore groups into the default registry.
pub fn restore(data: &[u8]) -> Result<()> {
    DEFAULT_REGISTRY.restore(data)
}
