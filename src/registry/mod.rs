//! Group registry: named, independent rings.
//!
//! The registry lock only guards the name -> ring map. Rings carry their own
//! lock, so a ring handed out by [`Registry::get_group`] stays usable after
//! the group is removed and is freed once the last handle drops.

pub mod snapshot;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::error::{validate_replicas, Error, Result};
use crate::ring::{Entry, Ring};

pub use snapshot::{EntryRecord, RegistrySnapshot, RingSnapshot};

/// Registry of rings by group name.
#[derive(Debug, Default)]
pub struct Registry {
    groups: RwLock<HashMap<String, Arc<Ring>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group whose ring places each entry `replicas` times.
    ///
    /// `replicas` must be within `1..=MAX_REPLICAS`.
    pub fn create_group(&self, name: &str, replicas: usize) -> Result<Arc<Ring>> {
        let replicas = validate_replicas(replicas)?;
        let mut groups = self.groups.write();
        if groups.contains_key(name) {
            return Err(Error::GroupExists);
        }

        let ring = Arc::new(Ring::new(name, replicas));
        groups.insert(name.to_string(), Arc::clone(&ring));
        info!(group = name, replicas, "Created group");
        Ok(ring)
    }

    /// Get the ring of a group.
    pub fn get_group(&self, name: &str) -> Result<Arc<Ring>> {
        self.groups
            .read()
            .get(name)
            .cloned()
            .ok_or(Error::GroupNotFound)
    }

    /// Remove a group, returning its ring.
    pub fn remove_group(&self, name: &str) -> Result<Arc<Ring>> {
        let ring = self.groups.write().remove(name).ok_or(Error::GroupNotFound)?;
        info!(group = name, "Removed group");
        Ok(ring)
    }

    /// Remove every group.
    pub fn clear(&self) {
        let mut groups = self.groups.write();
        let count = groups.len();
        groups.clear();
        info!(count, "Removed all groups");
    }

    /// Names of all groups, sorted.
    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    /// Whether no groups are registered.
    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }

    /// Insert a new entry into a group.
    pub fn insert(&self, group: &str, key: &str, payload: impl Into<Vec<u8>>) -> Result<()> {
        self.get_group(group)?.insert(key, payload)
    }

    /// Insert or replace an entry in a group. Returns whether it replaced one.
    pub fn upsert(&self, group: &str, key: &str, payload: impl Into<Vec<u8>>) -> Result<bool> {
        Ok(self.get_group(group)?.upsert(key, payload))
    }

    /// Delete an entry from a group. Absent keys are a no-op.
    pub fn delete(&self, group: &str, key: &str) -> Result<bool> {
        Ok(self.get_group(group)?.delete(key))
    }

    /// Find the entry of `group` responsible for `key`.
    pub fn match_key(&self, group: &str, key: &str) -> Result<Arc<Entry>> {
        self.get_group(group)?.match_key(key)
    }

    /// Capture the entries of every group.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.groups
            .read()
            .iter()
            .map(|(name, ring)| (name.clone(), RingSnapshot::capture(ring)))
            .collect()
    }

    /// Serialize every group to JSON.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        snapshot::encode(&self.snapshot())
    }

    /// Restore groups from JSON produced by [`Registry::serialize`].
    ///
    /// The whole document is decoded before the registry is touched. Groups
    /// in the document replace same-named groups; other groups are kept.
    pub fn restore(&self, data: &[u8]) -> Result<()> {
        let snapshot = snapshot::decode(data)?;
        self.restore_snapshot(snapshot);
        Ok(())
    }

    /// Install rings rebuilt from an already-decoded snapshot.
    pub fn restore_snapshot(&self, snapshot: RegistrySnapshot) {
        let rings: Vec<(String, Arc<Ring>)> = snapshot
            .into_iter()
            .map(|(name, ring)| {
                let ring = Arc::new(ring.into_ring(&name));
                (name, ring)
            })
            .collect();

        let count = rings.len();
        let mut groups = self.groups.write();
        for (name, ring) in rings {
            groups.insert(name, ring);
        }
        info!(count, "Restored groups");
    }
}
