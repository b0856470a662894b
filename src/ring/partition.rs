//! Partition ring: entries expanded into virtual positions on a CRC-32 ring.
//!
//! Each entry is placed on the ring `replicas` times, at the hashes of its
//! virtual keys. A query key is hashed once and owned by the entry of the
//! greatest position at or below its hash, wrapping to the highest position.
//!
//! ## Time Complexity
//! - Match: O(log n) where n = entries * replicas
//! - Insert: O(n log n) for the single re-sort after the replica batch
//! - Delete: O(replicas * n) for the order-preserving removals

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, warn};

use super::hash::{hash_key, replica_hashes};
use super::index::RingIndex;
use crate::error::{Error, Result};

/// A named member of a ring, e.g. a server address plus opaque metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Unique key within the ring
    pub key: String,
    /// Opaque payload returned on match
    pub payload: Vec<u8>,
}

impl Entry {
    /// Create a new entry.
    pub fn new(key: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            payload: payload.into(),
        }
    }
}

/// The three co-mutated structures, guarded together by the ring lock.
#[derive(Debug, Default)]
struct RingState {
    /// Registered entries by key
    entries: HashMap<String, Arc<Entry>>,
    /// Sorted virtual positions
    index: RingIndex,
    /// Position -> owning entry
    rows: HashMap<u32, Arc<Entry>>,
}

impl RingState {
    /// Place every replica of `entry` on the ring, sorting once at the end.
    fn hash_entry(&mut self, entry: &Arc<Entry>, replicas: usize) {
        let mut hashes = Vec::with_capacity(replicas);
        for hash in replica_hashes(&entry.key, replicas) {
            if let Some(previous) = self.rows.insert(hash, Arc::clone(entry)) {
                if previous.key != entry.key {
                    warn!(
                        hash,
                        key = %entry.key,
                        displaced = %previous.key,
                        "Virtual position collision, latest entry owns it"
                    );
                }
            }
            hashes.push(hash);
        }
        self.index.extend_sorted(hashes);
    }

    /// Remove `key` and all of its positions. No-op when the key is absent.
    fn delete(&mut self, key: &str, replicas: usize) -> bool {
        if self.entries.remove(key).is_none() {
            return false;
        }

        for hash in replica_hashes(key, replicas) {
            self.index.remove_value(hash);

            if !self.index.contains(hash) {
                self.rows.remove(&hash);
                continue;
            }

            // Another virtual key still sits on this position.
            let owned_by_deleted = self.rows.get(&hash).map_or(false, |e| e.key == key);
            if owned_by_deleted {
                let survivor = self
                    .entries
                    .values()
                    .find(|e| replica_hashes(&e.key, replicas).any(|h| h == hash))
                    .cloned();
                if let Some(survivor) = survivor {
                    warn!(hash, key, owner = %survivor.key, "Reassigned collided position");
                    self.rows.insert(hash, survivor);
                }
            }
        }
        true
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.rows.clear();
    }
}

/// Consistent-hashing ring for one group of entries.
///
/// All mutations hold the write lock for their whole read-modify-write
/// sequence; matches hold the read lock. The replica count is fixed at
/// construction.
#[derive(Debug)]
pub struct Ring {
    name: String,
    replicas: usize,
    state: RwLock<RingState>,
}

impl Ring {
    /// Create an empty ring placing each entry `replicas` times.
    ///
    /// `replicas` is clamped to `1..=MAX_REPLICAS`; use
    /// [`Registry::create_group`](crate::Registry::create_group) to reject
    /// out-of-range counts instead.
    pub fn new(name: impl Into<String>, replicas: usize) -> Self {
        Self {
            name: name.into(),
            replicas: replicas.clamp(1, crate::MAX_REPLICAS),
            state: RwLock::new(RingState::default()),
        }
    }

    /// Build a ring from already-unique entries, e.g. a restored snapshot.
    pub fn from_entries<I>(name: impl Into<String>, replicas: usize, entries: I) -> Self
    where
        I: IntoIterator<Item = Entry>,
    {
        let ring = Self::new(name, replicas);
        ring.reconstruct(entries);
        ring
    }

    /// Group name of this ring.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Virtual positions per entry.
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// Hash used for both virtual keys and query keys.
    pub fn hash_of(&self, key: &str) -> u32 {
        hash_key(key)
    }

    /// Register a new entry. Fails with [`Error::KeyExists`] before touching
    /// any state when the key is already present.
    pub fn insert(&self, key: impl Into<String>, payload: impl Into<Vec<u8>>) -> Result<()> {
        let entry = Arc::new(Entry::new(key, payload));
        let mut state = self.state.write();

        if state.entries.contains_key(&entry.key) {
            return Err(Error::KeyExists);
        }

        state.entries.insert(entry.key.clone(), Arc::clone(&entry));
        state.hash_entry(&entry, self.replicas);
        debug!(group = %self.name, key = %entry.key, replicas = self.replicas, "Inserted entry");
        Ok(())
    }

    /// Insert the entry, replacing an existing one with the same key.
    ///
    /// Returns whether an existing entry was replaced.
    pub fn upsert(&self, key: impl Into<String>, payload: impl Into<Vec<u8>>) -> bool {
        let entry = Arc::new(Entry::new(key, payload));
        let mut state = self.state.write();

        let replaced = state.delete(&entry.key, self.replicas);
        state.entries.insert(entry.key.clone(), Arc::clone(&entry));
        state.hash_entry(&entry, self.replicas);
        debug!(group = %self.name, key = %entry.key, replaced, "Upserted entry");
        replaced
    }

    /// Remove an entry and its positions. Deleting an absent key is a no-op.
    ///
    /// Returns whether an entry was removed.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.state.write().delete(key, self.replicas);
        if removed {
            debug!(group = %self.name, key, "Deleted entry");
        }
        removed
    }

    /// Find the entry responsible for `key`.
    ///
    /// Fails with [`Error::NoResultMatched`] only when the ring is empty.
    pub fn match_key(&self, key: &str) -> Result<Arc<Entry>> {
        self.match_hash(hash_key(key))
    }

    /// Find the entry owning the raw ring position `hash`.
    pub fn match_hash(&self, hash: u32) -> Result<Arc<Entry>> {
        let state = self.state.read();
        let point = state
            .index
            .match_position(hash)
            .and_then(|i| state.index.get(i))
            .ok_or(Error::NoResultMatched)?;
        state
            .rows
            .get(&point)
            .cloned()
            .ok_or(Error::NoResultMatched)
    }

    /// Replace all state with `entries`, re-deriving every ring position.
    ///
    /// Keys are trusted to be unique; no `KeyExists` check is made.
    pub fn reconstruct<I>(&self, entries: I)
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut state = self.state.write();
        state.clear();

        let entries: Vec<Arc<Entry>> = entries.into_iter().map(Arc::new).collect();
        // Only a hint; an overflowing product grows the buffer on demand instead.
        let capacity = entries.len().checked_mul(self.replicas).unwrap_or(0);
        state.index = RingIndex::with_capacity(capacity);

        let mut hashes = Vec::with_capacity(capacity);
        for entry in &entries {
            for hash in replica_hashes(&entry.key, self.replicas) {
                state.rows.insert(hash, Arc::clone(entry));
                hashes.push(hash);
            }
            state.entries.insert(entry.key.clone(), Arc::clone(entry));
        }
        state.index.extend_sorted(hashes);

        debug!(
            group = %self.name,
            entries = state.entries.len(),
            positions = state.index.len(),
            "Reconstructed ring"
        );
    }

    /// Look up a registered entry by key.
    pub fn get(&self, key: &str) -> Option<Arc<Entry>> {
        self.state.read().entries.get(key).cloned()
    }

    /// Whether `key` is registered.
    pub fn contains_key(&self, key: &str) -> bool {
        self.state.read().entries.contains_key(key)
    }

    /// All entries, ordered by key.
    pub fn entries(&self) -> Vec<Arc<Entry>> {
        let state = self.state.read();
        let mut entries: Vec<Arc<Entry>> = state.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Whether the ring has no entries.
    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    /// Number of virtual positions on the ring.
    pub fn positions(&self) -> usize {
        self.state.read().index.len()
    }

    /// Number of distinct positions with an owner.
    pub fn distinct_positions(&self) -> usize {
        self.state.read().rows.len()
    }

    /// Distribution of positions and hash space across entries.
    pub fn stats(&self) -> RingStats {
        let state = self.state.read();
        let positions = state.index.as_slice();
        let mut shares: HashMap<&str, (usize, u64)> = state
            .entries
            .keys()
            .map(|k| (k.as_str(), (0, 0)))
            .collect();

        for (i, &pos) in positions.iter().enumerate() {
            let Some(owner) = state.rows.get(&pos) else {
                continue;
            };
            let arc = match positions.get(i + 1) {
                Some(&next) => u64::from(next - pos),
                None => RING_SPACE - u64::from(pos) + u64::from(positions[0]),
            };
            let slot = shares.entry(owner.key.as_str()).or_insert((0, 0));
            slot.0 += 1;
            slot.1 += arc;
        }

        let mut distribution: Vec<EntryShare> = shares
            .into_iter()
            .map(|(key, (count, arc))| EntryShare {
                key: key.to_string(),
                positions: count,
                share: arc as f64 / RING_SPACE as f64,
            })
            .collect();
        distribution.sort_by(|a, b| a.key.cmp(&b.key));

        RingStats {
            name: self.name.clone(),
            replicas: self.replicas,
            entries: state.entries.len(),
            positions: positions.len(),
            distribution,
        }
    }
}

/// Size of the 32-bit hash space.
const RING_SPACE: u64 = 1 << 32;

/// Statistics about how a ring divides its hash space.
#[derive(Debug, Clone, Serialize)]
pub struct RingStats {
    pub name: String,
    pub replicas: usize,
    pub entries: usize,
    pub positions: usize,
    pub distribution: Vec<EntryShare>,
}

/// One entry's slice of the ring.
#[derive(Debug, Clone, Serialize)]
pub struct EntryShare {
    pub key: String,
    /// Virtual positions owned
    pub positions: usize,
    /// Fraction of the hash space owned, in `[0, 1]`
    pub share: f64,
}
