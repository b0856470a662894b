//! # Consistent Hash Ring
//!
//! Maps string keys onto a dynamic set of entries so that membership
//! changes only reassign the keys owned by the entry that joined or left.
//!
//! ## Components
//! - `hash`: CRC-32 key hashing and virtual-key derivation
//! - `index`: sorted position index with exact search and wrap-around match
//! - `partition`: the lock-guarded ring combining entries, index and owners

pub mod hash;
pub mod index;
pub mod partition;

pub use hash::{hash_key, virtual_key};
pub use index::RingIndex;
pub use partition::{Entry, EntryShare, Ring, RingStats};
