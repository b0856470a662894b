//! chash Library
//!
//! Consistent-hashing rings for client-side sharding. Entries (e.g. server
//! addresses) are registered into named groups and every key resolves to one
//! entry; adding or removing an entry only moves the keys that entry owns.
//!
//! ```rust,ignore
//! use chash::Registry;
//!
//! let registry = Registry::new();
//! let db = registry.create_group("db", 10000)?;
//! db.insert("192.168.1.100:3306", "mysql0-info")?;
//! db.insert("192.168.1.101:3306", "mysql1-info")?;
//!
//! let owner = db.match_key("user-id-1")?;
//! println!("user-id-1 -> {}", owner.key);
//! ```

pub mod api;
pub mod error;
pub mod global;
pub mod persist;
pub mod registry;
pub mod ring;
pub mod types;

pub use error::{Error, Result};
pub use registry::{Registry, RegistrySnapshot, RingSnapshot};
pub use ring::{Entry, Ring, RingIndex, RingStats};
pub use types::ServiceConfig;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::registry::Registry;
    pub use crate::ring::{Entry, Ring};
}

/// Default virtual positions per entry
pub const DEFAULT_REPLICAS: usize = 10000;

/// Largest accepted replica count; groups and snapshots outside `1..=MAX_REPLICAS` are rejected
pub const MAX_REPLICAS: usize = 1 << 20;

/// Keys shorter than this many bytes are staged through a fixed buffer before hashing
pub const HASH_PAD_WIDTH: usize = 64;
