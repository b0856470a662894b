//! Snapshot wire format for the group registry.
//!
//! Only entries are persisted. Ring positions and owners are derived state
//! and are rebuilt from the entries and the ring's own replica count.
//!
//! ```json
//! {"db":{"name":"db","numberOfReplicas":2000,
//!        "elements":{"10.0.0.1:3306":{"key":"10.0.0.1:3306","payload":"aW5mbw=="}}}}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{validate_replicas, Result};
use crate::ring::{Entry, Ring};

/// Whole-registry snapshot, keyed by group name. Ordered for stable output.
pub type RegistrySnapshot = BTreeMap<String, RingSnapshot>;

/// Persisted state of one ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingSnapshot {
    pub name: String,
    #[serde(rename = "numberOfReplicas", deserialize_with = "bounded_replicas")]
    pub replicas: usize,
    #[serde(default, alias = "agents")]
    pub elements: BTreeMap<String, EntryRecord>,
}

/// Persisted entry. The payload travels as standard base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub key: String,
    #[serde(with = "payload_base64", default)]
    pub payload: Vec<u8>,
}

impl RingSnapshot {
    /// Capture the entries of `ring`.
    pub fn capture(ring: &Ring) -> Self {
        let elements = ring
            .entries()
            .into_iter()
            .map(|entry| {
                let record = EntryRecord {
                    key: entry.key.clone(),
                    payload: entry.payload.clone(),
                };
                (entry.key.clone(), record)
            })
            .collect();

        Self {
            name: ring.name().to_string(),
            replicas: ring.replicas(),
            elements,
        }
    }

    /// Rebuild a ring named `name` from the persisted entries.
    ///
    /// The element map key is the entry's identity.
    pub fn into_ring(self, name: &str) -> Ring {
        let entries = self
            .elements
            .into_iter()
            .map(|(key, record)| Entry::new(key, record.payload));
        Ring::from_entries(name, self.replicas, entries)
    }
}

/// Serialize a snapshot to JSON bytes.
pub fn encode(snapshot: &RegistrySnapshot) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(snapshot)?)
}

/// Parse JSON bytes into a snapshot without touching any registry.
pub fn decode(data: &[u8]) -> Result<RegistrySnapshot> {
    Ok(serde_json::from_slice(data)?)
}

fn bounded_replicas<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let replicas = u64::deserialize(deserializer)?;
    usize::try_from(replicas)
        .ok()
        .and_then(|replicas| validate_replicas(replicas).ok())
        .ok_or_else(|| {
            serde::de::Error::custom(format!(
                "numberOfReplicas {} is outside 1..={}",
                replicas,
                crate::MAX_REPLICAS
            ))
        })
}

mod payload_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S, T>(payload: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: AsRef<[u8]>,
    {
        serializer.serialize_str(&STANDARD.encode(payload.as_ref()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        // null stands for an empty payload
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => STANDARD
                .decode(encoded.as_bytes())
                .map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}
