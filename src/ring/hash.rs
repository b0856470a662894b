//! Key hashing and virtual-node key derivation.

use crate::HASH_PAD_WIDTH;

/// Hash a key onto the 32-bit ring using CRC-32 (IEEE).
///
/// Keys shorter than [`HASH_PAD_WIDTH`] bytes are staged through a
/// zero-filled fixed-size buffer before checksumming.
pub fn hash_key(key: &str) -> u32 {
    let bytes = key.as_bytes();
    if bytes.len() < HASH_PAD_WIDTH {
        let mut scratch = [0u8; HASH_PAD_WIDTH];
        scratch[..bytes.len()].copy_from_slice(bytes);
        return crc32fast::hash(&scratch[..bytes.len()]);
    }
    crc32fast::hash(bytes)
}

/// Build the key for replica `index` of `key`: the decimal index followed by the key.
///
/// Replica 3 of `"X"` is `"3X"`. Only `(key, index)` is needed, so a ring can
/// be rebuilt from persisted entries and its replica count alone.
pub fn virtual_key(key: &str, index: usize) -> String {
    format!("{}{}", index, key)
}

/// Ring positions of every replica of `key`, in replica order.
pub fn replica_hashes(key: &str, replicas: usize) -> impl Iterator<Item = u32> + '_ {
    (0..replicas).map(move |i| hash_key(&virtual_key(key, i)))
}
