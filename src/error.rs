//! Error types for ring and registry operations.

use thiserror::Error;

/// Result type alias for chash operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by rings and the group registry.
///
/// The domain variants are expected conditions the caller decides how to
/// handle. `Decode` covers malformed snapshot data and never mutates state.
#[derive(Error, Debug)]
pub enum Error {
    /// No group is registered under the requested name.
    #[error("group not found")]
    GroupNotFound,

    /// A group with the requested name already exists.
    #[error("group already existed")]
    GroupExists,

    /// The entry key is already registered in the ring.
    #[error("key already existed")]
    KeyExists,

    /// The ring has no positions to match against.
    #[error("no result matched")]
    NoResultMatched,

    /// The replica count is outside `1..=MAX_REPLICAS`.
    #[error("invalid replicas: {0}")]
    InvalidReplicas(usize),

    /// Snapshot data could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Error {
    /// Stable numeric code for the error, suitable for wire responses.
    pub fn code(&self) -> u32 {
        match self {
            Error::GroupNotFound => 10000,
            Error::GroupExists => 10001,
            Error::NoResultMatched => 10002,
            Error::KeyExists => 10003,
            Error::Decode(_) => 10004,
            Error::InvalidReplicas(_) => 10005,
        }
    }
}

/// Check that `replicas` is a usable virtual-position count.
pub fn validate_replicas(replicas: usize) -> Result<usize> {
    if (1..=crate::MAX_REPLICAS).contains(&replicas) {
        Ok(replicas)
    } else {
        Err(Error::InvalidReplicas(replicas))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_messages() {
        assert_eq!(Error::GroupNotFound.code(), 10000);
        assert_eq!(Error::GroupExists.code(), 10001);
        assert_eq!(Error::NoResultMatched.code(), 10002);
        assert_eq!(Error::KeyExists.code(), 10003);

        assert_eq!(Error::GroupNotFound.to_string(), "group not found");
        assert_eq!(Error::KeyExists.to_string(), "key already existed");
    }

    #[test]
    fn test_decode_code() {
        let err: Error = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.code(), 10004);
        assert!(err.to_string().starts_with("decode error"));
    }

    #[test]
    fn test_replica_bounds() {
        assert_eq!(validate_replicas(1).unwrap(), 1);
        assert_eq!(validate_replicas(crate::MAX_REPLICAS).unwrap(), crate::MAX_REPLICAS);

        let err = validate_replicas(0).unwrap_err();
        assert_eq!(err.code(), 10005);
        assert_eq!(err.to_string(), "invalid replicas: 0");
        assert!(matches!(
            validate_replicas(crate::MAX_REPLICAS + 1),
            Err(Error::InvalidReplicas(_))
        ));
    }
}
