//! Service-level types.

mod config;

pub use self::config::{ServiceConfig, DEFAULT_PORT};
