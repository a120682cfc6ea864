//! Error types for the map crate
//!
//! Map verbs never fail; errors only come from the configuration boundary.

use thiserror::Error;

// == Map Error Enum ==
/// Unified error type for map construction and configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// A configuration value was present but could not be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the map crate.
pub type Result<T> = std::result::Result<T, MapError>;
