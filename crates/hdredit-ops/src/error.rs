//! Error types for adjustment chains.

use thiserror::Error;

/// Error type for chain construction and parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpsError {
    /// A chain is missing an identifier or lists one twice.
    #[error("invalid adjustment chain: {0}")]
    InvalidChain(String),

    /// A name did not match any adjustment identifier.
    #[error("unknown adjustment: {0}")]
    UnknownAdjustment(String),
}

/// Result type for chain operations.
pub type OpsResult<T> = Result<T, OpsError>;
