/*!
 * Error Types
 * Centralized error handling with thiserror and serde support
 */

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export ArenaError from arena module
pub use crate::arena::types::ArenaError;

// Re-export WireError from record module
pub use crate::record::wire::WireError;

/// Unified subsystem error type
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Arena error: {0}")]
    Arena(#[from] ArenaError),

    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<String> for StoreError {
    fn from(msg: String) -> Self {
        StoreError::Internal(msg)
    }
}

impl From<&str> for StoreError {
    fn from(msg: &str) -> Self {
        StoreError::Internal(msg.to_string())
    }
}

/// Serializable error representation for API responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SerializableError {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl SerializableError {
    /// Create a new serializable error
    pub fn new(error_type: String, message: String) -> Self {
        Self {
            error_type,
            message,
            details: None,
        }
    }

    /// Create a new serializable error with details
    pub fn with_details(error_type: String, message: String, details: String) -> Self {
        Self {
            error_type,
            message,
            details: Some(details),
        }
    }
}

impl From<StoreError> for SerializableError {
    fn from(err: StoreError) -> Self {
        let error_type = match &err {
            StoreError::Arena(_) => "arena_error",
            StoreError::Wire(_) => "wire_error",
            StoreError::Internal(_) => "internal_error",
        };
        SerializableError::new(error_type.to_string(), err.to_string())
    }
}
