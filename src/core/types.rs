/*!
 * Core Types
 * Common types used across the arena subsystem
 */

/// Size type for memory operations
pub type Size = usize;

/// Common result type for subsystem operations
pub type StoreResult<T> = Result<T, super::errors::StoreError>;
