/*!
 * Arena Types
 * Common types for the context allocator
 */

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Arena operation result
pub type ArenaResult<T> = Result<T, ArenaError>;

/// Arena errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    #[error("Out of memory: system allocator refused {requested} bytes")]
    OutOfMemory { requested: usize },

    #[error("Context is unmanaged; arena allocation is unavailable")]
    UnmanagedContext,
}

/// Per-context statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArenaStats {
    pub blocks: usize,
    pub capacity: usize,
    pub used: usize,
    pub high_water: usize,
    pub obj_count: u32,
}

/// Per-thread idle-context pool statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolStats {
    pub idle: usize,
    pub capacity: usize,
    pub rolling_avg_peak: usize,
}
