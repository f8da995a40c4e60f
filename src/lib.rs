/*!
 * Record Arena Library
 *
 * Arena memory contexts for a datastore engine that exchanges structured
 * records with clients through a serialization library. Groups a record
 * and all of its shallow copies into a handful of large blocks, pools idle
 * contexts per thread, and carries producer peak hints across thread
 * handoffs so consumer pools stay correctly sized.
 */

pub mod arena;
pub mod core;
pub mod record;

pub use crate::arena::{
    ArenaError, ArenaResult, ArenaStats, Context, MemoryMetrics, PoolStats, SerializerAllocator,
    Snapshot, SnapshotScope,
};
pub use crate::core::errors::{SerializableError, StoreError};
pub use crate::record::{Value, ValueList, ValueRef, WireError, WireMessage, WireResult};
