/*!
 * Arena Module
 *
 * Memory contexts for record/message conversion:
 * - Context: bump-allocated block list with snapshot/restore
 * - Pooling: per-thread idle-context cache with adaptive trimming
 * - Piggybacking: producer peak hints carried on each context
 * - Shim: allocator callbacks for the serializer
 */

mod block;
pub mod context;
pub mod peak;
pub mod pool;
pub mod shim;
pub mod stats;
pub mod types;

// Re-export for convenience
pub use context::{Context, Snapshot, SnapshotScope};
pub use shim::SerializerAllocator;
pub use stats::{metrics, MemoryMetrics};
pub use types::{ArenaError, ArenaResult, ArenaStats, PoolStats};
