/*!
 * Subsystem Metrics
 * Process-wide counters for context and block lifecycle events
 *
 * Counters are relaxed atomics updated off the allocation fast path; the
 * snapshot is approximate under concurrent mutation.
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static CONTEXTS_CREATED: AtomicU64 = AtomicU64::new(0);
static CONTEXTS_REUSED: AtomicU64 = AtomicU64::new(0);
static CONTEXTS_RETIRED: AtomicU64 = AtomicU64::new(0);
static CONTEXTS_DESTROYED: AtomicU64 = AtomicU64::new(0);
static CONTEXTS_DISCARDED: AtomicU64 = AtomicU64::new(0);
static BLOCKS_ALLOCATED: AtomicU64 = AtomicU64::new(0);
static BLOCKS_RELEASED: AtomicU64 = AtomicU64::new(0);

#[inline]
pub(crate) fn on_context_created() {
    CONTEXTS_CREATED.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub(crate) fn on_context_reused() {
    CONTEXTS_REUSED.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub(crate) fn on_context_retired() {
    CONTEXTS_RETIRED.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub(crate) fn on_context_destroyed() {
    CONTEXTS_DESTROYED.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub(crate) fn on_context_discarded() {
    CONTEXTS_DISCARDED.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub(crate) fn on_block_allocated() {
    BLOCKS_ALLOCATED.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub(crate) fn on_block_released() {
    BLOCKS_RELEASED.fetch_add(1, Ordering::Relaxed);
}

/// Snapshot of process-wide arena metrics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct MemoryMetrics {
    /// Contexts allocated fresh from the system
    pub contexts_created: u64,
    /// Contexts served from a thread pool
    pub contexts_reused: u64,
    /// Contexts returned to a thread pool
    pub contexts_retired: u64,
    /// Contexts destroyed because a pool was full
    pub contexts_destroyed: u64,
    /// Contexts released in one step on malformed input
    pub contexts_discarded: u64,
    /// Blocks obtained from the system allocator
    pub blocks_allocated: u64,
    /// Blocks returned to the system allocator
    pub blocks_released: u64,
}

impl MemoryMetrics {
    /// Blocks currently held by live contexts and pools
    pub fn blocks_resident(&self) -> u64 {
        self.blocks_allocated.saturating_sub(self.blocks_released)
    }
}

/// Capture the current process-wide metrics
pub fn metrics() -> MemoryMetrics {
    MemoryMetrics {
        contexts_created: CONTEXTS_CREATED.load(Ordering::Relaxed),
        contexts_reused: CONTEXTS_REUSED.load(Ordering::Relaxed),
        contexts_retired: CONTEXTS_RETIRED.load(Ordering::Relaxed),
        contexts_destroyed: CONTEXTS_DESTROYED.load(Ordering::Relaxed),
        contexts_discarded: CONTEXTS_DISCARDED.load(Ordering::Relaxed),
        blocks_allocated: BLOCKS_ALLOCATED.load(Ordering::Relaxed),
        blocks_released: BLOCKS_RELEASED.load(Ordering::Relaxed),
    }
}
