/*!
 * Memory Context
 *
 * An arena holding the storage for one logical top-level record and all of
 * its shallow copies. Storage is an ordered list of blocks consumed by bump
 * cursors; the whole context is released (or pooled) at once when its last
 * attachment drops.
 *
 * # Performance
 *
 * - **Allocation**: amortized O(1); first-fit over a bounded tail window,
 *   geometric block growth keeps the block count logarithmic
 * - **Release**: O(blocks), a handful of system frees at most
 * - **Snapshot/restore**: O(1) amortized
 *
 * # Ownership
 *
 * A context is single-owner at any instant. The `Context` type is a handle:
 * cloning attaches (`obj_count` up), dropping detaches (`obj_count` down),
 * and the drop that takes the count to zero records the realized peak and
 * offers the storage to the current thread's idle pool. Handles move across
 * threads only at message handoff points; between handoffs exactly one
 * thread may touch the context or anything allocated from it.
 */

use super::block::Block;
use super::peak;
use super::pool;
use super::stats;
use super::types::{ArenaError, ArenaResult, ArenaStats};
use crate::core::limits::{
    ALLOC_TAIL_WINDOW, BLOCK_GROWTH_FACTOR, MAX_SCALAR_ALIGN, MIN_BLOCK_SIZE,
};
use log::warn;
use std::cell::{Cell, RefCell};
use std::ptr::NonNull;

/// Context storage and counters
///
/// Counters are plain cells: the single-owner contract rules out concurrent
/// access, so no atomics are taken on the attachment count.
pub(crate) struct ContextInner {
    blocks: RefCell<Vec<Block>>,
    obj_count: Cell<u32>,
    peak_hint: Cell<usize>,
    used_total: Cell<usize>,
    high_water: Cell<usize>,
    capacity: Cell<usize>,
}

impl ContextInner {
    /// Allocate a fresh context with one initial block
    fn fresh(hint: usize, avg: usize) -> ArenaResult<Box<Self>> {
        let initial = MIN_BLOCK_SIZE.max(hint);
        let block = Block::new(initial)?;
        Ok(Box::new(Self {
            blocks: RefCell::new(vec![block]),
            obj_count: Cell::new(1),
            peak_hint: Cell::new(avg),
            used_total: Cell::new(0),
            high_water: Cell::new(0),
            capacity: Cell::new(initial),
        }))
    }

    /// Restamp a pooled context for its next lifecycle
    fn stamp(&self, avg: usize) {
        self.obj_count.set(1);
        self.peak_hint.set(avg);
    }

    #[inline]
    fn note_alloc(&self, consumed: usize) {
        let used = self.used_total.get() + consumed;
        self.used_total.set(used);
        if used > self.high_water.get() {
            self.high_water.set(used);
        }
    }

    /// First-fit over the tail window, appending a grown block on miss
    ///
    /// The appended block is linked only after its system allocation has
    /// succeeded, so a failed append leaves no partial state behind.
    pub(crate) fn alloc(&self, n: usize, align: usize) -> ArenaResult<NonNull<u8>> {
        let mut blocks = self.blocks.borrow_mut();
        let start = blocks.len().saturating_sub(ALLOC_TAIL_WINDOW);
        for block in blocks[start..].iter_mut() {
            if let Some((ptr, consumed)) = block.try_alloc(n, align) {
                self.note_alloc(consumed);
                return Ok(ptr);
            }
        }

        let needed = if align <= MAX_SCALAR_ALIGN {
            n
        } else {
            n.saturating_add(align)
        };
        let tail_size = blocks.last().map(Block::size).unwrap_or(0);
        let block_size = MIN_BLOCK_SIZE
            .max(needed)
            .max(tail_size.saturating_mul(BLOCK_GROWTH_FACTOR));
        let mut block = Block::new(block_size).map_err(|err| {
            warn!("context block append failed: {err}");
            err
        })?;
        let (ptr, consumed) = match block.try_alloc(n, align) {
            Some(reservation) => reservation,
            None => return Err(ArenaError::OutOfMemory { requested: n }),
        };
        self.capacity.set(self.capacity.get() + block_size);
        blocks.push(block);
        self.note_alloc(consumed);
        Ok(ptr)
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity.get()
    }

    #[inline]
    pub(crate) fn peak_hint(&self) -> usize {
        self.peak_hint.get()
    }

    /// Drop tail blocks until total capacity fits `target`
    ///
    /// The head block is always retained, so a trimmed context stays usable
    /// without a fresh system allocation.
    pub(crate) fn trim_to(&mut self, target: usize) {
        let blocks = self.blocks.get_mut();
        while blocks.len() > 1 && self.capacity.get() > target {
            if let Some(block) = blocks.pop() {
                self.capacity.set(self.capacity.get() - block.size());
            }
        }
    }

    /// Rewind every cursor and counter for the next pooled lifecycle
    pub(crate) fn reset_for_reuse(&mut self) {
        for block in self.blocks.get_mut().iter_mut() {
            block.reset();
        }
        self.obj_count.set(0);
        self.used_total.set(0);
        self.high_water.set(0);
    }

    fn capture(&self) -> Snapshot {
        let blocks = self.blocks.borrow();
        Snapshot {
            block_count: blocks.len(),
            tail_used: blocks.last().map(Block::used).unwrap_or(0),
            obj_count: self.obj_count.get(),
            used_total: self.used_total.get(),
        }
    }

    fn restore(&self, snap: &Snapshot) {
        let mut blocks = self.blocks.borrow_mut();
        debug_assert!(snap.block_count >= 1);
        debug_assert!(snap.block_count <= blocks.len());
        while blocks.len() > snap.block_count {
            if let Some(block) = blocks.pop() {
                self.capacity.set(self.capacity.get() - block.size());
            }
        }
        if let Some(tail) = blocks.last_mut() {
            tail.rewind(snap.tail_used);
        }
        self.obj_count.set(snap.obj_count);
        self.used_total.set(snap.used_total);
    }
}

/// Handle to a memory context
///
/// Records and serializer messages embed one of these; an unmanaged handle
/// (no backing storage) marks an object whose fields live on the system
/// allocator instead. `Clone` attaches, `Drop` detaches.
pub struct Context {
    inner: Option<NonNull<ContextInner>>,
}

// SAFETY: a context is single-owner at any instant; handles move across
// threads only at message handoff points with no concurrent access, which
// is why the counters are plain cells rather than atomics.
unsafe impl Send for Context {}

impl Context {
    /// Obtain a context able to hold roughly `hint` bytes
    ///
    /// Pops the newest pooled context on this thread whose capacity covers
    /// the hint, else allocates one fresh block of
    /// `max(MIN_BLOCK_SIZE, hint)`. The context is stamped with this
    /// thread's rolling average peak for downstream pool sizing.
    #[cfg(feature = "arena")]
    pub fn new(hint: usize) -> ArenaResult<Self> {
        let avg = peak::rolling_avg();
        let inner = match pool::acquire(hint) {
            Some(reused) => {
                reused.stamp(avg);
                stats::on_context_reused();
                log::trace!("context reused from pool (capacity {})", reused.capacity());
                reused
            }
            None => {
                let fresh = ContextInner::fresh(hint, avg)?;
                stats::on_context_created();
                log::trace!("context created (capacity {})", fresh.capacity());
                fresh
            }
        };
        // SAFETY: Box::into_raw never returns null
        let ptr = unsafe { NonNull::new_unchecked(Box::into_raw(inner)) };
        Ok(Self { inner: Some(ptr) })
    }

    /// Obtain a context (subsystem disabled: always unmanaged)
    #[cfg(not(feature = "arena"))]
    pub fn new(_hint: usize) -> ArenaResult<Self> {
        Ok(Self::unmanaged())
    }

    /// A handle with no backing storage (system-allocator fallback)
    pub const fn unmanaged() -> Self {
        Self { inner: None }
    }

    #[inline]
    pub fn is_managed(&self) -> bool {
        self.inner.is_some()
    }

    #[inline]
    fn inner(&self) -> Option<&ContextInner> {
        // SAFETY: the pointee lives until the last handle drops, and this
        // borrow cannot outlive the handle
        self.inner.map(|ptr| unsafe { &*ptr.as_ptr() })
    }

    #[inline]
    pub(crate) fn raw_inner(&self) -> Option<NonNull<ContextInner>> {
        self.inner
    }

    /// Allocate `n` bytes at maximal scalar alignment
    pub fn alloc(&self, n: usize) -> ArenaResult<NonNull<u8>> {
        self.alloc_aligned(n, MAX_SCALAR_ALIGN)
    }

    /// Allocate `n` bytes at an explicit alignment
    pub fn alloc_aligned(&self, n: usize, align: usize) -> ArenaResult<NonNull<u8>> {
        let inner = self.inner().ok_or(ArenaError::UnmanagedContext)?;
        inner.alloc(n, align)
    }

    /// Allocate-and-copy a byte slice into the context
    pub fn copy_slice(&self, bytes: &[u8]) -> ArenaResult<NonNull<u8>> {
        let dst = self.alloc(bytes.len())?;
        // SAFETY: dst is a fresh reservation of bytes.len() bytes, disjoint
        // from the source
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst.as_ptr(), bytes.len());
        }
        Ok(dst)
    }

    /// Allocate-and-copy string bytes into the context
    pub fn copy_str(&self, s: &str) -> ArenaResult<NonNull<u8>> {
        self.copy_slice(s.as_bytes())
    }

    /// Capture the allocation cursor and attachment count
    pub fn snapshot(&self) -> ArenaResult<Snapshot> {
        let inner = self.inner().ok_or(ArenaError::UnmanagedContext)?;
        Ok(inner.capture())
    }

    /// Rewind to a previously captured snapshot
    ///
    /// Blocks appended after the capture are released to the system and the
    /// captured tail cursor is rewound. Restoring while an allocation made
    /// after the capture is still referenced is a contract violation and is
    /// not diagnosed.
    pub fn restore(&self, snap: &Snapshot) -> ArenaResult<()> {
        let inner = self.inner().ok_or(ArenaError::UnmanagedContext)?;
        inner.restore(snap);
        Ok(())
    }

    /// Open a snapshot scope restored on every exit path
    ///
    /// Unmanaged contexts get a no-op scope, so conversion routines can
    /// bracket transient allocations without branching on management.
    pub fn scope(&self) -> SnapshotScope<'_> {
        SnapshotScope {
            ctx: self,
            snap: self.inner().map(ContextInner::capture),
        }
    }

    /// Release every block immediately, bypassing pool and peak window
    ///
    /// Used when serializer input turns out malformed and no object exists
    /// to drive the usual detach-triggered release. Legal only while this
    /// handle is the sole attachment.
    pub fn discard(self) {
        let inner = self.inner;
        std::mem::forget(self);
        if let Some(ptr) = inner {
            debug_assert_eq!(unsafe { ptr.as_ref() }.obj_count.get(), 1);
            // SAFETY: the handle was consumed above without running Drop,
            // so this is the sole release of the box
            drop(unsafe { Box::from_raw(ptr.as_ptr()) });
            stats::on_context_discarded();
        }
    }

    /// Live attachments on this context (zero for unmanaged handles)
    pub fn obj_count(&self) -> u32 {
        self.inner().map(|i| i.obj_count.get()).unwrap_or(0)
    }

    /// Total block capacity in bytes
    pub fn capacity(&self) -> usize {
        self.inner().map(ContextInner::capacity).unwrap_or(0)
    }

    /// Bytes currently consumed across all blocks
    pub fn used(&self) -> usize {
        self.inner().map(|i| i.used_total.get()).unwrap_or(0)
    }

    /// Running high-water mark of consumed bytes
    pub fn high_water(&self) -> usize {
        self.inner().map(|i| i.high_water.get()).unwrap_or(0)
    }

    /// Number of blocks backing this context
    pub fn block_count(&self) -> usize {
        self.inner().map(|i| i.blocks.borrow().len()).unwrap_or(0)
    }

    /// Statistics snapshot for this context
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            blocks: self.block_count(),
            capacity: self.capacity(),
            used: self.used(),
            high_water: self.high_water(),
            obj_count: self.obj_count(),
        }
    }
}

impl Clone for Context {
    /// Attach to the same context (`obj_count` up)
    fn clone(&self) -> Self {
        if let Some(inner) = self.inner() {
            inner.obj_count.set(inner.obj_count.get() + 1);
        }
        Self { inner: self.inner }
    }
}

impl Drop for Context {
    /// Detach (`obj_count` down); the final detach records the realized
    /// peak on this thread and offers the storage to the thread's pool
    fn drop(&mut self) {
        let Some(ptr) = self.inner.take() else {
            return;
        };
        let remaining = {
            // SAFETY: the pointee outlives every handle
            let inner = unsafe { ptr.as_ref() };
            let count = inner.obj_count.get().saturating_sub(1);
            inner.obj_count.set(count);
            count
        };
        if remaining == 0 {
            // SAFETY: last attachment; the box was leaked by `new`
            let boxed = unsafe { Box::from_raw(ptr.as_ptr()) };
            peak::record(boxed.high_water.get());
            pool::retire(boxed);
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner() {
            Some(inner) => f
                .debug_struct("Context")
                .field("blocks", &inner.blocks.borrow().len())
                .field("capacity", &inner.capacity.get())
                .field("used", &inner.used_total.get())
                .field("obj_count", &inner.obj_count.get())
                .finish(),
            None => f.write_str("Context(unmanaged)"),
        }
    }
}

/// Value-typed cursor into a context's allocation state
///
/// Captures the tail block identity, its cursor, and the attachment count.
/// Not transferable across threads (the context itself moves only at
/// handoff points, and a snapshot must be restored where it was captured).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    block_count: usize,
    tail_used: usize,
    obj_count: u32,
    used_total: usize,
}

/// RAII snapshot scope; restores on drop
///
/// Used to bracket serializer conversions so transient shallow copies are
/// discarded on every exit path.
pub struct SnapshotScope<'a> {
    ctx: &'a Context,
    snap: Option<Snapshot>,
}

impl Drop for SnapshotScope<'_> {
    fn drop(&mut self) {
        if let (Some(inner), Some(snap)) = (self.ctx.inner(), self.snap.take()) {
            inner.restore(&snap);
        }
    }
}
