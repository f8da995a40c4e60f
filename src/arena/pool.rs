/*!
 * Context Pooling
 * Per-thread cache of idle contexts, trimmed on return
 *
 * # Performance
 *
 * - **Thread-local**: zero contention between threads
 * - **LIFO**: the most recently idled context is the warmest candidate
 * - **Feedback-driven trimming**: retained capacity follows
 *   `max(local rolling average, producer hint) * POOL_SLACK`, so a thread
 *   that only frees cross-thread contexts still keeps its pool sized for
 *   the producer's workload
 */

use super::context::ContextInner;
use super::peak;
use super::stats;
use super::types::PoolStats;
use crate::core::limits::{MAX_POOL_CONTEXTS, POOL_SLACK};
use log::{debug, trace};
use std::cell::RefCell;

thread_local! {
    static CONTEXT_POOL: RefCell<Vec<Box<ContextInner>>> = RefCell::new(Vec::new());
}

/// Return an idle context to this thread's pool
///
/// A full pool destroys the context instead; otherwise the context is
/// trimmed to the feedback-driven target, reset, and pushed.
pub(crate) fn retire(mut ctx: Box<ContextInner>) {
    CONTEXT_POOL.with(|pool| {
        let mut pool = pool.borrow_mut();
        if pool.len() >= MAX_POOL_CONTEXTS {
            debug!(
                "context pool full; destroying context ({} bytes capacity)",
                ctx.capacity()
            );
            stats::on_context_destroyed();
            return;
        }
        let target = peak::rolling_avg()
            .max(ctx.peak_hint())
            .saturating_mul(POOL_SLACK);
        ctx.trim_to(target);
        ctx.reset_for_reuse();
        trace!(
            "context retired to pool ({} bytes capacity, target {})",
            ctx.capacity(),
            target
        );
        stats::on_context_retired();
        pool.push(ctx);
    });
}

/// Pop the newest pooled context whose capacity covers `hint`
pub(crate) fn acquire(hint: usize) -> Option<Box<ContextInner>> {
    CONTEXT_POOL.with(|pool| {
        let mut pool = pool.borrow_mut();
        let index = pool.iter().rposition(|ctx| ctx.capacity() >= hint)?;
        Some(pool.remove(index))
    })
}

/// Statistics for this thread's idle-context pool
pub fn thread_stats() -> PoolStats {
    CONTEXT_POOL.with(|pool| PoolStats {
        idle: pool.borrow().len(),
        capacity: MAX_POOL_CONTEXTS,
        rolling_avg_peak: peak::rolling_avg(),
    })
}

/// Capacities of this thread's pooled contexts, newest last
pub fn idle_capacities() -> Vec<usize> {
    CONTEXT_POOL.with(|pool| pool.borrow().iter().map(|ctx| ctx.capacity()).collect())
}

/// Release every pooled context on this thread back to the system
pub fn drain() {
    CONTEXT_POOL.with(|pool| pool.borrow_mut().clear());
}
