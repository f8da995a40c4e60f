/*!
 * Piggyback Feedback Tests
 * Producer peak hints sizing a consumer thread's pool
 */

use crossbeam_channel::unbounded;
use record_arena::arena::pool;
use record_arena::core::limits::PEAK_WINDOW_LEN;
use record_arena::Context;
use std::thread;

const PRODUCER_PEAK: usize = 8 * 1024;
const SMALL_PEAK: usize = 64;

/// Cycle enough contexts with `peak` bytes realized to fill the current
/// thread's peak window
fn warm_local_window(peak: usize) {
    for _ in 0..PEAK_WINDOW_LEN {
        let ctx = Context::new(64).unwrap();
        ctx.alloc(peak).unwrap();
        drop(ctx);
    }
}

#[test]
fn test_producer_hint_sizes_consumer_pool() {
    let (tx, rx) = unbounded::<Context>();

    let consumer = thread::spawn(move || {
        // This thread's own workload is tiny, so its local rolling average
        // alone would trim every large context down to one block
        warm_local_window(SMALL_PEAK);
        let local_avg = pool::thread_stats().rolling_avg_peak;

        for ctx in rx.iter() {
            drop(ctx);
        }
        (local_avg, pool::idle_capacities())
    });

    // Producer: build an 8KB rolling average, then hand off contexts whose
    // stamped hint carries that expectation across the thread boundary
    warm_local_window(PRODUCER_PEAK);
    assert!(pool::thread_stats().rolling_avg_peak >= PRODUCER_PEAK);

    for _ in 0..PEAK_WINDOW_LEN {
        let ctx = Context::new(64).unwrap();
        ctx.alloc(PRODUCER_PEAK).unwrap();
        tx.send(ctx).unwrap();
    }
    drop(tx);

    let (consumer_avg, capacities) = consumer.join().unwrap();
    assert!(consumer_avg <= SMALL_PEAK);

    // The consumer never allocated anything of this size itself, yet its
    // pool keeps the handed-off contexts big enough for the producer's
    // workload instead of trimming them to its own small average
    let retained = capacities
        .iter()
        .filter(|capacity| **capacity >= PRODUCER_PEAK)
        .count();
    assert_eq!(retained, PEAK_WINDOW_LEN);
    pool::drain();
}

#[test]
fn test_handoff_moves_ownership() {
    let ctx = Context::new(1024).unwrap();
    let ptr_addr = ctx.copy_str("handoff payload").unwrap().as_ptr() as usize;

    let worker = thread::spawn(move || {
        // Sole owner after the handoff; reads and the final release happen
        // here
        let ptr = ptr_addr as *mut u8;
        let copied = unsafe { std::slice::from_raw_parts(ptr, 15) };
        assert_eq!(copied, b"handoff payload");
        assert_eq!(ctx.obj_count(), 1);
        drop(ctx);
        pool::thread_stats().idle
    });

    assert_eq!(worker.join().unwrap(), 1);
}
