/*!
 * Peak-Usage Tracking
 *
 * Per-thread sliding window of the peaks observed when contexts are
 * decommissioned, plus their running average. Every new context is stamped
 * with the allocating thread's current average so that the thread that
 * eventually idles the context can size its pool for the producer's
 * workload without any out-of-band channel.
 */

use crate::core::limits::PEAK_WINDOW_LEN;
use std::cell::RefCell;

#[derive(Debug, Default)]
struct PeakWindow {
    ring: [usize; PEAK_WINDOW_LEN],
    len: usize,
    next: usize,
    avg: usize,
}

impl PeakWindow {
    fn record(&mut self, peak: usize) {
        self.ring[self.next] = peak;
        self.next = (self.next + 1) % PEAK_WINDOW_LEN;
        if self.len < PEAK_WINDOW_LEN {
            self.len += 1;
        }
        let sum: usize = self.ring[..self.len].iter().sum();
        self.avg = sum / self.len;
    }
}

thread_local! {
    static PEAK_WINDOW: RefCell<PeakWindow> = RefCell::new(PeakWindow::default());
}

/// Record the realized peak of a context decommissioned on this thread
pub(crate) fn record(peak: usize) {
    PEAK_WINDOW.with(|w| w.borrow_mut().record(peak));
}

/// Rolling average of recent decommission peaks on this thread
///
/// Zero until the first context is decommissioned here.
pub fn rolling_avg() -> usize {
    PEAK_WINDOW.with(|w| w.borrow().avg)
}
