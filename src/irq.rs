use core::sync::atomic::{AtomicUsize, Ordering};

/// Counts edges on the module's touch/wake-up line.
///
/// Purely informational: bump it from your interrupt handler and read it wherever it is
/// useful. The protocol engine never looks at it.
///
/// ```
/// use r502_protocol::EdgeCounter;
///
/// static TOUCH_EDGES: EdgeCounter = EdgeCounter::new();
///
/// // in the GPIO interrupt handler
/// TOUCH_EDGES.record();
///
/// assert_eq!(TOUCH_EDGES.take(), 1);
/// assert_eq!(TOUCH_EDGES.count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct EdgeCounter {
    edges: AtomicUsize,
}

impl EdgeCounter {
    pub const fn new() -> Self {
        EdgeCounter {
            edges: AtomicUsize::new(0),
        }
    }

    pub fn record(&self) {
        self.edges.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> usize {
        self.edges.load(Ordering::Relaxed)
    }

    /// Returns the count and resets it.
    pub fn take(&self) -> usize {
        self.edges.swap(0, Ordering::Relaxed)
    }
}
