//! Pending batch buffer
//!
//! The in-memory buffer of series accepted since the last flush. Owned by
//! the commit loop and never shared.

use crate::series::Series;
use std::fmt;

/// Upper bound for the up-front allocation of a batch buffer
const PREALLOC_LIMIT: usize = 4096;

/// Why a pending batch is being emptied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlushTrigger {
    /// The buffer reached its configured capacity
    CapacityReached,
    /// The flush timer elapsed
    TimerElapsed,
    /// A caller asked for an explicit flush
    ForcedFlush,
    /// Final flush before the committer stops
    ShutdownDrain,
}

impl fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlushTrigger::CapacityReached => "capacity",
            FlushTrigger::TimerElapsed => "timer",
            FlushTrigger::ForcedFlush => "forced",
            FlushTrigger::ShutdownDrain => "shutdown",
        };
        f.write_str(name)
    }
}

/// Ordered buffer of series waiting for the next flush
#[derive(Debug)]
pub struct PendingBatch {
    series: Vec<Series>,
    capacity: usize,
}

impl PendingBatch {
    /// Create an empty batch that reports full at `capacity` series
    pub fn new(capacity: usize) -> Self {
        Self {
            series: Vec::with_capacity(capacity.min(PREALLOC_LIMIT)),
            capacity,
        }
    }

    /// Append a series and report whether the batch is now at capacity
    pub fn push(&mut self, series: Series) -> bool {
        self.series.push(series);
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.series.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Move the buffered series out, leaving the batch empty
    pub fn take(&mut self) -> Vec<Series> {
        std::mem::replace(
            &mut self.series,
            Vec::with_capacity(self.capacity.min(PREALLOC_LIMIT)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Value;

    fn series(name: &str) -> Series {
        Series::with_default_columns(name).point(vec![Value::Integer(1)])
    }

    #[test]
    fn test_push_reports_capacity() {
        let mut batch = PendingBatch::new(2);

        assert!(!batch.push(series("a")));
        assert!(batch.push(series("b")));
        assert!(batch.is_full());
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_take_preserves_order_and_resets() {
        let mut batch = PendingBatch::new(10);
        batch.push(series("a"));
        batch.push(series("b"));
        batch.push(series("c"));

        let taken = batch.take();
        let names: Vec<_> = taken.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        assert!(batch.is_empty());
        assert_eq!(batch.capacity(), 10);
        assert!(batch.take().is_empty());
    }

    #[test]
    fn test_trigger_display() {
        assert_eq!(FlushTrigger::CapacityReached.to_string(), "capacity");
        assert_eq!(FlushTrigger::ShutdownDrain.to_string(), "shutdown");
    }
}
