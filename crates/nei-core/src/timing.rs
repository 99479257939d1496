//! Lightweight performance timing utilities.
//!
//! Table construction (one dense eigendecomposition per element and grid
//! node) dominates start-up cost, while stepping cost is two small matrix
//! products per element. These timers make that split visible. Enable via
//! the `NEI_TIMING` environment variable or programmatically.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable performance timing globally.
pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

/// Disable performance timing globally.
pub fn disable_timing() {
    ENABLED.store(false, Ordering::Relaxed);
}

/// Check if timing is enabled.
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var("NEI_TIMING").is_ok()
}

/// A simple timer that measures elapsed time.
pub struct Timer {
    label: &'static str,
    start: Instant,
    enabled: bool,
}

impl Timer {
    /// Create and start a new timer with the given label.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
            enabled: is_enabled(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Stop the timer and return elapsed time in seconds.
    /// If timing is disabled, returns None.
    pub fn stop(self) -> Option<f64> {
        if self.enabled {
            Some(self.start.elapsed().as_secs_f64())
        } else {
            None
        }
    }

    /// Stop the timer and add the elapsed time to an accumulator.
    pub fn stop_into(self, acc: &AccumulatingTimer) {
        if let Some(elapsed) = self.stop() {
            acc.record(elapsed);
        }
    }
}

/// Accumulating timer for tracking total time across multiple calls.
pub struct AccumulatingTimer {
    total_ns: AtomicU64,
    count: AtomicU64,
}

impl Default for AccumulatingTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl AccumulatingTimer {
    /// Create a new accumulating timer.
    pub const fn new() -> Self {
        Self {
            total_ns: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Record a timing measurement.
    pub fn record(&self, duration_s: f64) {
        let nanos = (duration_s * 1e9) as u64;
        self.total_ns.fetch_add(nanos, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total time spent (in seconds).
    pub fn total_seconds(&self) -> f64 {
        self.total_ns.load(Ordering::Relaxed) as f64 / 1e9
    }

    /// Get number of calls.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Get average time per call (in seconds).
    pub fn average_seconds(&self) -> f64 {
        let count = self.count();
        if count > 0 {
            self.total_seconds() / count as f64
        } else {
            0.0
        }
    }

    /// Reset the timer.
    pub fn reset(&self) {
        self.total_ns.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }
}

/// Engine-wide accumulators.
pub mod engine_timing {
    use super::AccumulatingTimer;

    /// Per-element rate table builds (all grid nodes).
    pub static TABLE_BUILDS: AccumulatingTimer = AccumulatingTimer::new();
    /// Single-element time advances.
    pub static ADVANCES: AccumulatingTimer = AccumulatingTimer::new();

    /// Reset all engine timers.
    pub fn reset_all() {
        TABLE_BUILDS.reset();
        ADVANCES.reset();
    }

    /// Render a summary, or `None` if timing is disabled or nothing was recorded.
    pub fn summary() -> Option<String> {
        if !super::is_enabled() {
            return None;
        }
        let mut lines = Vec::new();
        for (name, timer) in [("table builds", &TABLE_BUILDS), ("advances", &ADVANCES)] {
            let count = timer.count();
            if count > 0 {
                lines.push(format!(
                    "{name:<14} {count} calls, {:.3}s total, {:.4}ms avg",
                    timer.total_seconds(),
                    timer.average_seconds() * 1000.0
                ));
            }
        }
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulating_timer_averages() {
        let timer = AccumulatingTimer::new();
        assert_eq!(timer.average_seconds(), 0.0);
        timer.record(0.5);
        timer.record(1.5);
        assert_eq!(timer.count(), 2);
        assert!((timer.total_seconds() - 2.0).abs() < 1e-6);
        assert!((timer.average_seconds() - 1.0).abs() < 1e-6);
        timer.reset();
        assert_eq!(timer.count(), 0);
    }
}
