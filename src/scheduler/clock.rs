/*!
 * Cost Clocks
 * Sources of the cost units a scheduling pass charges against its budget
 */

use crate::core::types::Cost;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Monotonic source of cost units
///
/// The scheduler reads the clock immediately before and after each `run` and
/// charges the difference.
pub trait CpuClock: Send + Sync {
    fn now(&self) -> Cost;
}

/// Wall-time clock in microseconds since construction
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuClock for MonotonicClock {
    #[inline]
    fn now(&self) -> Cost {
        u64::try_from(self.origin.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

/// Clock that only moves when told to
///
/// For hosts that meter CPU usage themselves, and for deterministic tests.
/// Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    ticks: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, units: Cost) {
        self.ticks.fetch_add(units, Ordering::Relaxed);
    }

    pub fn set(&self, ticks: Cost) {
        self.ticks.store(ticks, Ordering::Relaxed);
    }
}

impl CpuClock for ManualClock {
    #[inline]
    fn now(&self) -> Cost {
        self.ticks.load(Ordering::Relaxed)
    }
}
