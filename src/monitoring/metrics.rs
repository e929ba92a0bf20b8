/*!
 * Kernel Metrics
 * Cumulative counters across cycles
 */

use crate::core::types::Cost;
use crate::scheduler::CycleReport;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

fn is_zero_u64(value: &u64) -> bool {
    *value == 0
}

/// Point-in-time view of the kernel counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub cycles: u64,
    pub spent_total: Cost,
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub invocations: u64,
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub suspensions: u64,
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub crashes: u64,
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub exits: u64,
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub over_budget_cycles: u64,
    pub max_spent: Cost,
    pub uptime_secs: f64,
}

impl MetricsSnapshot {
    /// Mean spend per cycle
    pub fn mean_spent(&self) -> f64 {
        if self.cycles == 0 {
            return 0.0;
        }
        self.spent_total as f64 / self.cycles as f64
    }
}

#[derive(Debug, Default)]
struct Counters {
    cycles: u64,
    spent_total: Cost,
    invocations: u64,
    suspensions: u64,
    crashes: u64,
    exits: u64,
    over_budget_cycles: u64,
    max_spent: Cost,
}

/// Cumulative scheduling counters
///
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct KernelMetrics {
    counters: Arc<Mutex<Counters>>,
    start_time: Instant,
}

impl KernelMetrics {
    pub fn new() -> Self {
        Self {
            counters: Arc::new(Mutex::new(Counters::default())),
            start_time: Instant::now(),
        }
    }

    /// Fold one pass outcome into the counters
    pub fn record_cycle(&self, report: &CycleReport) {
        let mut counters = self.counters.lock();
        counters.cycles += 1;
        counters.spent_total = counters.spent_total.saturating_add(report.spent);
        counters.invocations += report.invoked.len() as u64;
        counters.suspensions += report.suspended.len() as u64;
        counters.crashes += report.crashed.len() as u64;
        counters.exits += report.exited.len() as u64;
        if report.over_budget() {
            counters.over_budget_cycles += 1;
        }
        counters.max_spent = counters.max_spent.max(report.spent);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self.counters.lock();
        MetricsSnapshot {
            cycles: counters.cycles,
            spent_total: counters.spent_total,
            invocations: counters.invocations,
            suspensions: counters.suspensions,
            crashes: counters.crashes,
            exits: counters.exits,
            over_budget_cycles: counters.over_budget_cycles,
            max_spent: counters.max_spent,
            uptime_secs: self.start_time.elapsed().as_secs_f64(),
        }
    }

    pub fn reset(&self) {
        *self.counters.lock() = Counters::default();
    }
}

impl Default for KernelMetrics {
    fn default() -> Self {
        Self::new()
    }
}
