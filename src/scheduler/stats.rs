/*!
 * Pass Statistics
 */

use crate::core::types::{Cost, Cycle, Pid};
use serde::Serialize;

/// Outcome of one scheduling pass
///
/// PID lists are in the order the scheduler reached each process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub cycle: Cycle,
    pub budget: Cost,
    pub spent: Cost,
    /// Every process whose `run` was called, including those that crashed
    pub invoked: Vec<Pid>,
    /// Skipped because the budget ran out
    pub suspended: Vec<Pid>,
    /// `run` returned an error or panicked
    pub crashed: Vec<Pid>,
    /// Marked themselves dead inside `run`
    pub exited: Vec<Pid>,
}

impl CycleReport {
    pub fn new(cycle: Cycle, budget: Cost) -> Self {
        Self {
            cycle,
            budget,
            ..Self::default()
        }
    }

    #[inline]
    pub fn over_budget(&self) -> bool {
        self.spent > self.budget
    }

    /// Share of the budget consumed, in percent
    pub fn utilization(&self) -> f64 {
        if self.budget == 0 {
            return 0.0;
        }
        (self.spent as f64 / self.budget as f64) * 100.0
    }
}
