/*!
 * Pass Planning
 * Execution order and budget admission for one scheduling pass
 *
 * Both halves are pure: ordering depends only on (priority, pid) and
 * admission only on the costs observed so far, so a pass can be replayed
 * exactly in tests.
 */

use crate::core::types::{Cost, Pid, Priority};
use crate::process::{ProcessInstance, ProcessTable};
use std::cmp::Ordering;

/// One eligible process as the planner sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanEntry {
    pub pid: Pid,
    pub priority: Priority,
}

impl From<&ProcessInstance> for PlanEntry {
    fn from(instance: &ProcessInstance) -> Self {
        Self {
            pid: instance.pid(),
            priority: instance.priority(),
        }
    }
}

impl Ord for PlanEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority first, then lower PID
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| self.pid.cmp(&other.pid))
    }
}

impl PartialOrd for PlanEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Order `eligible` by priority descending, ties by ascending PID
pub fn plan<I>(eligible: I) -> Vec<Pid>
where
    I: IntoIterator<Item = PlanEntry>,
{
    let mut entries: Vec<PlanEntry> = eligible.into_iter().collect();
    entries.sort_unstable();
    entries.into_iter().map(|entry| entry.pid).collect()
}

/// Pass order for every eligible process in `table`
pub fn plan_table(table: &ProcessTable) -> Vec<Pid> {
    plan(
        table
            .all()
            .iter()
            .filter(|instance| instance.status().is_eligible())
            .map(PlanEntry::from),
    )
}

/// Budget bookkeeping for one pass
///
/// A candidate is admitted while the remaining budget covers its projected
/// cost: its own hint if it declares one, otherwise the mean cost measured so
/// far this pass. Nothing is admitted once the spend reaches the budget.
///
/// A candidate whose hint exceeds the remaining budget is suspended even
/// though budget remains, and a later, lower-priority candidate with a
/// smaller projection may still run in that leftover budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    budget: Cost,
    spent: Cost,
    invoked: u64,
}

impl Admission {
    pub fn new(budget: Cost) -> Self {
        Self {
            budget,
            spent: 0,
            invoked: 0,
        }
    }

    pub fn budget(&self) -> Cost {
        self.budget
    }

    pub fn spent(&self) -> Cost {
        self.spent
    }

    #[inline]
    pub fn remaining(&self) -> Cost {
        self.budget.saturating_sub(self.spent)
    }

    /// Cost the next candidate is expected to incur
    pub fn projected(&self, hint: Option<Cost>) -> Cost {
        match hint {
            Some(hint) => hint,
            None if self.invoked == 0 => 0,
            None => self.spent / self.invoked,
        }
    }

    pub fn admits(&self, hint: Option<Cost>) -> bool {
        let remaining = self.remaining();
        remaining > 0 && remaining >= self.projected(hint)
    }

    pub fn record(&mut self, cost: Cost) {
        self.spent = self.spent.saturating_add(cost);
        self.invoked += 1;
    }
}
