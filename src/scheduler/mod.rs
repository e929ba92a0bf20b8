/*!
 * Scheduler Module
 * Priority- and budget-aware execution of one pass over the process table
 *
 * # Pass
 *
 * 1. Plan: order every eligible process by priority descending, PID
 *    ascending. The order is fixed for the whole pass.
 * 2. Walk the plan. Processes that died earlier in the pass are skipped.
 *    Everything the budget cannot cover is SUSPENDED without being invoked.
 * 3. Admitted processes go RUNNING and have `run` called inside a failure
 *    boundary. An `Err` or a panic marks that one process DEAD.
 *
 * Processes spawned during the pass are not in the plan and first run on
 * the next pass.
 */

pub mod clock;
pub mod plan;
pub mod stats;

pub use clock::{CpuClock, ManualClock, MonotonicClock};
pub use plan::{plan, plan_table, Admission, PlanEntry};
pub use stats::CycleReport;

use crate::core::errors::ProcessError;
use crate::core::types::{Cost, Cycle, Pid};
use crate::process::{ProcessRegistry, ProcessStatus, ProcessTable, RunContext};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// How a single invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
enum Invocation {
    Completed { cost: Cost },
    Faulted { cost: Cost, reason: String },
}

/// Cooperative pass executor
#[derive(Clone)]
pub struct Scheduler {
    clock: Arc<dyn CpuClock>,
}

impl Scheduler {
    pub fn new(clock: Arc<dyn CpuClock>) -> Self {
        Self { clock }
    }

    /// Run one pass over `table`, spending at most roughly `budget` cost units
    ///
    /// Never fails: runtime faults are contained per process and reported in
    /// the returned [`CycleReport`].
    pub fn run_pass(&self, table: &mut ProcessTable, registry: &ProcessRegistry, budget: Cost) -> CycleReport {
        let cycle = table.cycle();
        let order = plan_table(table);
        let mut admission = Admission::new(budget);
        let mut report = CycleReport::new(cycle, budget);

        debug!(cycle, budget, eligible = order.len(), "scheduling pass planned");

        for pid in order {
            let hint = match table.get(pid) {
                Some(instance) if instance.status().is_eligible() => instance.cost_hint(),
                // Killed earlier in this pass
                _ => continue,
            };

            if !admission.admits(hint) {
                if let Err(e) = table.set_status(pid, ProcessStatus::Suspended) {
                    warn!(pid, error = %e, "could not suspend process");
                    continue;
                }
                debug!(pid, remaining = admission.remaining(), "process suspended");
                report.suspended.push(pid);
                continue;
            }

            if let Err(e) = table.set_status(pid, ProcessStatus::Running) {
                warn!(pid, error = %e, "could not start process");
                continue;
            }

            let Some(invocation) = self.invoke(table, registry, pid, cycle) else {
                continue;
            };
            report.invoked.push(pid);

            match invocation {
                Invocation::Completed { cost } => {
                    admission.record(cost);
                    debug!(pid, cost, "process ran");
                    if table.get(pid).is_some_and(|p| p.status().is_dead()) {
                        report.exited.push(pid);
                    }
                }
                Invocation::Faulted { cost, reason } => {
                    admission.record(cost);
                    let class = table
                        .get(pid)
                        .map(|p| p.class_name().clone())
                        .unwrap_or_default();
                    let fault = ProcessError::RuntimeFault {
                        pid,
                        class: class.clone(),
                        reason,
                    };
                    error!(pid, class = %class, error = %fault, "process crashed");
                    table.mark_dead(pid);
                    report.crashed.push(pid);
                }
            }
        }

        report.spent = admission.spent();
        report
    }

    /// Call `run` for `pid` with its behavior and memory checked out
    fn invoke(
        &self,
        table: &mut ProcessTable,
        registry: &ProcessRegistry,
        pid: Pid,
        cycle: Cycle,
    ) -> Option<Invocation> {
        let (mut behavior, mut memory) = table.get_mut(pid)?.checkout()?;

        let start = self.clock.now();
        let (outcome, charged) = {
            let mut ctx = RunContext::new(pid, cycle, table, registry);
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| behavior.run(&mut ctx, &mut memory)));
            (outcome, ctx.charged())
        };
        let cost = self.clock.now().saturating_sub(start).saturating_add(charged);

        if let Some(instance) = table.get_mut(pid) {
            instance.checkin(behavior, memory, cost);
        }

        Some(match outcome {
            Ok(Ok(())) => Invocation::Completed { cost },
            Ok(Err(e)) => Invocation::Faulted {
                cost,
                reason: format!("{:#}", e),
            },
            Err(payload) => Invocation::Faulted {
                cost,
                reason: panic_message(payload.as_ref()),
            },
        })
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(Arc::new(MonotonicClock::new()))
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler").finish_non_exhaustive()
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
