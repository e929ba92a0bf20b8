/*!
 * Process Traits
 * The behavior contract a domain process fulfills to be scheduled
 */

use super::context::RunContext;
use super::core::types::ProcessRecord;
use super::memory::ProcessMemory;
use crate::core::types::Cost;

/// A schedulable unit of work
///
/// Implementations hold only state that can be rebuilt from their
/// [`ProcessRecord`] and [`ProcessMemory`]: anything else is lost whenever
/// the host discards volatile state between cycles.
///
/// Returning `Err` (or panicking) from [`run`](Self::run) or
/// [`resume`](Self::resume) is a runtime fault: the kernel logs it and marks
/// the process DEAD without disturbing the rest of the pass.
pub trait Process {
    /// Execute one cycle's worth of work
    fn run(&mut self, ctx: &mut RunContext<'_>, memory: &mut ProcessMemory) -> anyhow::Result<()>;

    /// Rebuild derived fields after rehydration from the durable store
    fn resume(&mut self, _memory: &mut ProcessMemory) -> anyhow::Result<()> {
        Ok(())
    }

    /// Expected cost of one `run`, used by the admission check
    ///
    /// `None` lets the scheduler project from costs observed this pass.
    fn cost_hint(&self) -> Option<Cost> {
        None
    }
}

/// Constructs a process instance for a record of its class
pub type ProcessFactory = dyn Fn(&ProcessRecord) -> Box<dyn Process> + Send + Sync;
