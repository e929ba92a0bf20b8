/*!
 * Run Context
 * What a process can reach while its `run` is on the stack
 */

use super::core::types::ProcessRecord;
use super::instance::ProcessInstance;
use super::memory::ProcessMemory;
use super::registry::ProcessRegistry;
use super::table::ProcessTable;
use crate::core::errors::ProcessResult;
use crate::core::types::{Cost, Cycle, Pid, Priority};
use tracing::debug;

/// Kernel services handed to [`Process::run`](super::Process::run)
///
/// The running process's own behavior and memory are checked out of the
/// table for the duration of the call, so [`get`](Self::get) on its own PID
/// sees an empty memory. Its memory is the `&mut ProcessMemory` argument.
pub struct RunContext<'a> {
    pid: Pid,
    cycle: Cycle,
    table: &'a mut ProcessTable,
    registry: &'a ProcessRegistry,
    charged: Cost,
}

impl<'a> RunContext<'a> {
    pub(crate) fn new(pid: Pid, cycle: Cycle, table: &'a mut ProcessTable, registry: &'a ProcessRegistry) -> Self {
        Self {
            pid,
            cycle,
            table,
            registry,
            charged: 0,
        }
    }

    /// PID of the running process
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Current cycle number
    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    /// Record of the running process
    pub fn record(&self) -> Option<&ProcessRecord> {
        self.table.get(self.pid).map(ProcessInstance::record)
    }

    /// Spawn a child of the running process
    ///
    /// The child is PENDING and first runs on the next pass.
    pub fn spawn(&mut self, class_name: &str, priority: Priority) -> ProcessResult<Pid> {
        self.table
            .spawn(self.registry, class_name, priority, Some(self.pid))
    }

    /// Spawn a process with no parent
    pub fn spawn_detached(&mut self, class_name: &str, priority: Priority) -> ProcessResult<Pid> {
        self.table.spawn(self.registry, class_name, priority, None)
    }

    pub fn get(&self, pid: Pid) -> Option<&ProcessInstance> {
        self.table.get(pid)
    }

    pub fn children(&self) -> Vec<Pid> {
        self.table.children(self.pid)
    }

    /// Memory of another process, for parent/child signalling
    ///
    /// `None` for absent PIDs and for the running process itself.
    pub fn memory_of_mut(&mut self, pid: Pid) -> Option<&mut ProcessMemory> {
        if pid == self.pid {
            return None;
        }
        self.table.get_mut(pid).map(ProcessInstance::memory_mut)
    }

    /// Mark another process DEAD; it will not be invoked again this pass
    pub fn kill(&mut self, pid: Pid) -> bool {
        let killed = self.table.mark_dead(pid);
        if killed {
            debug!(pid, by = self.pid, "process killed");
        }
        killed
    }

    /// Mark the running process DEAD once `run` returns
    pub fn exit(&mut self) {
        self.table.mark_dead(self.pid);
    }

    pub fn set_priority(&mut self, pid: Pid, priority: Priority) -> ProcessResult<()> {
        self.table.set_priority(pid, priority)
    }

    /// Add explicit cost units on top of measured time
    pub fn charge(&mut self, units: Cost) {
        self.charged = self.charged.saturating_add(units);
    }

    pub(crate) fn charged(&self) -> Cost {
        self.charged
    }
}
