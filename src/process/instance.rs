/*!
 * Process Instance
 * A live process: its record, its behavior and its memory
 */

use super::core::types::{ProcessInfo, ProcessRecord, ProcessStatus};
use super::memory::ProcessMemory;
use super::traits::Process;
use crate::core::data_structures::InlineString;
use crate::core::types::{Cost, Cycle, Pid, Priority};

/// Live runtime representation of a process
///
/// Everything here is rebuilt from the record, the registry and the memory
/// blob on load. `last_cost` is volatile diagnostics only.
pub struct ProcessInstance {
    record: ProcessRecord,
    /// Taken out while the process's own `run` is on the stack
    behavior: Option<Box<dyn Process>>,
    memory: ProcessMemory,
    last_cost: Option<Cost>,
}

impl ProcessInstance {
    pub(crate) fn new(record: ProcessRecord, behavior: Box<dyn Process>, memory: ProcessMemory) -> Self {
        Self {
            record,
            behavior: Some(behavior),
            memory,
            last_cost: None,
        }
    }

    #[inline(always)]
    pub fn pid(&self) -> Pid {
        self.record.pid
    }

    #[inline]
    pub fn record(&self) -> &ProcessRecord {
        &self.record
    }

    #[inline(always)]
    pub fn status(&self) -> ProcessStatus {
        self.record.status
    }

    #[inline]
    pub fn priority(&self) -> Priority {
        self.record.priority
    }

    #[inline]
    pub fn parent_pid(&self) -> Option<Pid> {
        self.record.parent_pid
    }

    #[inline]
    pub fn class_name(&self) -> &InlineString {
        &self.record.class_name
    }

    #[inline]
    pub fn created_at(&self) -> Cycle {
        self.record.created_at
    }

    /// Memory as last checked in; empty while the process itself is running
    #[inline]
    pub fn memory(&self) -> &ProcessMemory {
        &self.memory
    }

    #[inline]
    pub fn last_cost(&self) -> Option<Cost> {
        self.last_cost
    }

    /// Cost the process declares for itself, if it is not mid-run
    pub fn cost_hint(&self) -> Option<Cost> {
        self.behavior.as_ref().and_then(|behavior| behavior.cost_hint())
    }

    pub(crate) fn record_mut(&mut self) -> &mut ProcessRecord {
        &mut self.record
    }

    pub(crate) fn memory_mut(&mut self) -> &mut ProcessMemory {
        &mut self.memory
    }

    /// Move behavior and memory out for an invocation
    pub(crate) fn checkout(&mut self) -> Option<(Box<dyn Process>, ProcessMemory)> {
        let behavior = self.behavior.take()?;
        Some((behavior, std::mem::take(&mut self.memory)))
    }

    /// Put behavior and memory back after an invocation
    pub(crate) fn checkin(&mut self, behavior: Box<dyn Process>, memory: ProcessMemory, cost: Cost) {
        self.behavior = Some(behavior);
        self.memory = memory;
        self.last_cost = Some(cost);
    }

    pub fn info(&self) -> ProcessInfo {
        ProcessInfo {
            pid: self.record.pid,
            parent_pid: self.record.parent_pid,
            class_name: self.record.class_name.clone(),
            status: self.record.status,
            priority: self.record.priority,
            created_at: self.record.created_at,
            last_cost: self.last_cost,
        }
    }
}

impl std::fmt::Debug for ProcessInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessInstance")
            .field("record", &self.record)
            .field("memory", &self.memory)
            .field("last_cost", &self.last_cost)
            .finish_non_exhaustive()
    }
}
