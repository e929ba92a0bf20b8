/*!
 * Process Table
 *
 * The per-cycle working set: every live process in insertion order, plus
 * what the durable store held that could not be brought to life (orphaned
 * records and memory blobs without a record) so it can be written back
 * untouched.
 *
 * # Layout
 *
 * A dense `Vec` arena in insertion order with an `ahash` PID → slot index.
 * Parent/child links are plain PIDs looked up through the index, so there
 * are no reference cycles. Slots are only removed by [`ProcessTable::reap`],
 * which runs at the cycle boundary.
 */

use super::core::types::{ProcessInfo, ProcessRecord, ProcessStatus};
use super::instance::ProcessInstance;
use super::memory::ProcessMemory;
use super::registry::ProcessRegistry;
use super::validation::validate_transition;
use crate::core::errors::{ProcessError, ProcessResult};
use crate::core::limits::{DEFAULT_PID_LIMIT, FIRST_PID, INITIAL_CYCLE};
use crate::core::types::{Cycle, Pid, Priority};
use ahash::AHashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Ordered collection of live processes for the current cycle
pub struct ProcessTable {
    entries: Vec<ProcessInstance>,
    index: AHashMap<Pid, usize>,
    orphans: BTreeMap<Pid, ProcessRecord>,
    retained_memory: BTreeMap<Pid, Value>,
    next_pid: Pid,
    cycle: Cycle,
    pid_limit: Pid,
}

impl ProcessTable {
    /// Empty table with the default PID limit
    pub fn new() -> Self {
        Self::with_pid_limit(DEFAULT_PID_LIMIT)
    }

    /// Empty table whose PID counter wraps after `pid_limit`
    pub fn with_pid_limit(pid_limit: Pid) -> Self {
        Self::from_header(FIRST_PID, INITIAL_CYCLE, pid_limit)
    }

    /// Empty table resuming a persisted counter state
    pub(crate) fn from_header(next_pid: Pid, cycle: Cycle, pid_limit: Pid) -> Self {
        let pid_limit = pid_limit.max(FIRST_PID);
        let next_pid = if (FIRST_PID..=pid_limit).contains(&next_pid) {
            next_pid
        } else {
            FIRST_PID
        };
        Self {
            entries: Vec::new(),
            index: AHashMap::new(),
            orphans: BTreeMap::new(),
            retained_memory: BTreeMap::new(),
            next_pid,
            cycle,
            pid_limit,
        }
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn get(&self, pid: Pid) -> Option<&ProcessInstance> {
        self.index.get(&pid).map(|&slot| &self.entries[slot])
    }

    pub(crate) fn get_mut(&mut self, pid: Pid) -> Option<&mut ProcessInstance> {
        match self.index.get(&pid) {
            Some(&slot) => Some(&mut self.entries[slot]),
            None => None,
        }
    }

    /// Every live instance in insertion order
    ///
    /// Priority order is the scheduler's concern; the table never re-sorts.
    pub fn all(&self) -> &[ProcessInstance] {
        &self.entries
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.index.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of instances not marked DEAD
    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|p| !p.status().is_dead()).count()
    }

    /// PIDs whose parent is `pid`, in table order
    pub fn children(&self, pid: Pid) -> Vec<Pid> {
        self.entries
            .iter()
            .filter(|p| p.parent_pid() == Some(pid))
            .map(ProcessInstance::pid)
            .collect()
    }

    /// Diagnostic snapshot of every live instance
    pub fn ps(&self) -> Vec<ProcessInfo> {
        self.entries.iter().map(ProcessInstance::info).collect()
    }

    /// Records whose class was not registered at load time
    pub fn orphans(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.orphans.values()
    }

    pub fn orphan_count(&self) -> usize {
        self.orphans.len()
    }

    pub(crate) fn retained_memory(&self) -> &BTreeMap<Pid, Value> {
        &self.retained_memory
    }

    /// Next PID the counter will try
    pub fn next_pid(&self) -> Pid {
        self.next_pid
    }

    pub fn pid_limit(&self) -> Pid {
        self.pid_limit
    }

    /// Number of scheduling passes completed, or in progress
    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    pub(crate) fn advance_cycle(&mut self) -> Cycle {
        self.cycle += 1;
        self.cycle
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Create a PENDING process of `class_name`
    ///
    /// Fails with [`ProcessError::UnknownClass`] before touching the table if
    /// the class is not registered. The new process first becomes eligible
    /// on the next scheduling pass.
    pub fn spawn(
        &mut self,
        registry: &ProcessRegistry,
        class_name: &str,
        priority: Priority,
        parent_pid: Option<Pid>,
    ) -> ProcessResult<Pid> {
        let factory = registry
            .resolve(class_name)
            .ok_or_else(|| ProcessError::UnknownClass(class_name.into()))?;

        let pid = self.allocate_pid()?;
        let record = ProcessRecord::new(pid, class_name, priority, parent_pid, self.cycle);
        let behavior = factory(&record);
        self.insert(ProcessInstance::new(record, behavior, ProcessMemory::new()));

        info!(pid, class = class_name, priority, parent = ?parent_pid, "process spawned");
        Ok(pid)
    }

    /// Insert a rehydrated instance, keeping its persisted PID
    pub(crate) fn insert(&mut self, instance: ProcessInstance) {
        let pid = instance.pid();
        if let Some(&slot) = self.index.get(&pid) {
            self.entries[slot] = instance;
        } else {
            self.index.insert(pid, self.entries.len());
            self.entries.push(instance);
        }
    }

    pub(crate) fn insert_orphan(&mut self, record: ProcessRecord) {
        self.orphans.insert(record.pid, record);
    }

    pub(crate) fn retain_memory(&mut self, pid: Pid, memory: Value) {
        self.retained_memory.insert(pid, memory);
    }

    fn pid_in_use(&self, pid: Pid) -> bool {
        self.index.contains_key(&pid)
            || self.orphans.contains_key(&pid)
            || self.retained_memory.contains_key(&pid)
            || self.is_named_as_parent(pid)
    }

    /// Whether any record in the table still names `pid` as its parent
    fn is_named_as_parent(&self, pid: Pid) -> bool {
        self.entries.iter().any(|p| p.parent_pid() == Some(pid))
            || self.orphans.values().any(|r| r.parent_pid == Some(pid))
    }

    /// Next free PID, wrapping at the limit
    ///
    /// Skips any PID still held by a record or memory blob, and any PID a
    /// record names as its parent, so a new process never adopts the
    /// children of a reaped one.
    fn allocate_pid(&mut self) -> ProcessResult<Pid> {
        let span = u64::from(self.pid_limit - FIRST_PID) + 1;
        let mut candidate = self.next_pid;

        for _ in 0..span {
            let following = if candidate >= self.pid_limit {
                FIRST_PID
            } else {
                candidate + 1
            };
            if !self.pid_in_use(candidate) {
                self.next_pid = following;
                return Ok(candidate);
            }
            candidate = following;
        }

        Err(ProcessError::PidSpaceExhausted {
            limit: self.pid_limit,
        })
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Change a live process's status, enforcing the lifecycle rules
    pub(crate) fn set_status(&mut self, pid: Pid, status: ProcessStatus) -> ProcessResult<()> {
        let instance = self.get_mut(pid).ok_or(ProcessError::NotFound(pid))?;
        let current = instance.status();
        if current == status {
            return Ok(());
        }
        validate_transition(pid, current, status)?;
        instance.record_mut().status = status;
        Ok(())
    }

    /// Mark a process DEAD; no-op if it is already dead or absent
    ///
    /// Returns whether anything changed. The record stays in the table until
    /// the next [`reap`](Self::reap).
    pub fn mark_dead(&mut self, pid: Pid) -> bool {
        match self.get_mut(pid) {
            Some(instance) if !instance.status().is_dead() => {
                instance.record_mut().status = ProcessStatus::Dead;
                debug!(pid, "process marked dead");
                true
            }
            _ => false,
        }
    }

    /// Mark a process and all its live descendants DEAD
    ///
    /// Returns how many records changed.
    pub fn kill_tree(&mut self, pid: Pid) -> usize {
        if !self.contains(pid) {
            return 0;
        }

        let mut killed = 0;
        let mut stack = vec![pid];
        while let Some(next) = stack.pop() {
            if self.mark_dead(next) {
                killed += 1;
            }
            stack.extend(
                self.children(next)
                    .into_iter()
                    .filter(|child| self.get(*child).is_some_and(|c| !c.status().is_dead())),
            );
        }
        killed
    }

    /// Change a live process's priority; takes effect on the next pass
    pub fn set_priority(&mut self, pid: Pid, priority: Priority) -> ProcessResult<()> {
        match self.get_mut(pid) {
            Some(instance) if !instance.status().is_dead() => {
                let previous = instance.priority();
                instance.record_mut().priority = priority;
                info!(pid, previous, priority, "process priority updated");
                Ok(())
            }
            _ => Err(ProcessError::NotFound(pid)),
        }
    }

    /// Drop every DEAD instance, returning the reaped PIDs in table order
    pub(crate) fn reap(&mut self) -> Vec<Pid> {
        let reaped: Vec<Pid> = self
            .entries
            .iter()
            .filter(|p| p.status().is_dead())
            .map(ProcessInstance::pid)
            .collect();

        if reaped.is_empty() {
            return reaped;
        }

        self.entries.retain(|p| !p.status().is_dead());
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(slot, p)| (p.pid(), slot))
            .collect();

        debug!(count = reaped.len(), "reaped dead processes");
        reaped
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProcessTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessTable")
            .field("processes", &self.entries.len())
            .field("orphans", &self.orphans.len())
            .field("next_pid", &self.next_pid)
            .field("cycle", &self.cycle)
            .finish()
    }
}
