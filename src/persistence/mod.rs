/*!
 * Persistence Module
 *
 * Moves the process table across the volatile-state boundary exactly once per
 * cycle: `load` before scheduling, `store` after.
 *
 * # Load
 *
 * - Every record whose class is registered is rehydrated through the registry
 *   and its `resume` hook. A failing `resume` marks that process DEAD.
 * - A factory that panics drops its record and memory, as if the process
 *   had been marked DEAD and reaped. The rest of the table still loads.
 * - Records of unregistered classes are orphaned: kept aside with their
 *   memory and written back unchanged.
 * - DEAD records and their memory are dropped.
 * - Memory blobs without a record are retained as-is.
 *
 * # Store
 *
 * One atomic blob replacement holding every non-DEAD record, every orphan
 * and their memory. DEAD processes are reaped from the table afterwards.
 */

pub mod snapshot;
pub mod store;

pub use snapshot::{StateHeader, StateSnapshot};
pub use store::{DurableStore, FileStore, MemoryStore};

#[cfg(test)]
pub use store::MockDurableStore;

use crate::core::errors::{PersistenceResult, ProcessError};
use crate::core::limits::STATE_FORMAT_VERSION;
use crate::core::types::Pid;
use crate::process::{ProcessInstance, ProcessMemory, ProcessRegistry, ProcessStatus, ProcessTable};
use crate::scheduler::panic_message;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

/// What a load found in the durable store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Rehydrated into the live table, including those whose resume failed
    pub loaded: usize,
    /// Class not registered; preserved untouched
    pub orphaned: Vec<Pid>,
    /// DEAD records discarded together with their memory
    pub dropped: Vec<Pid>,
    /// `resume` failed; marked DEAD
    pub resume_faults: Vec<Pid>,
    /// Factory panicked; record and memory discarded
    pub factory_faults: Vec<Pid>,
    /// Memory blobs with no record; preserved untouched
    pub stray_memory: Vec<Pid>,
}

/// What a store wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreReport {
    pub records: usize,
    pub orphans: usize,
    pub bytes: usize,
    /// DEAD processes removed from the table after the write
    pub reaped: Vec<Pid>,
}

/// Load/store protocol over one [`DurableStore`]
pub struct Persistence {
    store: Box<dyn DurableStore>,
}

impl Persistence {
    pub fn new(store: impl DurableStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    pub fn from_boxed(store: Box<dyn DurableStore>) -> Self {
        Self { store }
    }

    /// Rebuild a process table from the durable store
    ///
    /// An absent blob yields an empty table. Only store I/O and corrupt blobs
    /// are errors; a failed load leaves the store untouched.
    pub fn load(&self, registry: &ProcessRegistry, pid_limit: Pid) -> PersistenceResult<(ProcessTable, LoadReport)> {
        let Some(bytes) = self.store.read()? else {
            info!("no durable state found, starting empty");
            return Ok((ProcessTable::with_pid_limit(pid_limit), LoadReport::default()));
        };

        let StateSnapshot {
            header,
            records,
            mut memory,
        } = StateSnapshot::decode(&bytes)?;

        let mut table = ProcessTable::from_header(header.next_pid, header.cycle, pid_limit);
        let mut report = LoadReport::default();

        for (pid, record) in records {
            let blob = memory.remove(&pid);

            if record.is_dead() {
                debug!(pid, "dropping dead record");
                report.dropped.push(pid);
                continue;
            }

            let mut behavior = match panic::catch_unwind(AssertUnwindSafe(|| registry.instantiate(&record))) {
                Ok(Some(behavior)) => behavior,
                Ok(None) => {
                    warn!(pid, class = %record.class_name, "orphaned process record, class not registered");
                    table.insert_orphan(record);
                    if let Some(blob) = blob {
                        table.retain_memory(pid, blob);
                    }
                    report.orphaned.push(pid);
                    continue;
                }
                Err(payload) => {
                    let fault = ProcessError::RuntimeFault {
                        pid,
                        class: record.class_name.clone(),
                        reason: panic_message(payload.as_ref()),
                    };
                    error!(pid, class = %record.class_name, error = %fault, "process factory failed, record dropped");
                    report.factory_faults.push(pid);
                    continue;
                }
            };

            let mut state = blob.map(ProcessMemory::from_value).unwrap_or_default();
            let fault = match panic::catch_unwind(AssertUnwindSafe(|| behavior.resume(&mut state))) {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(format!("{:#}", e)),
                Err(payload) => Some(panic_message(payload.as_ref())),
            };

            let mut instance = ProcessInstance::new(record, behavior, state);
            if let Some(reason) = fault {
                error!(pid, class = %instance.class_name(), %reason, "process failed to resume");
                instance.record_mut().status = ProcessStatus::Dead;
                report.resume_faults.push(pid);
            }
            table.insert(instance);
            report.loaded += 1;
        }

        for (pid, blob) in memory {
            warn!(pid, "memory blob without a record retained");
            table.retain_memory(pid, blob);
            report.stray_memory.push(pid);
        }

        info!(
            cycle = table.cycle(),
            loaded = report.loaded,
            orphaned = report.orphaned.len(),
            dropped = report.dropped.len(),
            faults = report.resume_faults.len() + report.factory_faults.len(),
            "process table loaded"
        );
        Ok((table, report))
    }

    /// Write `table` atomically, then reap its DEAD processes
    pub fn store(&self, table: &mut ProcessTable) -> PersistenceResult<StoreReport> {
        let snapshot = snapshot_of(table);
        let bytes = snapshot.encode()?;
        self.store.write(&bytes)?;

        let report = StoreReport {
            records: snapshot.records.len() - table.orphan_count(),
            orphans: table.orphan_count(),
            bytes: bytes.len(),
            reaped: table.reap(),
        };

        info!(
            cycle = table.cycle(),
            records = report.records,
            orphans = report.orphans,
            reaped = report.reaped.len(),
            bytes = report.bytes,
            "process table stored"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence").finish_non_exhaustive()
    }
}

/// Durable form of `table`, DEAD processes excluded
pub fn snapshot_of(table: &ProcessTable) -> StateSnapshot {
    let mut snapshot = StateSnapshot {
        header: StateHeader {
            version: STATE_FORMAT_VERSION,
            next_pid: table.next_pid(),
            cycle: table.cycle(),
        },
        ..StateSnapshot::default()
    };

    for instance in table.all().iter().filter(|p| !p.status().is_dead()) {
        snapshot.records.insert(instance.pid(), instance.record().clone());
        if !instance.memory().is_empty() {
            snapshot
                .memory
                .insert(instance.pid(), instance.memory().as_value().clone());
        }
    }

    for orphan in table.orphans() {
        snapshot.records.insert(orphan.pid, orphan.clone());
    }
    for (pid, blob) in table.retained_memory() {
        snapshot.memory.insert(*pid, blob.clone());
    }

    snapshot
}
