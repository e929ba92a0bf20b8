/*!
 * Kernel
 * Facade tying the registry, table, scheduler and durable store together
 *
 * A host drives one cycle per invocation:
 *
 * ```text
 * load_process_table() -> run_kernel(budget) -> store_process_table()
 * ```
 *
 * or calls [`Kernel::run_cycle`] to do all three.
 */

use crate::core::config::KernelConfig;
use crate::core::errors::ProcessResult;
use crate::core::types::{Cost, Cycle, KernelResult, Pid, Priority};
use crate::monitoring::{CycleSpan, KernelMetrics, MetricsSnapshot};
use crate::persistence::{DurableStore, FileStore, LoadReport, Persistence, StoreReport};
use crate::process::{Process, ProcessInfo, ProcessInstance, ProcessRecord, ProcessRegistry, ProcessTable};
use crate::scheduler::{CpuClock, CycleReport, MonotonicClock, Scheduler};
use std::sync::Arc;
use tracing::info;

/// Builder for [`Kernel`]
pub struct KernelBuilder {
    config: KernelConfig,
    registry: Option<ProcessRegistry>,
    store: Option<Box<dyn DurableStore>>,
    clock: Option<Arc<dyn CpuClock>>,
}

impl KernelBuilder {
    pub fn new() -> Self {
        Self {
            config: KernelConfig::default(),
            registry: None,
            store: None,
            clock: None,
        }
    }

    pub fn with_config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a private registry instead of the process-wide one
    pub fn with_registry(mut self, registry: ProcessRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Use `store` instead of a [`FileStore`] at the configured path
    pub fn with_store(mut self, store: impl DurableStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Measure process cost with `clock` instead of wall time
    pub fn with_clock(mut self, clock: Arc<dyn CpuClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Kernel {
        let registry = self
            .registry
            .unwrap_or_else(|| ProcessRegistry::global().clone());
        let store = self
            .store
            .unwrap_or_else(|| Box::new(FileStore::new(self.config.storage_path.clone())));
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));

        info!(
            budget = self.config.cycle_budget,
            pid_limit = self.config.pid_limit,
            classes = registry.len(),
            "kernel initialized"
        );

        Kernel {
            table: ProcessTable::with_pid_limit(self.config.pid_limit),
            registry,
            persistence: Persistence::from_boxed(store),
            scheduler: Scheduler::new(clock),
            metrics: KernelMetrics::new(),
            config: self.config,
        }
    }
}

impl Default for KernelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Cooperative process scheduling kernel
pub struct Kernel {
    registry: ProcessRegistry,
    persistence: Persistence,
    scheduler: Scheduler,
    table: ProcessTable,
    metrics: KernelMetrics,
    config: KernelConfig,
}

impl Kernel {
    pub fn builder() -> KernelBuilder {
        KernelBuilder::new()
    }

    /// Kernel over `store` with the process-wide registry and default config
    pub fn new(store: impl DurableStore + 'static) -> Self {
        KernelBuilder::new().with_store(store).build()
    }

    // ------------------------------------------------------------------
    // Cycle
    // ------------------------------------------------------------------

    /// Replace the live table with the durable one
    pub fn load_process_table(&mut self) -> KernelResult<LoadReport> {
        let (table, report) = self.persistence.load(&self.registry, self.config.pid_limit)?;
        self.table = table;
        Ok(report)
    }

    /// Run one scheduling pass against `budget`
    ///
    /// Advances the cycle counter first. Never fails: suspensions and runtime
    /// faults are part of the returned report.
    pub fn run_kernel(&mut self, budget: Cost) -> CycleReport {
        let cycle = self.table.advance_cycle();
        let span = CycleSpan::new(cycle, budget);

        let report = {
            let _entered = span.enter();
            self.scheduler.run_pass(&mut self.table, &self.registry, budget)
        };

        span.record_report(&report);
        self.metrics.record_cycle(&report);
        report
    }

    /// Write the live table and reap DEAD processes
    pub fn store_process_table(&mut self) -> KernelResult<StoreReport> {
        Ok(self.persistence.store(&mut self.table)?)
    }

    /// Load, run one pass, store
    pub fn run_cycle(&mut self, budget: Cost) -> KernelResult<CycleReport> {
        self.load_process_table()?;
        let report = self.run_kernel(budget);
        self.store_process_table()?;
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Processes
    // ------------------------------------------------------------------

    pub fn register_process_class<F>(&self, name: &str, factory: F) -> ProcessResult<()>
    where
        F: Fn(&ProcessRecord) -> Box<dyn Process> + Send + Sync + 'static,
    {
        self.registry.register(name, factory)
    }

    /// Create a PENDING process; it first runs on the next pass
    pub fn spawn(&mut self, class_name: &str, priority: Priority, parent_pid: Option<Pid>) -> ProcessResult<Pid> {
        self.table
            .spawn(&self.registry, class_name, priority, parent_pid)
    }

    pub fn get_process_by_id(&self, pid: Pid) -> Option<&ProcessInstance> {
        self.table.get(pid)
    }

    pub fn children(&self, pid: Pid) -> Vec<Pid> {
        self.table.children(pid)
    }

    pub fn kill(&mut self, pid: Pid) -> bool {
        self.table.mark_dead(pid)
    }

    pub fn kill_tree(&mut self, pid: Pid) -> usize {
        self.table.kill_tree(pid)
    }

    pub fn set_priority(&mut self, pid: Pid, priority: Priority) -> ProcessResult<()> {
        self.table.set_priority(pid, priority)
    }

    pub fn ps(&self) -> Vec<ProcessInfo> {
        self.table.ps()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn table(&self) -> &ProcessTable {
        &self.table
    }

    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn cycle(&self) -> Cycle {
        self.table.cycle()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("table", &self.table)
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
