/*!
 * Cycle Kernel Library
 * Cooperative, budget-aware process scheduling over a durable process table
 */

pub mod core;
pub mod kernel;
pub mod monitoring;
pub mod persistence;
pub mod process;
pub mod scheduler;

// Re-exports
pub use self::core::{
    Cost, Cycle, InlineString, KernelConfig, KernelError, KernelResult, PersistenceError, PersistenceResult, Pid,
    Priority, ProcessError, ProcessResult,
};
pub use kernel::{Kernel, KernelBuilder};
pub use monitoring::{init_tracing, CycleSpan, KernelMetrics, MetricsSnapshot};
pub use persistence::{
    DurableStore, FileStore, LoadReport, MemoryStore, Persistence, StateHeader, StateSnapshot, StoreReport,
};
pub use process::{
    register_process_class, Process, ProcessFactory, ProcessInfo, ProcessInstance, ProcessMemory, ProcessRecord,
    ProcessRegistry, ProcessStatus, ProcessTable, RunContext,
};
pub use scheduler::{plan, CpuClock, CycleReport, ManualClock, MonotonicClock, Scheduler};
