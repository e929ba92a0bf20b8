/*!
 * Process Module
 * Process records, the class registry, and the live process table
 */

pub mod context;
pub mod core;
pub mod instance;
pub mod memory;
pub mod registry;
pub mod table;
pub mod traits;
pub mod validation;

// Re-export for convenience
pub use context::RunContext;
pub use self::core::types::{ProcessInfo, ProcessRecord, ProcessStatus};
pub use instance::ProcessInstance;
pub use memory::ProcessMemory;
pub use registry::{register_process_class, ProcessRegistry};
pub use table::ProcessTable;
pub use traits::{Process, ProcessFactory};
