/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use crate::core::data_structures::InlineString;
use crate::core::serialization::JsonError;
use crate::core::types::Pid;
use crate::process::ProcessStatus;
use miette::Diagnostic;
use thiserror::Error;

/// Process operation result
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Persistence operation result
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Process-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ProcessError {
    #[error("Unknown process class: {0}")]
    #[diagnostic(
        code(process::unknown_class),
        help("Register the class with register_process_class before spawning it.")
    )]
    UnknownClass(InlineString),

    #[error("Invalid process class name: {0:?}")]
    #[diagnostic(
        code(process::invalid_class_name),
        help("Class names are durable identifiers: non-empty, no whitespace or control characters.")
    )]
    InvalidClassName(InlineString),

    #[error("Process class already registered: {0}")]
    #[diagnostic(
        code(process::duplicate_class),
        help("Each class name binds exactly one factory. The first registration is kept.")
    )]
    DuplicateClass(InlineString),

    #[error("Process {0} not found")]
    #[diagnostic(
        code(process::not_found),
        help("The process may have been reaped or never existed. Check PID validity.")
    )]
    NotFound(Pid),

    #[error("No free PID below limit {limit}")]
    #[diagnostic(
        code(process::pid_space_exhausted),
        help("Every PID up to the limit is held by a live, orphaned or unreaped record.")
    )]
    PidSpaceExhausted { limit: Pid },

    #[error("Invalid state transition for process {pid}: {from:?} -> {to:?}")]
    #[diagnostic(code(process::invalid_transition))]
    InvalidTransition {
        pid: Pid,
        from: ProcessStatus,
        to: ProcessStatus,
    },

    #[error("Process {pid} ({class}) faulted: {reason}")]
    #[diagnostic(
        code(process::runtime_fault),
        help("The process was quarantined as DEAD. Re-spawn it if it should keep running.")
    )]
    RuntimeFault {
        pid: Pid,
        class: InlineString,
        reason: String,
    },
}

/// Durable store errors
#[derive(Error, Debug, Diagnostic)]
pub enum PersistenceError {
    #[error("I/O error on durable store: {context}")]
    #[diagnostic(
        code(persistence::io),
        help("Check that the storage path exists and is writable.")
    )]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Durable state codec failed: {0}")]
    #[diagnostic(
        code(persistence::codec),
        help("The durable blob is corrupt or unencodable. A failed load never overwrites it.")
    )]
    Json(#[from] JsonError),

    #[error("Invalid PID key in durable state: {0:?}")]
    #[diagnostic(
        code(persistence::invalid_pid_key),
        help("PID keys must be canonical decimal integers without sign or leading zeros.")
    )]
    InvalidPidKey(String),

    #[error("Unsupported durable state version {found} (this build writes {supported})")]
    #[diagnostic(code(persistence::unsupported_version))]
    UnsupportedVersion { found: u32, supported: u32 },
}

impl PersistenceError {
    pub(crate) fn io(source: std::io::Error, context: impl Into<String>) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Unified kernel error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum KernelError {
    #[error("Process error: {0}")]
    #[diagnostic(transparent)]
    Process(#[from] ProcessError),

    #[error("Persistence error: {0}")]
    #[diagnostic(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(kernel::configuration_error),
        help("Invalid configuration. Review the KERNEL_* environment variables.")
    )]
    Configuration(InlineString),
}

impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        PersistenceError::io(err, "durable store")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_class_message() {
        let err = ProcessError::UnknownClass("miner".into());
        assert_eq!(err.to_string(), "Unknown process class: miner");
    }

    #[test]
    fn test_kernel_error_wraps_process_error() {
        let err: KernelError = ProcessError::NotFound(7).into();
        assert!(matches!(err, KernelError::Process(ProcessError::NotFound(7))));
        assert_eq!(err.to_string(), "Process error: Process 7 not found");
    }
}
