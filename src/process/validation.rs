/*!
 * Process Validation
 * Lifecycle transition rules and class name checks
 */

use super::core::types::ProcessStatus;
use crate::core::errors::{ProcessError, ProcessResult};
use crate::core::types::Pid;

impl ProcessStatus {
    /// Whether `self -> to` is a legal lifecycle transition
    ///
    /// Any eligible status may move to RUNNING, SUSPENDED or DEAD; PENDING is
    /// only ever an initial state and DEAD is terminal.
    #[must_use]
    pub const fn can_transition_to(self, to: ProcessStatus) -> bool {
        match (self, to) {
            (ProcessStatus::Dead, _) => false,
            (_, ProcessStatus::Pending) => false,
            _ => true,
        }
    }
}

/// Validate a status change for `pid`
pub(crate) fn validate_transition(
    pid: Pid,
    from: ProcessStatus,
    to: ProcessStatus,
) -> ProcessResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(ProcessError::InvalidTransition { pid, from, to })
    }
}

/// Validate a process class name before it is bound in the registry
///
/// Names are durable identifiers, so they must be non-empty and free of
/// whitespace and control characters.
pub(crate) fn validate_class_name(name: &str) -> ProcessResult<()> {
    if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ProcessError::InvalidClassName(name.into()));
    }
    Ok(())
}
