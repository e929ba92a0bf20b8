/*!
 * Process Types
 * The persisted process record and its lifecycle status
 */

use crate::core::data_structures::InlineString;
use crate::core::types::{Cost, Cycle, Pid, Priority};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Process lifecycle status
///
/// `PENDING → RUNNING → {RUNNING, SUSPENDED, DEAD}`, `SUSPENDED → RUNNING` on a
/// later cycle, `DEAD` terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStatus {
    /// Created this cycle, not yet run
    Pending,
    /// Eligible and scheduled
    Running,
    /// Eligible but skipped this cycle because the budget ran out
    Suspended,
    /// Marked for removal at the next store
    Dead,
}

impl ProcessStatus {
    /// Whether the scheduler considers a process with this status
    #[inline(always)]
    #[must_use]
    pub const fn is_eligible(self) -> bool {
        !matches!(self, ProcessStatus::Dead)
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_dead(self) -> bool {
        matches!(self, ProcessStatus::Dead)
    }
}

/// Inert, persisted representation of a process
///
/// This is the only form that survives a state reset; everything a live
/// instance holds is rebuilt from it plus the process memory blob. Root
/// processes write `"parentPid": null`; a missing field reads as no parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    /// Stored as the map key, never inside the record body
    #[serde(skip)]
    pub pid: Pid,
    pub parent_pid: Option<Pid>,
    pub class_name: InlineString,
    pub status: ProcessStatus,
    pub priority: Priority,
    pub created_at: Cycle,
}

impl ProcessRecord {
    #[inline]
    #[must_use]
    pub fn new(
        pid: Pid,
        class_name: impl Into<InlineString>,
        priority: Priority,
        parent_pid: Option<Pid>,
        created_at: Cycle,
    ) -> Self {
        Self {
            pid,
            parent_pid,
            class_name: class_name.into(),
            status: ProcessStatus::Pending,
            priority,
            created_at,
        }
    }

    #[must_use]
    pub fn with_pid(mut self, pid: Pid) -> Self {
        self.pid = pid;
        self
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.status.is_dead()
    }
}

/// Diagnostic snapshot of one live process
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessInfo {
    pub pid: Pid,
    pub parent_pid: Option<Pid>,
    pub class_name: InlineString,
    pub status: ProcessStatus,
    pub priority: Priority,
    pub created_at: Cycle,
    /// Cost of the most recent invocation, if it ran since load
    pub last_cost: Option<Cost>,
}
