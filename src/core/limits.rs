/*!
 * System Limits and Constants
 *
 * Centralized location for kernel-wide limits and defaults.
 * Organized by domain for maintainability and discoverability.
 */

use super::types::{Cost, Cycle, Pid};
use std::time::Duration;

// =============================================================================
// PROCESS TABLE
// =============================================================================

/// First PID handed out on an empty table; PID 0 is never assigned
pub const FIRST_PID: Pid = 1;

/// PID counter wraps back to [`FIRST_PID`] after this value
/// Keeps PIDs small enough to stay readable as durable map keys
pub const DEFAULT_PID_LIMIT: Pid = 999_999;

// =============================================================================
// SCHEDULING
// =============================================================================

/// Default compute budget per cycle (20ms of monotonic clock time)
pub const DEFAULT_CYCLE_BUDGET: Cost = 20_000;

/// Cycle number of a store that has never been scheduled
pub const INITIAL_CYCLE: Cycle = 0;

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Durable blob format version written by this build
/// Blobs with a newer version are refused rather than misread
pub const STATE_FORMAT_VERSION: u32 = 1;

/// Default location of the durable state file
pub const DEFAULT_STORAGE_PATH: &str = "/tmp/cycle-kernel/state.json";

// =============================================================================
// DRIVER
// =============================================================================

/// Default interval between host cycles in the driver binary
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_millis(1000);
