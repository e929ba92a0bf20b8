/*!
 * Process Core Types
 * Records, statuses and diagnostics snapshots
 */

pub mod types;

pub use types::*;
