/*!
 * Core Types
 * Common types used across the kernel
 */

/// Process ID type
pub type Pid = u32;

/// Priority level (higher runs first, ties broken by ascending PID)
pub type Priority = i32;

/// Scheduling pass counter, persisted in the durable header
pub type Cycle = u64;

/// Abstract compute units (microseconds for the monotonic clock)
pub type Cost = u64;

/// Common result type for kernel operations
pub type KernelResult<T> = Result<T, super::errors::KernelError>;
