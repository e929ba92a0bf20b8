/*!
 * Kernel Configuration
 * Environment-driven settings for the kernel and its driver loop
 */

use super::data_structures::InlineString;
use super::errors::KernelError;
use super::limits::{
    DEFAULT_CYCLE_BUDGET, DEFAULT_CYCLE_INTERVAL, DEFAULT_PID_LIMIT, DEFAULT_STORAGE_PATH,
    FIRST_PID,
};
use super::types::{Cost, KernelResult, Pid};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Per-cycle compute budget
pub const ENV_CYCLE_BUDGET: &str = "KERNEL_CYCLE_BUDGET";
/// Location of the durable state file
pub const ENV_STORAGE_PATH: &str = "KERNEL_STORAGE_PATH";
/// PID counter wrap point
pub const ENV_PID_LIMIT: &str = "KERNEL_PID_LIMIT";
/// Driver tick interval in milliseconds
pub const ENV_CYCLE_INTERVAL_MS: &str = "KERNEL_CYCLE_INTERVAL_MS";
/// Driver stops after this many cycles
pub const ENV_MAX_CYCLES: &str = "KERNEL_MAX_CYCLES";

/// Kernel configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelConfig {
    pub cycle_budget: Cost,
    pub storage_path: PathBuf,
    pub pid_limit: Pid,
    pub cycle_interval: Duration,
    pub max_cycles: Option<u64>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            cycle_budget: DEFAULT_CYCLE_BUDGET,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            pid_limit: DEFAULT_PID_LIMIT,
            cycle_interval: DEFAULT_CYCLE_INTERVAL,
            max_cycles: None,
        }
    }
}

impl KernelConfig {
    /// Read configuration from `KERNEL_*` environment variables
    pub fn from_env() -> KernelResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unset keys keep their defaults; set but malformed keys are errors.
    pub fn from_lookup<F>(lookup: F) -> KernelResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(budget) = parse_var::<Cost>(&lookup, ENV_CYCLE_BUDGET)? {
            config.cycle_budget = budget;
        }
        if let Some(path) = lookup(ENV_STORAGE_PATH).filter(|p| !p.trim().is_empty()) {
            config.storage_path = PathBuf::from(path);
        }
        if let Some(limit) = parse_var::<Pid>(&lookup, ENV_PID_LIMIT)? {
            config.pid_limit = limit;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, ENV_CYCLE_INTERVAL_MS)? {
            config.cycle_interval = Duration::from_millis(ms);
        }
        config.max_cycles = parse_var::<u64>(&lookup, ENV_MAX_CYCLES)?;

        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_cycle_budget(mut self, budget: Cost) -> Self {
        self.cycle_budget = budget;
        self
    }

    #[must_use]
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    #[must_use]
    pub fn with_pid_limit(mut self, limit: Pid) -> Self {
        self.pid_limit = limit;
        self
    }

    #[must_use]
    pub fn with_cycle_interval(mut self, interval: Duration) -> Self {
        self.cycle_interval = interval;
        self
    }

    #[must_use]
    pub fn with_max_cycles(mut self, max_cycles: u64) -> Self {
        self.max_cycles = Some(max_cycles);
        self
    }

    /// Reject settings the kernel cannot run with
    pub fn validate(&self) -> KernelResult<()> {
        if self.pid_limit < FIRST_PID {
            return Err(configuration(format!(
                "{} must be at least {}",
                ENV_PID_LIMIT, FIRST_PID
            )));
        }
        if self.cycle_interval.is_zero() {
            return Err(configuration(format!("{} must be non-zero", ENV_CYCLE_INTERVAL_MS)));
        }
        Ok(())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> KernelResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| configuration(format!("{}={:?}: {}", key, raw, e))),
    }
}

fn configuration(message: String) -> KernelError {
    KernelError::Configuration(InlineString::from(message))
}
