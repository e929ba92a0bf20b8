/*!
 * Demo Process Classes
 * A small process tree for the driver binary
 *
 * - `init` keeps one `heartbeat` alive and a pool of `worker` children topped up
 * - `heartbeat` counts cycles
 * - `worker` does a few rounds of busy work and exits
 */

use cycle_kernel::{Process, ProcessMemory, ProcessRegistry, ProcessResult, RunContext};
use tracing::{debug, info};

pub const INIT_CLASS: &str = "init";
pub const HEARTBEAT_CLASS: &str = "heartbeat";
pub const WORKER_CLASS: &str = "worker";

pub const INIT_PRIORITY: i32 = 100;
const HEARTBEAT_PRIORITY: i32 = 50;
const WORKER_PRIORITY: i32 = 10;
const WORKER_POOL: usize = 3;
const WORKER_ROUNDS: u64 = 4;

/// Bind every demo class in `registry`
pub fn register_demo_classes(registry: &ProcessRegistry) -> ProcessResult<()> {
    registry.register_default::<Init>(INIT_CLASS)?;
    registry.register_default::<Heartbeat>(HEARTBEAT_CLASS)?;
    registry.register_default::<Worker>(WORKER_CLASS)?;
    Ok(())
}

#[derive(Default)]
struct Init;

impl Process for Init {
    fn run(&mut self, ctx: &mut RunContext<'_>, memory: &mut ProcessMemory) -> anyhow::Result<()> {
        let heartbeat_alive = memory
            .get::<u32>("heartbeat")
            .and_then(|pid| ctx.get(pid))
            .is_some_and(|p| !p.status().is_dead());
        if !heartbeat_alive {
            let pid = ctx.spawn(HEARTBEAT_CLASS, HEARTBEAT_PRIORITY)?;
            memory.set("heartbeat", pid)?;
        }

        let workers = ctx
            .children()
            .into_iter()
            .filter_map(|pid| ctx.get(pid))
            .filter(|p| p.class_name() == WORKER_CLASS && !p.status().is_dead())
            .count();
        for _ in workers..WORKER_POOL {
            let pid = ctx.spawn(WORKER_CLASS, WORKER_PRIORITY)?;
            debug!(pid, "worker started");
        }

        let generation = memory.get::<u64>("generation").unwrap_or(0);
        memory.set("generation", generation + 1)?;
        Ok(())
    }

    fn cost_hint(&self) -> Option<u64> {
        Some(50)
    }
}

#[derive(Default)]
struct Heartbeat;

impl Process for Heartbeat {
    fn run(&mut self, ctx: &mut RunContext<'_>, memory: &mut ProcessMemory) -> anyhow::Result<()> {
        let beats = memory.get::<u64>("beats").unwrap_or(0) + 1;
        memory.set("beats", beats)?;
        if beats % 10 == 0 {
            info!(pid = ctx.pid(), beats, "heartbeat");
        }
        Ok(())
    }
}

#[derive(Default)]
struct Worker {
    scratch: u64,
}

impl Process for Worker {
    fn run(&mut self, ctx: &mut RunContext<'_>, memory: &mut ProcessMemory) -> anyhow::Result<()> {
        let rounds = memory.get::<u64>("rounds").unwrap_or(0) + 1;
        memory.set("rounds", rounds)?;

        self.scratch = (0..10_000u64).fold(self.scratch, |acc, n| acc.wrapping_mul(31).wrapping_add(n));
        memory.set("digest", self.scratch)?;

        if rounds >= WORKER_ROUNDS {
            debug!(pid = ctx.pid(), rounds, "worker finished");
            ctx.exit();
        }
        Ok(())
    }

    fn resume(&mut self, memory: &mut ProcessMemory) -> anyhow::Result<()> {
        self.scratch = memory.get::<u64>("digest").unwrap_or(0);
        Ok(())
    }
}
