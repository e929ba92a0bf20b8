/*!
 * Shared test fixtures
 */

#![allow(dead_code)]

use cycle_kernel::{
    Cost, Kernel, ManualClock, MemoryStore, Pid, Process, ProcessMemory, ProcessRegistry, RunContext,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Order in which processes were invoked
pub type InvocationLog = Arc<Mutex<Vec<Pid>>>;

/// Charges a fixed cost, counts its runs and logs its PID
pub struct Fixed {
    pub cost: Cost,
    pub log: InvocationLog,
}

impl Process for Fixed {
    fn run(&mut self, ctx: &mut RunContext<'_>, memory: &mut ProcessMemory) -> anyhow::Result<()> {
        ctx.charge(self.cost);
        self.log.lock().push(ctx.pid());
        let runs = memory.get::<u64>("runs").unwrap_or(0);
        memory.set("runs", runs + 1)?;
        Ok(())
    }
}

/// Always returns an error
pub struct Failing;

impl Process for Failing {
    fn run(&mut self, _ctx: &mut RunContext<'_>, _memory: &mut ProcessMemory) -> anyhow::Result<()> {
        anyhow::bail!("invariant violated")
    }
}

/// Always panics
pub struct Panicking;

impl Process for Panicking {
    fn run(&mut self, _ctx: &mut RunContext<'_>, _memory: &mut ProcessMemory) -> anyhow::Result<()> {
        panic!("index out of bounds")
    }
}

/// Marks itself dead on its first run
pub struct OneShot;

impl Process for OneShot {
    fn run(&mut self, ctx: &mut RunContext<'_>, memory: &mut ProcessMemory) -> anyhow::Result<()> {
        memory.set("done", true)?;
        ctx.exit();
        Ok(())
    }
}

/// Spawns one `fixed` child per run
pub struct Spawner;

impl Process for Spawner {
    fn run(&mut self, ctx: &mut RunContext<'_>, memory: &mut ProcessMemory) -> anyhow::Result<()> {
        let child = ctx.spawn("fixed", 1)?;
        memory.set("last_child", child)?;
        Ok(())
    }
}

/// Kills its own children
pub struct Killer;

impl Process for Killer {
    fn run(&mut self, ctx: &mut RunContext<'_>, _memory: &mut ProcessMemory) -> anyhow::Result<()> {
        for child in ctx.children() {
            ctx.kill(child);
        }
        Ok(())
    }
}

/// Registry with every fixture class; `fixed` costs `cost` units per run
pub fn registry(cost: Cost) -> (ProcessRegistry, InvocationLog) {
    let log = InvocationLog::default();
    let registry = ProcessRegistry::new();

    let fixed_log = log.clone();
    registry
        .register("fixed", move |_| -> Box<dyn Process> {
            Box::new(Fixed {
                cost,
                log: fixed_log.clone(),
            })
        })
        .unwrap();
    registry
        .register("failing", |_| -> Box<dyn Process> { Box::new(Failing) })
        .unwrap();
    registry
        .register("panicking", |_| -> Box<dyn Process> { Box::new(Panicking) })
        .unwrap();
    registry
        .register("oneshot", |_| -> Box<dyn Process> { Box::new(OneShot) })
        .unwrap();
    registry
        .register("spawner", |_| -> Box<dyn Process> { Box::new(Spawner) })
        .unwrap();
    registry
        .register("killer", |_| -> Box<dyn Process> { Box::new(Killer) })
        .unwrap();

    (registry, log)
}

/// Kernel over `store` with a manual clock, so cost is only what processes charge
pub fn kernel(registry: ProcessRegistry, store: MemoryStore) -> Kernel {
    Kernel::builder()
        .with_registry(registry)
        .with_store(store)
        .with_clock(Arc::new(ManualClock::new()))
        .build()
}

/// Decoded durable blob
pub fn stored(store: &MemoryStore) -> serde_json::Value {
    serde_json::from_slice(&store.snapshot().expect("store has been written")).unwrap()
}
