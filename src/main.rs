/*!
 * Cycle Kernel - Driver
 *
 * Hosts the kernel the way a cycle-metered runtime would:
 * - One load → run → store cycle per tick
 * - Durable state in a file that survives restarts
 * - Stops on Ctrl+C or after KERNEL_MAX_CYCLES cycles
 */

mod demo;

use anyhow::Context;
use cycle_kernel::{init_tracing, FileStore, Kernel, KernelConfig, ProcessRegistry};
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = KernelConfig::from_env().context("reading kernel configuration")?;
    info!(
        storage = %config.storage_path.display(),
        budget = config.cycle_budget,
        interval_ms = config.cycle_interval.as_millis() as u64,
        max_cycles = ?config.max_cycles,
        "cycle kernel starting"
    );

    let registry = ProcessRegistry::global().clone();
    demo::register_demo_classes(&registry).context("registering demo process classes")?;

    let mut kernel = Kernel::builder()
        .with_config(config.clone())
        .with_registry(registry)
        .with_store(FileStore::new(&config.storage_path))
        .build();

    kernel.load_process_table().context("loading durable state")?;
    if kernel.table().is_empty() && kernel.table().orphan_count() == 0 {
        let pid = kernel.spawn(demo::INIT_CLASS, demo::INIT_PRIORITY, None)?;
        kernel.store_process_table().context("seeding init process")?;
        info!(pid, "seeded init process");
    }

    let mut ticker = tokio::time::interval(config.cycle_interval);
    let mut completed: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match kernel.run_cycle(config.cycle_budget) {
                    Ok(report) => {
                        completed += 1;
                        if report.cycle % 10 == 0 {
                            info!(
                                cycle = report.cycle,
                                processes = kernel.table().len(),
                                orphans = kernel.table().orphan_count(),
                                "process table"
                            );
                        }
                    }
                    Err(e) => error!(error = %e, "cycle failed, durable state left as it was"),
                }
                if config.max_cycles.is_some_and(|max| completed >= max) {
                    info!(completed, "cycle limit reached");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
        }
    }

    let metrics = kernel.metrics();
    info!(
        cycles = metrics.cycles,
        invocations = metrics.invocations,
        suspensions = metrics.suspensions,
        crashes = metrics.crashes,
        mean_spent = metrics.mean_spent(),
        "cycle kernel stopped"
    );
    Ok(())
}
