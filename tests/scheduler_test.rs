/*!
 * Scheduler Tests
 * Pass ordering, budget admission, crash isolation and mid-pass table changes
 */

mod common;

use common::{kernel, registry};
use cycle_kernel::{MemoryStore, Pid, Process, ProcessMemory, ProcessStatus, RunContext};
use pretty_assertions::assert_eq;

fn statuses(kernel: &cycle_kernel::Kernel, pids: &[Pid]) -> Vec<ProcessStatus> {
    pids.iter()
        .map(|&pid| kernel.get_process_by_id(pid).unwrap().status())
        .collect()
}

#[test]
fn test_priority_order_with_pid_tiebreak() {
    let (registry, log) = registry(1);
    let mut kernel = kernel(registry, MemoryStore::new());

    for priority in [10, 5, 10, 1] {
        kernel.spawn("fixed", priority, None).unwrap();
    }
    let report = kernel.run_kernel(1_000);

    assert_eq!(*log.lock(), vec![1, 3, 2, 4]);
    assert_eq!(report.invoked, vec![1, 3, 2, 4]);
    assert!(report.suspended.is_empty());
}

#[test]
fn test_budget_admits_floor_of_budget_over_cost() {
    let (registry, log) = registry(3);
    let mut kernel = kernel(registry, MemoryStore::new());

    for _ in 0..7 {
        kernel.spawn("fixed", 1, None).unwrap();
    }
    let report = kernel.run_kernel(10);

    assert_eq!(log.lock().len(), 3);
    assert_eq!(report.invoked, vec![1, 2, 3]);
    assert_eq!(report.suspended, vec![4, 5, 6, 7]);
    assert_eq!(report.spent, 9);
    assert_eq!(
        statuses(&kernel, &[1, 4, 7]),
        vec![ProcessStatus::Running, ProcessStatus::Suspended, ProcessStatus::Suspended]
    );
}

#[test]
fn test_suspended_processes_retried_at_original_priority() {
    let (registry, log) = registry(5);
    let mut kernel = kernel(registry, MemoryStore::new());

    kernel.spawn("fixed", 1, None).unwrap();
    kernel.spawn("fixed", 9, None).unwrap();
    kernel.spawn("fixed", 5, None).unwrap();

    let first = kernel.run_kernel(5);
    assert_eq!(first.invoked, vec![2]);
    assert_eq!(first.suspended, vec![3, 1]);

    log.lock().clear();
    let second = kernel.run_kernel(100);
    assert_eq!(second.invoked, vec![2, 3, 1]);
    assert_eq!(*log.lock(), vec![2, 3, 1]);
    assert_eq!(kernel.get_process_by_id(1).unwrap().priority(), 1);
}

#[test]
fn test_zero_budget_suspends_everything() {
    let (registry, log) = registry(1);
    let mut kernel = kernel(registry, MemoryStore::new());
    kernel.spawn("fixed", 3, None).unwrap();
    kernel.spawn("fixed", 2, None).unwrap();

    let report = kernel.run_kernel(0);

    assert!(log.lock().is_empty());
    assert_eq!(report.suspended, vec![1, 2]);
    assert_eq!(report.spent, 0);
}

struct Heavy;

impl Process for Heavy {
    fn run(&mut self, ctx: &mut RunContext<'_>, _memory: &mut ProcessMemory) -> anyhow::Result<()> {
        ctx.charge(50);
        Ok(())
    }

    fn cost_hint(&self) -> Option<u64> {
        Some(50)
    }
}

#[test]
fn test_cost_hint_skips_expensive_process_but_not_cheaper_ones() {
    let (registry, log) = registry(1);
    registry
        .register("heavy", |_| -> Box<dyn Process> { Box::new(Heavy) })
        .unwrap();
    let mut kernel = kernel(registry, MemoryStore::new());

    let heavy = kernel.spawn("heavy", 10, None).unwrap();
    let light = kernel.spawn("fixed", 1, None).unwrap();
    let report = kernel.run_kernel(40);

    assert_eq!(report.suspended, vec![heavy]);
    assert_eq!(report.invoked, vec![light]);
    assert_eq!(*log.lock(), vec![light]);
}

#[test]
fn test_budget_below_unhinted_cost_runs_only_first_process() {
    let (registry, log) = registry(5);
    let mut kernel = kernel(registry, MemoryStore::new());
    for _ in 0..3 {
        kernel.spawn("fixed", 1, None).unwrap();
    }

    let report = kernel.run_kernel(2);

    assert_eq!(*log.lock(), vec![1]);
    assert_eq!(report.suspended, vec![2, 3]);
    assert_eq!(report.spent, 5);
    assert!(report.over_budget());
}

#[test]
fn test_budget_below_hinted_cost_runs_nothing() {
    let (registry, _log) = registry(1);
    registry
        .register("heavy", |_| -> Box<dyn Process> { Box::new(Heavy) })
        .unwrap();
    let mut kernel = kernel(registry, MemoryStore::new());
    kernel.spawn("heavy", 1, None).unwrap();
    kernel.spawn("heavy", 1, None).unwrap();

    let report = kernel.run_kernel(49);

    assert!(report.invoked.is_empty());
    assert_eq!(report.suspended, vec![1, 2]);
    assert_eq!(report.spent, 0);
}

#[test]
fn test_crash_isolation() {
    let (registry, log) = registry(1);
    let mut kernel = kernel(registry, MemoryStore::new());

    let before = kernel.spawn("fixed", 10, None).unwrap();
    let failing = kernel.spawn("failing", 8, None).unwrap();
    let panicking = kernel.spawn("panicking", 6, None).unwrap();
    let after = kernel.spawn("fixed", 1, None).unwrap();

    let report = kernel.run_kernel(100);

    assert_eq!(report.invoked, vec![before, failing, panicking, after]);
    assert_eq!(report.crashed, vec![failing, panicking]);
    assert_eq!(*log.lock(), vec![before, after]);
    assert_eq!(
        statuses(&kernel, &[before, failing, panicking, after]),
        vec![
            ProcessStatus::Running,
            ProcessStatus::Dead,
            ProcessStatus::Dead,
            ProcessStatus::Running
        ]
    );
    assert_eq!(kernel.metrics().crashes, 2);
}

#[test]
fn test_crashed_process_not_scheduled_again() {
    let (registry, _log) = registry(1);
    let mut kernel = kernel(registry, MemoryStore::new());
    kernel.spawn("failing", 1, None).unwrap();

    kernel.run_kernel(100);
    let second = kernel.run_kernel(100);

    assert!(second.invoked.is_empty());
}

#[test]
fn test_self_exit_is_reported_and_final() {
    let (registry, _log) = registry(1);
    let mut kernel = kernel(registry, MemoryStore::new());
    let pid = kernel.spawn("oneshot", 1, None).unwrap();

    let report = kernel.run_kernel(100);
    assert_eq!(report.exited, vec![pid]);
    assert!(report.crashed.is_empty());
    assert_eq!(kernel.get_process_by_id(pid).unwrap().status(), ProcessStatus::Dead);

    let next = kernel.run_kernel(100);
    assert!(next.invoked.is_empty());
}

#[test]
fn test_spawn_during_pass_waits_for_next_pass() {
    let (registry, log) = registry(1);
    let mut kernel = kernel(registry, MemoryStore::new());
    let spawner = kernel.spawn("spawner", 10, None).unwrap();

    let first = kernel.run_kernel(100);
    assert_eq!(first.invoked, vec![spawner]);
    assert!(log.lock().is_empty());

    let child = kernel.children(spawner)[0];
    let record = kernel.get_process_by_id(child).unwrap();
    assert_eq!(record.status(), ProcessStatus::Pending);
    assert_eq!(record.parent_pid(), Some(spawner));
    assert_eq!(record.created_at(), 1);

    let second = kernel.run_kernel(100);
    assert_eq!(second.invoked, vec![spawner, child]);
    assert_eq!(*log.lock(), vec![child]);
}

#[test]
fn test_killed_during_pass_is_not_invoked() {
    let (registry, log) = registry(1);
    let mut kernel = kernel(registry, MemoryStore::new());
    let killer = kernel.spawn("killer", 10, None).unwrap();
    let victim = kernel.spawn("fixed", 5, Some(killer)).unwrap();

    let report = kernel.run_kernel(100);

    assert_eq!(report.invoked, vec![killer]);
    assert!(log.lock().is_empty());
    assert_eq!(kernel.get_process_by_id(victim).unwrap().status(), ProcessStatus::Dead);
}

#[test]
fn test_priority_change_applies_next_pass() {
    let (registry, log) = registry(1);
    let mut kernel = kernel(registry, MemoryStore::new());
    let low = kernel.spawn("fixed", 1, None).unwrap();
    let high = kernel.spawn("fixed", 2, None).unwrap();

    kernel.run_kernel(100);
    kernel.set_priority(low, 5).unwrap();
    kernel.run_kernel(100);

    assert_eq!(*log.lock(), vec![high, low, low, high]);
}
