/*!
 * Property Tests
 * PID uniqueness, pass ordering and budget admission over generated inputs
 */

mod common;

use cycle_kernel::scheduler::{plan, Admission, PlanEntry};
use cycle_kernel::{MemoryStore, Persistence, Pid, Priority, ProcessTable};
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Op {
    Spawn(Priority),
    Kill(usize),
    Reap,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (-5i32..5).prop_map(Op::Spawn),
        2 => any::<usize>().prop_map(Op::Kill),
        1 => Just(Op::Reap),
    ]
}

proptest! {
    #[test]
    fn prop_live_pids_unique_under_wraparound(ops in prop::collection::vec(op(), 1..200), limit in 2u32..16) {
        let (registry, _log) = common::registry(1);
        let persistence = Persistence::new(MemoryStore::new());
        let mut table = ProcessTable::with_pid_limit(limit);

        for op in ops {
            match op {
                Op::Spawn(priority) => {
                    if let Ok(pid) = table.spawn(&registry, "fixed", priority, None) {
                        prop_assert!(pid >= 1 && pid <= limit);
                    }
                }
                Op::Kill(index) => {
                    if !table.is_empty() {
                        let pid = table.all()[index % table.len()].pid();
                        table.mark_dead(pid);
                    }
                }
                Op::Reap => {
                    persistence.store(&mut table).unwrap();
                }
            }

            let pids: Vec<Pid> = table.all().iter().map(|p| p.pid()).collect();
            let unique: HashSet<Pid> = pids.iter().copied().collect();
            prop_assert_eq!(unique.len(), pids.len());
        }
    }

    #[test]
    fn prop_plan_is_sorted_permutation(priorities in prop::collection::vec(any::<i32>(), 0..64)) {
        let entries: Vec<PlanEntry> = priorities
            .iter()
            .enumerate()
            .map(|(i, &priority)| PlanEntry { pid: i as Pid + 1, priority })
            .collect();
        let order = plan(entries.clone());

        prop_assert_eq!(order.len(), entries.len());
        let seen: HashSet<Pid> = order.iter().copied().collect();
        prop_assert_eq!(seen.len(), entries.len());

        for pair in order.windows(2) {
            let (a, b) = (&entries[pair[0] as usize - 1], &entries[pair[1] as usize - 1]);
            prop_assert!(a.priority > b.priority || (a.priority == b.priority && a.pid < b.pid));
        }
    }

    #[test]
    fn prop_fixed_cost_admits_floor(n in 1usize..40, cost in 1u64..50, extra in 0u64..500) {
        let budget = cost + extra;
        let mut admission = Admission::new(budget);
        let mut admitted = 0u64;
        for _ in 0..n {
            if admission.admits(None) {
                admission.record(cost);
                admitted += 1;
            }
        }
        prop_assert_eq!(admitted, (budget / cost).min(n as u64));
        prop_assert!(admission.spent() <= budget);
    }

    #[test]
    fn prop_hinted_cost_admits_floor_for_any_budget(n in 1usize..40, cost in 1u64..50, budget in 0u64..500) {
        let mut admission = Admission::new(budget);
        let mut admitted = 0u64;
        for _ in 0..n {
            if admission.admits(Some(cost)) {
                admission.record(cost);
                admitted += 1;
            }
        }
        prop_assert_eq!(admitted, (budget / cost).min(n as u64));
        prop_assert!(admission.spent() <= budget);
    }

    #[test]
    fn prop_unhinted_cost_above_budget_runs_exactly_one(n in 1usize..40, budget in 1u64..50, over in 1u64..100) {
        let cost = budget + over;
        let mut admission = Admission::new(budget);
        let mut admitted = 0u64;
        for _ in 0..n {
            if admission.admits(None) {
                admission.record(cost);
                admitted += 1;
            }
        }
        prop_assert_eq!(admitted, 1);
    }
}
