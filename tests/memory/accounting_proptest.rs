/*!
 * Accounting Property Tests
 * Statistics agree with the live records under arbitrary operation sequences
 */

use proptest::prelude::*;
use sandbox_os_kernel::memory::MemoryManager;
use sandbox_os_kernel::Owner;

const BUDGET: usize = 4096;

#[derive(Debug, Clone)]
enum Op {
    Allocate { owner: u8, size: usize },
    Free { owner: u8, handle: usize },
    Resize { owner: u8, handle: usize, size: usize },
    FreeOwner { owner: u8 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..3, 0usize..1500).prop_map(|(owner, size)| Op::Allocate { owner, size }),
        (0u8..3, 0usize..40).prop_map(|(owner, handle)| Op::Free { owner, handle }),
        (0u8..3, 0usize..40, 0usize..1500)
            .prop_map(|(owner, handle, size)| Op::Resize { owner, handle, size }),
        (0u8..3).prop_map(|owner| Op::FreeOwner { owner }),
    ]
}

fn owner(id: u8) -> Owner {
    Owner::for_process(1000 + id as u32)
}

proptest! {
    #[test]
    fn stats_match_live_records(ops in proptest::collection::vec(op(), 1..120)) {
        let mut mm = MemoryManager::with_capacity(BUDGET);

        for op in ops {
            let before = mm.used();
            let result = match op {
                Op::Allocate { owner: o, size } => mm.allocate(&owner(o), size).map(|_| ()),
                Op::Free { owner: o, handle } => mm.free(&owner(o), handle),
                Op::Resize { owner: o, handle, size } => {
                    mm.resize(&owner(o), handle, size).map(|_| ())
                }
                Op::FreeOwner { owner: o } => {
                    mm.free_owner(&owner(o));
                    Ok(())
                }
            };

            // Failed operations never change accounting
            if let Err(e) = &result {
                prop_assert_eq!(mm.used(), before, "{} changed accounting", e);
            }

            let stats = mm.stats();
            let live: Vec<usize> = (0..stats.slots_created)
                .filter_map(|h| mm.record(h).map(|r| r.size))
                .collect();

            prop_assert_eq!(stats.bytes_used, live.iter().sum::<usize>());
            prop_assert!(stats.bytes_used <= BUDGET);
            prop_assert_eq!(stats.bytes_used + stats.bytes_left, BUDGET);
            prop_assert_eq!(stats.pool_used, live.len());
            prop_assert_eq!(stats.pool_used + stats.pool_left, mm.pool_capacity());
        }
    }
}
