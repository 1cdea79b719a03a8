/*!
 * Memory Manager Tests
 * Budget accounting, tombstones, ownership and pool exhaustion
 */

use pretty_assertions::assert_eq;
use sandbox_os_kernel::core::limits::ALLOC_POOL_MAX;
use sandbox_os_kernel::memory::{MemoryError, MemoryManager, MemoryPressure};
use sandbox_os_kernel::Owner;

fn owner(name: &str) -> Owner {
    Owner::from(name)
}

#[test]
fn test_budget_accounting_through_resize() {
    let mut mm = MemoryManager::with_capacity(1000);
    let p1 = owner("p1");

    let h0 = mm.allocate(&p1, 600).expect("first allocation fits");
    assert_eq!(h0, 0);

    assert_eq!(
        mm.allocate(&p1, 500),
        Err(MemoryError::OutOfMemory {
            requested: 500,
            available: 400,
            used: 600,
            total: 1000,
        })
    );

    assert_eq!(mm.resize(&p1, h0, 300), Ok(h0));
    let h1 = mm.allocate(&p1, 500).expect("fits after shrink");
    assert_eq!(h1, 1);

    let stats = mm.stats();
    assert_eq!(stats.bytes_used, 800);
    assert_eq!(stats.bytes_left, 200);
    assert_eq!(stats.pool_used, 2);
    assert_eq!(stats.slots_created, 2);
}

#[test]
fn test_free_leaves_tombstone() {
    let mut mm = MemoryManager::with_capacity(1000);
    let p1 = owner("p1");
    let p2 = owner("p2");

    let h0 = mm.allocate(&p1, 100).unwrap();
    let h1 = mm.allocate(&p2, 200).unwrap();

    mm.free(&p1, h0).unwrap();
    assert_eq!(mm.free(&p2, h0), Err(MemoryError::RecordNotFound(h0)));
    assert_eq!(mm.free(&p1, h0), Err(MemoryError::RecordNotFound(h0)));

    // Handles keep counting past the tombstone
    let h2 = mm.allocate(&p1, 50).unwrap();
    assert_eq!(h2, 2);
    assert!(!mm.is_valid(h0));
    assert!(mm.is_valid(h1));

    let stats = mm.stats();
    assert_eq!(stats.bytes_used, 250);
    assert_eq!(stats.pool_used, 2);
    assert_eq!(stats.slots_created, 3);
}

#[test]
fn test_foreign_owner_cannot_touch_record() {
    let mut mm = MemoryManager::with_capacity(1000);
    let p1 = owner("p1");
    let intruder = owner("p2");
    let h = mm.allocate(&p1, 128).unwrap();

    let denied = MemoryError::AuthorizationError {
        handle: h,
        requester: intruder.clone(),
    };
    assert_eq!(mm.free(&intruder, h), Err(denied.clone()));
    assert_eq!(mm.resize(&intruder, h, 64), Err(denied));

    let record = mm.record(h).expect("record survives");
    assert_eq!(record.owner, p1);
    assert_eq!(record.size, 128);
    assert_eq!(mm.used(), 128);
}

#[test]
fn test_handle_checks_run_in_order() {
    let mut mm = MemoryManager::with_capacity(1000);
    let p1 = owner("p1");
    let h = mm.allocate(&p1, 10).unwrap();

    assert_eq!(
        mm.free(&p1, 5),
        Err(MemoryError::InvalidHandle { handle: 5, slots: 1 })
    );

    mm.free(&p1, h).unwrap();
    // A tombstone reports not-found even to a stranger
    assert_eq!(mm.resize(&owner("p2"), h, 20), Err(MemoryError::RecordNotFound(h)));
}

#[test]
fn test_resize_to_same_size_is_noop() {
    let mut mm = MemoryManager::with_capacity(1000);
    let p1 = owner("p1");
    let h = mm.allocate(&p1, 300).unwrap();

    assert_eq!(
        mm.resize(&p1, h, 300),
        Err(MemoryError::NoOp { handle: h, size: 300 })
    );
    assert_eq!(mm.used(), 300);
}

#[test]
fn test_grow_checks_delta_only() {
    let mut mm = MemoryManager::with_capacity(1000);
    let p1 = owner("p1");
    let h = mm.allocate(&p1, 600).unwrap();

    // 400 free; growing by exactly 400 fits
    assert_eq!(mm.resize(&p1, h, 1000), Ok(h));
    assert_eq!(mm.remaining(), 0);

    mm.resize(&p1, h, 500).unwrap();
    assert!(matches!(
        mm.resize(&p1, h, 1001),
        Err(MemoryError::OutOfMemory { requested: 501, .. })
    ));
    assert_eq!(mm.used(), 500);
}

#[test]
fn test_pool_full_at_capacity() {
    let mut mm = MemoryManager::with_capacity(10_000);
    let p1 = owner("p1");

    for expected in 0..ALLOC_POOL_MAX {
        let h = mm.allocate(&p1, 1).unwrap();
        assert_eq!(h, expected);
        mm.free(&p1, h).unwrap();
    }

    // Every slot is a tombstone, yet none can be reused
    assert_eq!(mm.stats().pool_used, 0);
    assert_eq!(
        mm.allocate(&p1, 1),
        Err(MemoryError::PoolFull {
            capacity: ALLOC_POOL_MAX
        })
    );
    assert_eq!(mm.slots_created(), ALLOC_POOL_MAX);
}

#[test]
fn test_zero_sized_allocation_takes_a_slot() {
    let mut mm = MemoryManager::with_capacity(0);
    let p1 = owner("p1");

    let h = mm.allocate(&p1, 0).unwrap();
    assert_eq!(mm.stats().pool_used, 1);
    assert!(matches!(
        mm.allocate(&p1, 1),
        Err(MemoryError::OutOfMemory { .. })
    ));
    mm.free(&p1, h).unwrap();
}

#[test]
fn test_free_owner_releases_only_that_owner() {
    let mut mm = MemoryManager::with_capacity(1000);
    let a = owner("proc:1000");
    let b = owner("proc:1001");

    mm.allocate(&a, 100).unwrap();
    let kept = mm.allocate(&b, 200).unwrap();
    mm.allocate(&a, 300).unwrap();

    assert_eq!(mm.free_owner(&a), 400);
    assert_eq!(mm.free_owner(&a), 0);
    assert_eq!(mm.used(), 200);
    assert_eq!(mm.allocations_of(&b).len(), 1);
    assert_eq!(mm.allocations_of(&b)[0].0, kept);
}

#[test]
fn test_pressure_follows_usage() {
    let mut mm = MemoryManager::with_capacity(100);
    let p1 = owner("p1");
    let h = mm.allocate(&p1, 10).unwrap();
    assert_eq!(mm.stats().memory_pressure(), MemoryPressure::Low);

    mm.resize(&p1, h, 85).unwrap();
    assert_eq!(mm.stats().memory_pressure(), MemoryPressure::High);

    mm.resize(&p1, h, 100).unwrap();
    assert_eq!(mm.stats().memory_pressure(), MemoryPressure::Critical);
}
