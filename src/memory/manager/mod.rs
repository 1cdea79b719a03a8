/*!
 * Memory Management
 *
 * Accounting allocator over a fixed virtual memory budget.
 *
 * ## Model
 *
 * - **Allocation pool**: ordered slots, one per allocation ever made. The
 *   position of a slot is its handle.
 * - **Tombstones**: freeing a slot empties it in place. Handles are never
 *   reused and the pool never shrinks, so the handle space grows
 *   monotonically up to the pool capacity (255 slots).
 * - **Owner scoping**: free and resize require the owner that made the
 *   allocation. This is the only access control over memory.
 * - **Statistics**: derived from the pool and recomputed before every read
 *   that depends on them.
 *
 * No addresses, no fragmentation, no locking: callers serialize access
 * (the kernel does so through its dispatch loop).
 */

mod allocator;
mod stats;

use super::traits::{Allocator, MemoryInfo};
use super::types::{AllocationRecord, MemoryResult, MemoryStats};
use crate::core::limits::{ALLOC_POOL_MAX, DEFAULT_TOTAL_MEMORY};
use crate::core::types::{Handle, Owner, Size};
use log::info;

/// Memory manager
#[derive(Debug, Clone)]
pub struct MemoryManager {
    total_memory: Size,
    pool_capacity: usize,
    allocations: Vec<Option<AllocationRecord>>,
    stats: MemoryStats,
}

impl MemoryManager {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TOTAL_MEMORY)
    }

    /// Create memory manager with a custom budget (useful for testing)
    pub fn with_capacity(total: Size) -> Self {
        Self::with_pool_capacity(total, ALLOC_POOL_MAX)
    }

    /// Create memory manager with a custom budget and slot count
    pub fn with_pool_capacity(total: Size, pool_capacity: usize) -> Self {
        info!(
            "Memory manager initialized with {} bytes and {} allocation slots",
            total, pool_capacity
        );
        let mut manager = Self {
            total_memory: total,
            pool_capacity,
            allocations: Vec::with_capacity(pool_capacity),
            stats: MemoryStats::default(),
        };
        manager.refresh();
        manager
    }

    /// Total memory budget
    #[inline]
    pub fn total(&self) -> Size {
        self.total_memory
    }

    /// Number of slots the pool can ever hold
    #[inline]
    pub fn pool_capacity(&self) -> usize {
        self.pool_capacity
    }

    /// Slots created so far, tombstones included
    #[inline]
    pub fn slots_created(&self) -> usize {
        self.allocations.len()
    }
}

impl Allocator for MemoryManager {
    fn allocate(&mut self, owner: &Owner, size: Size) -> MemoryResult<Handle> {
        MemoryManager::allocate(self, owner, size)
    }

    fn free(&mut self, owner: &Owner, handle: Handle) -> MemoryResult<()> {
        MemoryManager::free(self, owner, handle)
    }

    fn resize(&mut self, owner: &Owner, handle: Handle, new_size: Size) -> MemoryResult<Handle> {
        MemoryManager::resize(self, owner, handle, new_size)
    }

    fn free_owner(&mut self, owner: &Owner) -> Size {
        MemoryManager::free_owner(self, owner)
    }
}

impl MemoryInfo for MemoryManager {
    fn stats(&mut self) -> MemoryStats {
        MemoryManager::stats(self)
    }
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self::new()
    }
}
