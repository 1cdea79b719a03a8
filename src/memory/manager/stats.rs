/*!
 * Memory Statistics
 * Derived statistics and read-only queries over the allocation pool
 */

use super::super::types::{AllocationRecord, MemoryStats};
use super::MemoryManager;
use crate::core::types::{Handle, Owner, Size};

impl MemoryManager {
    /// Recompute statistics from the allocation pool
    pub(super) fn refresh(&mut self) {
        self.stats = self.compute_stats();
    }

    fn compute_stats(&self) -> MemoryStats {
        let (bytes_used, pool_used) = self
            .allocations
            .iter()
            .flatten()
            .fold((0, 0), |(bytes, live), record| (bytes + record.size, live + 1));

        MemoryStats {
            total_bytes: self.total_memory,
            bytes_used,
            bytes_left: self.total_memory.saturating_sub(bytes_used),
            pool_used,
            pool_left: self.pool_capacity.saturating_sub(pool_used),
            slots_created: self.allocations.len(),
        }
    }

    /// Get memory statistics, recomputed before returning
    pub fn stats(&mut self) -> MemoryStats {
        self.refresh();
        self.stats
    }

    /// Bytes held by live allocations
    pub fn used(&self) -> Size {
        self.compute_stats().bytes_used
    }

    /// Bytes still available under the budget
    pub fn remaining(&self) -> Size {
        self.compute_stats().bytes_left
    }

    /// Live record at `handle`, if any
    pub fn record(&self, handle: Handle) -> Option<&AllocationRecord> {
        self.allocations.get(handle).and_then(Option::as_ref)
    }

    /// Check if a handle refers to a live allocation
    pub fn is_valid(&self, handle: Handle) -> bool {
        self.record(handle).is_some()
    }

    /// Live allocations of one owner, in handle order
    pub fn allocations_of(&self, owner: &Owner) -> Vec<(Handle, AllocationRecord)> {
        self.allocations
            .iter()
            .enumerate()
            .filter_map(|(handle, slot)| {
                slot.as_ref()
                    .filter(|record| record.is_owned_by(owner))
                    .map(|record| (handle, record.clone()))
            })
            .collect()
    }

    /// Bytes held by one owner
    pub fn owner_usage(&self, owner: &Owner) -> Size {
        self.allocations
            .iter()
            .flatten()
            .filter(|record| record.is_owned_by(owner))
            .map(|record| record.size)
            .sum()
    }
}
