/*!
 * Memory Allocator Implementation
 * Allocation, free and resize logic
 */

use super::super::types::{AllocationRecord, MemoryError, MemoryPressure, MemoryResult};
use super::MemoryManager;
use crate::core::types::{Handle, Owner, Size};
use log::{debug, error, info, warn};

impl MemoryManager {
    /// Allocate `size` bytes under `owner`
    ///
    /// The pool capacity is checked before the pool grows, so a failed
    /// allocation leaves the pool untouched.
    pub fn allocate(&mut self, owner: &Owner, size: Size) -> MemoryResult<Handle> {
        self.refresh();

        if self.allocations.len() >= self.pool_capacity {
            error!(
                "Allocation pool full: {} requested {} bytes, {} slots created",
                owner,
                size,
                self.allocations.len()
            );
            return Err(MemoryError::PoolFull {
                capacity: self.pool_capacity,
            });
        }

        if size > self.stats.bytes_left {
            error!(
                "OOM: {} requested {} bytes, only {} bytes available ({} used / {} total)",
                owner, size, self.stats.bytes_left, self.stats.bytes_used, self.total_memory
            );
            return Err(MemoryError::OutOfMemory {
                requested: size,
                available: self.stats.bytes_left,
                used: self.stats.bytes_used,
                total: self.total_memory,
            });
        }

        let handle = self.allocations.len();
        self.allocations
            .push(Some(AllocationRecord::new(owner.clone(), size)));
        self.refresh();

        let pressure = self.stats.memory_pressure();
        if pressure >= MemoryPressure::Medium {
            warn!(
                "Memory pressure {}: Allocated {} bytes as handle {} for {} ({:.1}% used: {} / {})",
                pressure,
                size,
                handle,
                owner,
                self.stats.usage_percentage(),
                self.stats.bytes_used,
                self.total_memory
            );
        } else {
            info!("Allocated {} bytes as handle {} for {}", size, handle, owner);
        }

        Ok(handle)
    }

    /// Free an allocation, leaving a tombstone in its slot
    pub fn free(&mut self, owner: &Owner, handle: Handle) -> MemoryResult<()> {
        let size = self.authorize(owner, handle)?;

        self.allocations[handle] = None;
        self.refresh();

        info!(
            "Freed {} bytes at handle {} for {} ({} bytes now available)",
            size, handle, owner, self.stats.bytes_left
        );
        Ok(())
    }

    /// Resize an allocation in place
    ///
    /// Shrinking always succeeds. Growing needs the size delta to fit in the
    /// currently free bytes.
    pub fn resize(&mut self, owner: &Owner, handle: Handle, new_size: Size) -> MemoryResult<Handle> {
        let current = self.authorize(owner, handle)?;

        if new_size == current {
            return Err(MemoryError::NoOp {
                handle,
                size: current,
            });
        }

        if new_size > current {
            self.refresh();
            let delta = new_size - current;
            if delta > self.stats.bytes_left {
                warn!(
                    "Resize of handle {} for {} to {} bytes refused: needs {} more, {} available",
                    handle, owner, new_size, delta, self.stats.bytes_left
                );
                return Err(MemoryError::OutOfMemory {
                    requested: delta,
                    available: self.stats.bytes_left,
                    used: self.stats.bytes_used,
                    total: self.total_memory,
                });
            }
        }

        if let Some(record) = self.allocations[handle].as_mut() {
            record.size = new_size;
        }
        self.refresh();

        debug!(
            "Resized handle {} for {}: {} -> {} bytes",
            handle, owner, current, new_size
        );
        Ok(handle)
    }

    /// Free every live allocation of `owner`
    ///
    /// Returns the number of bytes released.
    pub fn free_owner(&mut self, owner: &Owner) -> Size {
        let mut freed = 0;
        let mut count = 0;

        for slot in self.allocations.iter_mut() {
            if slot.as_ref().map_or(false, |r| r.is_owned_by(owner)) {
                if let Some(record) = slot.take() {
                    freed += record.size;
                    count += 1;
                }
            }
        }
        self.refresh();

        if count > 0 {
            info!(
                "Freed {} allocations ({} bytes) owned by {}",
                count, freed, owner
            );
        }
        freed
    }

    /// Check a handle against the pool and its owner, returning the current size
    ///
    /// Order matters: range, then tombstone, then ownership.
    fn authorize(&self, owner: &Owner, handle: Handle) -> MemoryResult<Size> {
        let slot = self
            .allocations
            .get(handle)
            .ok_or(MemoryError::InvalidHandle {
                handle,
                slots: self.allocations.len(),
            })?;

        let record = slot.as_ref().ok_or(MemoryError::RecordNotFound(handle))?;

        if !record.is_owned_by(owner) {
            warn!(
                "{} attempted to access handle {} owned by {}",
                owner, handle, record.owner
            );
            return Err(MemoryError::AuthorizationError {
                handle,
                requester: owner.clone(),
            });
        }

        Ok(record.size)
    }
}
