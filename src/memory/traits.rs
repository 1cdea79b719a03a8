/*!
 * Memory Traits
 * Memory management abstractions
 */

use super::types::*;
use crate::core::types::{Handle, Owner, Size};

/// Owner-scoped allocator interface
pub trait Allocator {
    /// Allocate `size` bytes for `owner`, returning the new handle
    fn allocate(&mut self, owner: &Owner, size: Size) -> MemoryResult<Handle>;

    /// Free an allocation; only its owner may do so
    fn free(&mut self, owner: &Owner, handle: Handle) -> MemoryResult<()>;

    /// Resize an allocation in place
    fn resize(&mut self, owner: &Owner, handle: Handle, new_size: Size) -> MemoryResult<Handle>;

    /// Free every live allocation of `owner`, returning the bytes released
    fn free_owner(&mut self, owner: &Owner) -> Size;
}

/// Memory statistics provider
pub trait MemoryInfo {
    /// Get overall memory statistics
    fn stats(&mut self) -> MemoryStats;

    /// Get memory info as (total, used, available)
    fn info(&mut self) -> (Size, Size, Size) {
        let stats = self.stats();
        (stats.total_bytes, stats.bytes_used, stats.bytes_left)
    }

    /// Get memory pressure level
    fn pressure(&mut self) -> MemoryPressure {
        self.stats().memory_pressure()
    }
}
