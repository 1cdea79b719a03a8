/*!
 * Memory Types
 * Common types for memory management
 */

use crate::core::limits::{
    MEMORY_PRESSURE_CRITICAL, MEMORY_PRESSURE_HIGH, MEMORY_PRESSURE_MEDIUM,
};
use crate::core::types::{Handle, Owner, Size};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Memory operation result
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Memory errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum MemoryError {
    #[error("Allocation pool full: {capacity} slots already created")]
    #[diagnostic(
        code(memory::pool_full),
        help("Allocation handles are never reused. Reboot the kernel to reclaim the handle space.")
    )]
    PoolFull { capacity: usize },

    #[error("Out of memory: requested {requested} bytes, available {available} bytes ({used} used / {total} total)")]
    #[diagnostic(
        code(memory::out_of_memory),
        help("Free or shrink existing allocations before retrying.")
    )]
    OutOfMemory {
        requested: Size,
        available: Size,
        used: Size,
        total: Size,
    },

    #[error("Invalid allocation handle {handle} ({slots} slots created)")]
    #[diagnostic(code(memory::invalid_handle))]
    InvalidHandle { handle: Handle, slots: usize },

    #[error("Allocation {0} not found (already freed)")]
    #[diagnostic(
        code(memory::record_not_found),
        help("The slot is a tombstone. Freed handles are never valid again.")
    )]
    RecordNotFound(Handle),

    #[error("Owner {requester} may not access allocation {handle}")]
    #[diagnostic(
        code(memory::authorization_error),
        help("Only the owner that made an allocation can free or resize it.")
    )]
    AuthorizationError { handle: Handle, requester: Owner },

    #[error("Allocation {handle} already has size {size}")]
    #[diagnostic(code(memory::no_op))]
    NoOp { handle: Handle, size: Size },
}

/// One slot of the allocation pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub owner: Owner,
    pub size: Size,
}

impl AllocationRecord {
    pub fn new(owner: Owner, size: Size) -> Self {
        Self { owner, size }
    }

    #[inline]
    pub fn is_owned_by(&self, owner: &Owner) -> bool {
        &self.owner == owner
    }
}

/// Memory statistics
///
/// Derived from the allocation pool; never mutated independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_bytes: Size,
    pub bytes_used: Size,
    pub bytes_left: Size,
    /// Live (non-tombstone) records
    pub pool_used: usize,
    pub pool_left: usize,
    /// Slots created so far, tombstones included
    pub slots_created: usize,
}

impl MemoryStats {
    pub fn usage_percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        (self.bytes_used as f64 / self.total_bytes as f64) * 100.0
    }

    pub fn memory_pressure(&self) -> MemoryPressure {
        MemoryPressure::from_ratio(self.usage_percentage() / 100.0)
    }
}

/// Memory pressure levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MemoryPressure {
    Low,
    Medium,
    High,
    Critical,
}

impl MemoryPressure {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= MEMORY_PRESSURE_CRITICAL {
            MemoryPressure::Critical
        } else if ratio >= MEMORY_PRESSURE_HIGH {
            MemoryPressure::High
        } else if ratio >= MEMORY_PRESSURE_MEDIUM {
            MemoryPressure::Medium
        } else {
            MemoryPressure::Low
        }
    }
}

impl std::fmt::Display for MemoryPressure {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MemoryPressure::Low => write!(f, "LOW"),
            MemoryPressure::Medium => write!(f, "MEDIUM"),
            MemoryPressure::High => write!(f, "HIGH"),
            MemoryPressure::Critical => write!(f, "CRITICAL"),
        }
    }
}
