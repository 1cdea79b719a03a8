/*!
 * System Limits and Constants
 *
 * Centralized location for all system-wide limits, thresholds, and magic numbers.
 * Organized by domain for maintainability and discoverability.
 */

// =============================================================================
// MEMORY LIMITS
// =============================================================================

/// Maximum number of allocation slots in the allocation pool
/// Freed slots are tombstoned, never reused, so this also caps the handle space
pub const ALLOC_POOL_MAX: usize = 255;

/// Default virtual memory budget (4MB)
/// Used as default capacity for the memory manager
pub const DEFAULT_TOTAL_MEMORY: usize = 4 * 1024 * 1024;

/// Usage ratio at which pressure is reported as MEDIUM
pub const MEMORY_PRESSURE_MEDIUM: f64 = 0.60;

/// Usage ratio at which pressure is reported as HIGH
pub const MEMORY_PRESSURE_HIGH: f64 = 0.80;

/// Usage ratio at which pressure is reported as CRITICAL
pub const MEMORY_PRESSURE_CRITICAL: f64 = 0.95;

// =============================================================================
// PROCESS LIMITS
// =============================================================================

/// First PID issued by a process table
pub const PID_BASE: u32 = 1000;

/// Default cap on PIDs issued by one process table
pub const MAX_PROCESSES: u32 = 100;

/// Default initial memory reservation per process (bytes)
pub const DEFAULT_INITIAL_MEMORY_SIZE: usize = 255;

/// Default absolute memory ceiling per process (bytes)
pub const DEFAULT_MAX_MEMORY_SIZE: usize = 65535;

// =============================================================================
// SANDBOX
// =============================================================================

/// Identifier the sandboxed bundle binds to the host API object
pub const SYSTEM_API_BINDING: &str = "SYSTEM";
