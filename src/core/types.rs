/*!
 * Core Types
 * Common types used across the kernel
 */

use serde::{Deserialize, Serialize};
use smartstring::alias::String as SmartString;
use std::fmt;
use uuid::Uuid;

/// Process ID type
pub type Pid = u32;

/// Size type for memory operations
pub type Size = usize;

/// Position of an allocation record in the allocation pool
pub type Handle = usize;

/// Heuristic script cost produced by the footprint estimator
pub type Footprint = usize;

/// Identity that owns allocation records
///
/// Owners are compared by value; free and resize only succeed for the owner
/// that made the allocation. Kernel processes use `proc:<pid>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Owner(SmartString);

impl Owner {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(SmartString::from(id.as_ref()))
    }

    /// Owner identity used for the allocations of a kernel process
    pub fn for_process(pid: Pid) -> Self {
        Self(SmartString::from(format!("proc:{}", pid)))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Owner {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Owner {
    fn from(s: String) -> Self {
        Self(SmartString::from(s))
    }
}

impl AsRef<str> for Owner {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Opaque reference to an execution on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionHandle(Uuid);

impl ExecutionHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExecutionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exec-{}", self.0)
    }
}
