/*!
 * Sandbox OS Kernel Library
 *
 * Resource model for a simulated operating system that runs untrusted
 * scripts as processes on an external execution host:
 * - Memory accounting over a fixed virtual budget
 * - PID issuance and process lifecycle
 * - Script footprint estimation and sandboxed bundles
 */

pub mod core;
pub mod host;
pub mod kernel;
pub mod loader;
pub mod memory;
pub mod monitoring;
pub mod process;

// Re-exports
pub use crate::core::{
    Handle, KernelConfig, KernelError, KernelResult, Owner, Pid, Size,
};
pub use host::{
    ExecutionHost, HostEvent, HostEventSink, InertRuntime, ProcessIdentity, ScriptRuntime,
    SystemApi, TaskHost,
};
pub use kernel::{Kernel, KernelEvent, KernelHandle};
pub use loader::{SandboxedBundle, ScriptLoader};
pub use memory::{MemoryError, MemoryManager, MemoryStats};
pub use monitoring::init_tracing;
pub use process::{ExitReason, ProcessError, ProcessInfo, ProcessParams, ProcessState, ProcessTable};
