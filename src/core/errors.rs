/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use crate::core::types::Size;
use miette::Diagnostic;
use thiserror::Error;

// Re-export subsystem errors
pub use crate::core::config::ConfigError;
pub use crate::host::HostError;
pub use crate::loader::LoaderError;
pub use crate::memory::MemoryError;
pub use crate::process::ProcessError;

/// Common result type for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;

/// Kernel-level errors
///
/// Subsystem errors pass through unchanged so callers can match every case.
#[derive(Error, Debug, Diagnostic)]
pub enum KernelError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Process {name} needs {requested} bytes, over its limit of {limit} bytes")]
    #[diagnostic(
        code(kernel::admission_refused),
        help("Raise max_memory_size for this process or shrink the script.")
    )]
    AdmissionRefused {
        name: String,
        requested: Size,
        limit: Size,
    },

    #[error("Kernel dispatch loop is not running")]
    #[diagnostic(
        code(kernel::disconnected),
        help("The kernel has shut down. Boot a new kernel to continue.")
    )]
    Disconnected,
}

impl KernelError {
    /// Memory error behind this failure, if any
    pub fn as_memory(&self) -> Option<&MemoryError> {
        match self {
            KernelError::Memory(e) => Some(e),
            _ => None,
        }
    }

    /// Process error behind this failure, if any
    pub fn as_process(&self) -> Option<&ProcessError> {
        match self {
            KernelError::Process(e) => Some(e),
            _ => None,
        }
    }
}
