/*!
 * Process Types
 * Common types for process management
 */

use crate::core::limits::{DEFAULT_INITIAL_MEMORY_SIZE, DEFAULT_MAX_MEMORY_SIZE};
use crate::core::types::{ExecutionHandle, Footprint, Handle, Owner, Pid, Size};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Process operation result
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Process errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ProcessError {
    #[error("Process overflow: {issued} PIDs issued, limit {limit}")]
    #[diagnostic(
        code(process::overflow),
        help("PIDs are never reused. The process table must be rebuilt to issue more.")
    )]
    ProcessOverflow { issued: u32, limit: u32 },

    #[error("Unknown process: {0}")]
    #[diagnostic(
        code(process::unknown),
        help("The process may have already ended or never existed. Check PID validity.")
    )]
    UnknownProcess(Pid),

    #[error("Invalid state transition for PID {pid}: {from:?} -> {to:?}")]
    #[diagnostic(code(process::invalid_transition))]
    InvalidTransition {
        pid: Pid,
        from: ProcessState,
        to: ProcessState,
    },
}

/// Process state
///
/// `Created -> Running -> Terminated`. `Terminated` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// PID issued, not yet accepted by the execution host
    Created,
    /// Accepted by the execution host
    Running,
    /// Ended or crashed
    Terminated,
}

/// Memory negotiation bounds for a process
///
/// Not enforced by the process table; the caller negotiates memory with the
/// memory manager inside these bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ProcessParams {
    pub initial_memory_size: Size,
    pub max_memory_size: Size,
}

impl Default for ProcessParams {
    fn default() -> Self {
        Self {
            initial_memory_size: DEFAULT_INITIAL_MEMORY_SIZE,
            max_memory_size: DEFAULT_MAX_MEMORY_SIZE,
        }
    }
}

impl ProcessParams {
    pub fn new(initial_memory_size: Size, max_memory_size: Size) -> Self {
        Self {
            initial_memory_size,
            max_memory_size,
        }
    }

    /// Bytes to reserve for a script with the given footprint
    pub fn reservation(&self, footprint: Footprint) -> Size {
        footprint.max(self.initial_memory_size)
    }

    /// Check whether `size` fits under the process ceiling
    pub fn admits(&self, size: Size) -> bool {
        size <= self.max_memory_size
    }
}

/// What a caller asks the process table to start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessDescriptor {
    pub name: String,
    pub footprint: Footprint,
}

impl ProcessDescriptor {
    pub fn new(name: impl Into<String>, footprint: Footprint) -> Self {
        Self {
            name: name.into(),
            footprint,
        }
    }
}

/// Why a process was ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "error", rename_all = "snake_case")]
pub enum ExitReason {
    /// `end_process` was requested by a caller
    Requested,
    /// The script ran to completion
    Exited,
    /// The host reported a crash
    Crashed(String),
}

/// Process record held by the process table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessInfo {
    pub pid: Pid,
    pub name: String,
    pub state: ProcessState,
    pub footprint: Footprint,
    pub params: ProcessParams,
    /// Allocation handles reserved for this process
    pub allocations: Vec<Handle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_reason: Option<ExitReason>,
}

impl ProcessInfo {
    pub fn new(pid: Pid, descriptor: ProcessDescriptor, params: ProcessParams) -> Self {
        Self {
            pid,
            name: descriptor.name,
            state: ProcessState::Created,
            footprint: descriptor.footprint,
            params,
            allocations: Vec::new(),
            execution: None,
            exit_reason: None,
        }
    }

    /// Owner identity for this process's allocations
    pub fn owner(&self) -> Owner {
        Owner::for_process(self.pid)
    }
}
