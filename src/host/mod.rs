/*!
 * Execution Host
 *
 * Capability-scoped interface to whatever actually runs processes. The
 * kernel hands the host an opaque bundle and an identity; the host reports
 * back through discrete lifecycle events.
 */

mod runtime;
mod task;

pub use runtime::{InertRuntime, ScriptOutcome, ScriptRuntime};
pub use task::TaskHost;

use crate::core::types::{ExecutionHandle, Pid};
use crate::loader::SandboxedBundle;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Host errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum HostError {
    #[error("Host refused to launch PID {pid}: {reason}")]
    #[diagnostic(code(host::launch_failed))]
    LaunchFailed { pid: Pid, reason: String },

    #[error("Unknown execution: {0}")]
    #[diagnostic(
        code(host::unknown_execution),
        help("The execution may already have finished or been terminated.")
    )]
    UnknownExecution(ExecutionHandle),
}

pub type HostResult<T> = Result<T, HostError>;

/// Identity under which a bundle runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessIdentity {
    pub pid: Pid,
    pub name: String,
}

impl ProcessIdentity {
    pub fn new(pid: Pid, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
        }
    }
}

/// Lifecycle event reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostEvent {
    /// The script failed; `error` is its message
    Crash { pid: Pid, error: String },
    /// The script ran to completion
    Exited { pid: Pid },
}

impl HostEvent {
    pub fn pid(&self) -> Pid {
        match self {
            HostEvent::Crash { pid, .. } | HostEvent::Exited { pid } => *pid,
        }
    }
}

/// Destination for host lifecycle events
pub trait HostEventSink: Send + Sync + 'static {
    fn report(&self, event: HostEvent);
}

impl HostEventSink for mpsc::UnboundedSender<HostEvent> {
    fn report(&self, event: HostEvent) {
        if self.send(event).is_err() {
            log::debug!("Host event dropped: receiver closed");
        }
    }
}

/// Something that runs sandboxed bundles in isolation
pub trait ExecutionHost: Send + Sync {
    /// Accept a bundle for execution under `identity`
    fn launch(&self, identity: ProcessIdentity, bundle: SandboxedBundle)
        -> HostResult<ExecutionHandle>;

    /// Tear down an execution; no events are reported for it afterwards
    fn terminate(&self, execution: ExecutionHandle) -> HostResult<()>;

    /// Executions currently running
    fn running(&self) -> usize;
}

/// API object the host binds into the bundle
///
/// This is the whole surface a script can reach.
#[derive(Debug, Clone)]
pub struct SystemApi {
    identity: ProcessIdentity,
    stop: Arc<AtomicBool>,
}

impl SystemApi {
    pub(crate) fn new(identity: ProcessIdentity, stop: Arc<AtomicBool>) -> Self {
        Self { identity, stop }
    }

    pub fn pid(&self) -> Pid {
        self.identity.pid
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Write a line to the kernel log on behalf of the script
    pub fn log(&self, message: &str) {
        tracing::info!(pid = self.identity.pid, process = %self.identity.name, "{}", message);
    }

    /// Set once the process has been terminated; runtimes poll it to stop early
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}
