/*!
 * Task Host
 *
 * Runs each bundle as its own tokio task, with the script itself on the
 * blocking pool so a runaway script never stalls the kernel's dispatch loop.
 *
 * # Teardown
 *
 * `terminate` raises the execution's stop flag and aborts its task. The
 * runtime sees the flag through [`SystemApi::should_stop`]; whatever it
 * returns afterwards is discarded, so a terminated execution never reports
 * an event. Dropping the last clone of a host does the same for every
 * execution still running.
 */

use super::{
    ExecutionHost, HostError, HostEvent, HostEventSink, HostResult, ProcessIdentity, ScriptRuntime,
    SystemApi,
};
use crate::core::types::{ExecutionHandle, Pid};
use crate::loader::SandboxedBundle;
use ahash::RandomState;
use dashmap::DashMap;
use log::{info, warn};
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Execution {
    pid: Pid,
    task: JoinHandle<()>,
    stop: Arc<AtomicBool>,
}

/// Execution host backed by tokio tasks
#[derive(Clone)]
pub struct TaskHost {
    runtime: Arc<dyn ScriptRuntime>,
    sink: Arc<dyn HostEventSink>,
    executions: Arc<DashMap<ExecutionHandle, Execution, RandomState>>,
    /// Shared only between `TaskHost` clones, never with execution tasks
    clones: Arc<()>,
}

impl TaskHost {
    pub fn new(runtime: impl ScriptRuntime, sink: impl HostEventSink) -> Self {
        Self {
            runtime: Arc::new(runtime),
            sink: Arc::new(sink),
            executions: Arc::new(DashMap::with_hasher(RandomState::new())),
            clones: Arc::new(()),
        }
    }

    /// PIDs with a live execution
    pub fn pids(&self) -> Vec<Pid> {
        self.executions.iter().map(|e| e.value().pid).collect()
    }
}

impl ExecutionHost for TaskHost {
    fn launch(
        &self,
        identity: ProcessIdentity,
        bundle: SandboxedBundle,
    ) -> HostResult<ExecutionHandle> {
        let pid = identity.pid;
        let rt = tokio::runtime::Handle::try_current().map_err(|e| HostError::LaunchFailed {
            pid,
            reason: format!("no async runtime: {}", e),
        })?;

        let handle = ExecutionHandle::new();
        let stop = Arc::new(AtomicBool::new(false));
        let api = SystemApi::new(identity, Arc::clone(&stop));
        let (registered_tx, registered_rx) = oneshot::channel::<()>();

        let runtime = Arc::clone(&self.runtime);
        let sink = Arc::clone(&self.sink);
        let executions = Arc::clone(&self.executions);
        let task_stop = Arc::clone(&stop);

        let task = rt.spawn(async move {
            // Wait until the execution is in the table so removal below cannot race insertion
            if registered_rx.await.is_err() {
                return;
            }

            let outcome =
                tokio::task::spawn_blocking(move || runtime.execute(&bundle, &api)).await;
            executions.remove(&handle);

            if task_stop.load(Ordering::Acquire) {
                return;
            }

            let event = match outcome {
                Ok(Ok(())) => HostEvent::Exited { pid },
                Ok(Err(error)) => HostEvent::Crash { pid, error },
                Err(join_err) if join_err.is_panic() => HostEvent::Crash {
                    pid,
                    error: panic_message(join_err.into_panic()),
                },
                Err(_) => return,
            };
            sink.report(event);
        });

        self.executions
            .insert(handle, Execution { pid, task, stop });
        let _ = registered_tx.send(());

        info!("Host accepted PID {} as {}", pid, handle);
        Ok(handle)
    }

    fn terminate(&self, execution: ExecutionHandle) -> HostResult<()> {
        let (_, entry) = self
            .executions
            .remove(&execution)
            .ok_or(HostError::UnknownExecution(execution))?;

        entry.stop.store(true, Ordering::Release);
        entry.task.abort();
        info!("Host terminated PID {} ({})", entry.pid, execution);
        Ok(())
    }

    fn running(&self) -> usize {
        self.executions.len()
    }
}

impl Drop for TaskHost {
    fn drop(&mut self) {
        // Last clone going away tears down whatever is still running
        if Arc::strong_count(&self.clones) == 1 && !self.executions.is_empty() {
            warn!(
                "Task host dropped with {} running executions - aborting",
                self.executions.len()
            );
            for entry in self.executions.iter() {
                entry.value().stop.store(true, Ordering::Release);
                entry.value().task.abort();
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "script panicked".to_string()
    }
}
