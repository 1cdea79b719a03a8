/*!
 * Kernel Dispatch Loop
 *
 * A single queue of [`KernelEvent`]s, drained by the task that owns the
 * [`Kernel`]. Each event is handled to completion before the next is read,
 * so requests from callers and lifecycle reports from the host are applied
 * atomically and in arrival order.
 *
 * # Example
 *
 * ```no_run
 * # use std::sync::Arc;
 * # use sandbox_os_kernel::{InertRuntime, Kernel, KernelConfig, KernelHandle, TaskHost};
 * # async fn example() -> sandbox_os_kernel::KernelResult<()> {
 * let (handle, events) = KernelHandle::channel();
 * let host = TaskHost::new(InertRuntime, handle.clone());
 * let kernel = Kernel::boot(KernelConfig::default(), Arc::new(host));
 * let kernel_task = tokio::spawn(kernel.run(events));
 *
 * let pid = handle.spawn("hello", "SYSTEM.log('hi')", None).await?;
 * handle.end(pid).await.ok();
 * handle.shutdown();
 * kernel_task.await.ok();
 * # Ok(())
 * # }
 * ```
 */

use super::Kernel;
use crate::core::errors::{KernelError, KernelResult};
use crate::core::types::{Handle, Pid, Size};
use crate::host::{HostEvent, HostEventSink};
use crate::memory::MemoryStats;
use crate::monitoring::span_event;
use crate::process::{ExitReason, ProcessInfo, ProcessParams};
use log::{debug, info};
use tokio::sync::{mpsc, oneshot};

/// Receiving half of the kernel event queue
pub type KernelEvents = mpsc::UnboundedReceiver<KernelEvent>;

/// Messages handled by the dispatch loop
#[derive(Debug)]
pub enum KernelEvent {
    Spawn {
        name: String,
        source: String,
        params: Option<ProcessParams>,
        reply: oneshot::Sender<KernelResult<Pid>>,
    },
    End {
        pid: Pid,
        reply: oneshot::Sender<KernelResult<ProcessInfo>>,
    },
    ResizeMemory {
        pid: Pid,
        size: Size,
        reply: oneshot::Sender<KernelResult<Handle>>,
    },
    Stats {
        reply: oneshot::Sender<MemoryStats>,
    },
    Processes {
        reply: oneshot::Sender<Vec<ProcessInfo>>,
    },
    Host(HostEvent),
    Shutdown,
}

impl KernelEvent {
    fn name(&self) -> &'static str {
        match self {
            KernelEvent::Spawn { .. } => "spawn",
            KernelEvent::End { .. } => "end",
            KernelEvent::ResizeMemory { .. } => "resize_memory",
            KernelEvent::Stats { .. } => "stats",
            KernelEvent::Processes { .. } => "processes",
            KernelEvent::Host(HostEvent::Crash { .. }) => "host_crash",
            KernelEvent::Host(HostEvent::Exited { .. }) => "host_exited",
            KernelEvent::Shutdown => "shutdown",
        }
    }
}

/// Cloneable sender side of the kernel event queue
#[derive(Debug, Clone)]
pub struct KernelHandle {
    tx: mpsc::UnboundedSender<KernelEvent>,
}

impl KernelHandle {
    /// Create a queue; hand the receiver to [`Kernel::run`]
    pub fn channel() -> (Self, KernelEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub async fn spawn(
        &self,
        name: impl Into<String>,
        source: impl Into<String>,
        params: Option<ProcessParams>,
    ) -> KernelResult<Pid> {
        let name = name.into();
        let source = source.into();
        self.request(|reply| KernelEvent::Spawn {
            name,
            source,
            params,
            reply,
        })
        .await?
    }

    pub async fn end(&self, pid: Pid) -> KernelResult<ProcessInfo> {
        self.request(|reply| KernelEvent::End { pid, reply }).await?
    }

    pub async fn resize_memory(&self, pid: Pid, size: Size) -> KernelResult<Handle> {
        self.request(|reply| KernelEvent::ResizeMemory { pid, size, reply })
            .await?
    }

    pub async fn stats(&self) -> KernelResult<MemoryStats> {
        self.request(|reply| KernelEvent::Stats { reply }).await
    }

    pub async fn processes(&self) -> KernelResult<Vec<ProcessInfo>> {
        self.request(|reply| KernelEvent::Processes { reply }).await
    }

    /// Ask the loop to end every process and stop
    pub fn shutdown(&self) {
        let _ = self.tx.send(KernelEvent::Shutdown);
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> KernelEvent,
    ) -> KernelResult<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| KernelError::Disconnected)?;
        response.await.map_err(|_| KernelError::Disconnected)
    }
}

impl HostEventSink for KernelHandle {
    fn report(&self, event: HostEvent) {
        if self.tx.send(KernelEvent::Host(event)).is_err() {
            debug!("Host event dropped: kernel dispatch loop stopped");
        }
    }
}

impl Kernel {
    /// Drain `events` until shutdown or until every sender is gone
    ///
    /// Returns the kernel after ending all remaining processes.
    pub async fn run(mut self, mut events: KernelEvents) -> Self {
        info!("Kernel dispatch loop started");

        while let Some(event) = events.recv().await {
            if !self.dispatch(event) {
                break;
            }
        }

        events.close();
        self.shutdown();
        info!("Kernel dispatch loop stopped");
        self
    }

    /// Handle one event; returns false when the loop should stop
    pub fn dispatch(&mut self, event: KernelEvent) -> bool {
        let span = span_event(event.name());
        let _entered = span.enter();

        match event {
            KernelEvent::Spawn {
                name,
                source,
                params,
                reply,
            } => {
                let result = self.spawn(&name, &source, params);
                if let Ok(pid) = result {
                    span.record_pid(pid);
                }
                span.record_outcome(&result);
                let _ = reply.send(result);
            }
            KernelEvent::End { pid, reply } => {
                span.record_pid(pid);
                let result = self.end(pid, ExitReason::Requested);
                span.record_outcome(&result);
                let _ = reply.send(result);
            }
            KernelEvent::ResizeMemory { pid, size, reply } => {
                span.record_pid(pid);
                let result = self.resize_memory(pid, size);
                span.record_outcome(&result);
                let _ = reply.send(result);
            }
            KernelEvent::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
            KernelEvent::Processes { reply } => {
                let _ = reply.send(self.processes().list());
            }
            KernelEvent::Host(event) => {
                span.record_pid(event.pid());
                self.handle_host_event(event);
            }
            KernelEvent::Shutdown => return false,
        }
        true
    }
}
