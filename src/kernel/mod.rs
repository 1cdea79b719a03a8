/*!
 * Kernel Context
 *
 * One `Kernel` per simulated boot. It owns the memory manager, the process
 * table, the script loader and a reference to the execution host, and is the
 * only place they are wired together:
 *
 * - **Start**: footprint estimate -> allocation under the process identity
 *   -> PID -> launch on the host
 * - **End**: retire the PID record -> free the process's allocations ->
 *   tear down the host execution
 *
 * Every operation takes `&mut self`; there is no internal locking. The
 * dispatch loop in [`dispatch`] is the intended way to serialize callers.
 */

pub mod dispatch;

pub use dispatch::{KernelEvent, KernelHandle};

use crate::core::config::KernelConfig;
use crate::core::errors::{KernelError, KernelResult};
use crate::core::types::{Handle, Owner, Pid, Size};
use crate::host::{ExecutionHost, HostError, HostEvent, ProcessIdentity};
use crate::loader::ScriptLoader;
use crate::memory::{MemoryManager, MemoryStats};
use crate::process::{
    ExitReason, ProcessDescriptor, ProcessError, ProcessInfo, ProcessParams, ProcessTable,
};
use log::{debug, info, warn};
use std::sync::Arc;

/// Kernel context
pub struct Kernel {
    config: KernelConfig,
    memory: MemoryManager,
    processes: ProcessTable,
    loader: ScriptLoader,
    host: Arc<dyn ExecutionHost>,
}

impl Kernel {
    /// Boot a kernel over `host`
    pub fn boot(config: KernelConfig, host: Arc<dyn ExecutionHost>) -> Self {
        info!(
            "Booting kernel: {} bytes of memory, up to {} processes",
            config.total_memory, config.max_processes
        );
        Self {
            memory: MemoryManager::with_capacity(config.total_memory),
            processes: ProcessTable::with_cap(config.max_processes),
            loader: ScriptLoader::new(),
            host,
            config,
        }
    }

    /// Start a process running `source`
    ///
    /// The reservation is the larger of the script's footprint and
    /// `initial_memory_size`, and must fit under `max_memory_size`. A refused
    /// start leaves memory and the process table unchanged.
    pub fn spawn(
        &mut self,
        name: &str,
        source: &str,
        params: Option<ProcessParams>,
    ) -> KernelResult<Pid> {
        let params = params.unwrap_or(self.config.default_params);
        let script = self.loader.preprocess(source);
        let reservation = params.reservation(script.footprint);

        if !params.admits(reservation) {
            warn!(
                "Admission refused for {}: needs {} bytes, limit {}",
                name, reservation, params.max_memory_size
            );
            return Err(KernelError::AdmissionRefused {
                name: name.to_string(),
                requested: reservation,
                limit: params.max_memory_size,
            });
        }

        // Checked up front: a slot consumed by a doomed allocation is never reclaimed
        self.processes.ensure_capacity()?;

        let owner = Owner::for_process(self.processes.next_pid());
        let handle = self.memory.allocate(&owner, reservation)?;

        let descriptor = ProcessDescriptor::new(name, script.footprint);
        let pid = match self.processes.start_process(descriptor, params) {
            Ok(pid) => pid,
            Err(e) => {
                self.release(&owner);
                return Err(e.into());
            }
        };
        self.processes.attach_allocation(pid, handle)?;

        let identity = ProcessIdentity::new(pid, name);
        match self.loader.launch(self.host.as_ref(), identity, script) {
            Ok(launched) => {
                self.processes.attach_execution(pid, launched.execution)?;
                self.processes.mark_running(pid)?;
                info!(
                    "Started {} as PID {} ({} bytes reserved, footprint {})",
                    name, pid, reservation, launched.footprint
                );
                Ok(pid)
            }
            Err(e) => {
                warn!("Launch of PID {} failed, rolling back: {}", pid, e);
                self.processes
                    .end_process(pid, ExitReason::Crashed(e.to_string()))?;
                self.release(&owner);
                Err(e.into())
            }
        }
    }

    /// End a process and release everything it holds
    pub fn end(&mut self, pid: Pid, reason: ExitReason) -> KernelResult<ProcessInfo> {
        let record = self.processes.end_process(pid, reason)?;
        let freed = self.release(&record.owner());

        if let Some(execution) = record.execution {
            match self.host.terminate(execution) {
                Ok(()) => {}
                Err(HostError::UnknownExecution(_)) => {
                    debug!("PID {} execution already finished", pid);
                }
                Err(e) => warn!("Failed to tear down PID {}: {}", pid, e),
            }
        }

        info!(
            "Process {} (PID {}) terminated, {} bytes released",
            record.name, pid, freed
        );
        Ok(record)
    }

    /// Resize a process's primary allocation within its `max_memory_size`
    ///
    /// A process holding no allocation gets a fresh one of `new_size`.
    pub fn resize_memory(&mut self, pid: Pid, new_size: Size) -> KernelResult<Handle> {
        let process = self
            .processes
            .get(pid)
            .ok_or(ProcessError::UnknownProcess(pid))?;

        if !process.params.admits(new_size) {
            return Err(KernelError::AdmissionRefused {
                name: process.name.clone(),
                requested: new_size,
                limit: process.params.max_memory_size,
            });
        }

        let owner = process.owner();
        match process.allocations.first().copied() {
            Some(handle) => Ok(self.memory.resize(&owner, handle, new_size)?),
            None => {
                let handle = self.memory.allocate(&owner, new_size)?;
                self.processes.attach_allocation(pid, handle)?;
                debug!("PID {} had no allocation, reserved {} bytes", pid, new_size);
                Ok(handle)
            }
        }
    }

    /// React to a lifecycle event from the host
    ///
    /// Events for processes that have already ended are ignored.
    pub fn handle_host_event(&mut self, event: HostEvent) -> Option<ProcessInfo> {
        let pid = event.pid();
        let reason = match event {
            HostEvent::Crash { error, .. } => {
                warn!("PID {} crashed: {}", pid, error);
                ExitReason::Crashed(error)
            }
            HostEvent::Exited { .. } => ExitReason::Exited,
        };

        match self.end(pid, reason) {
            Ok(record) => Some(record),
            Err(KernelError::Process(ProcessError::UnknownProcess(_))) => {
                debug!("Ignoring host event for ended PID {}", pid);
                None
            }
            Err(e) => {
                warn!("Failed to retire PID {} after host event: {}", pid, e);
                None
            }
        }
    }

    /// End every live process
    pub fn shutdown(&mut self) -> usize {
        let pids: Vec<Pid> = self.processes.list().iter().map(|p| p.pid).collect();
        let mut ended = 0;
        for pid in pids {
            if self.end(pid, ExitReason::Requested).is_ok() {
                ended += 1;
            }
        }
        info!("Kernel shut down, {} processes ended", ended);
        ended
    }

    /// Memory statistics, recomputed
    pub fn stats(&mut self) -> MemoryStats {
        self.memory.stats()
    }

    pub fn process(&self, pid: Pid) -> Option<&ProcessInfo> {
        self.processes.get(pid)
    }

    pub fn processes(&self) -> &ProcessTable {
        &self.processes
    }

    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    fn release(&mut self, owner: &Owner) -> Size {
        self.memory.free_owner(owner)
    }
}
