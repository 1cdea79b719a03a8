/*!
 * Process Table
 * PID issuance and live process records
 */

use super::lifecycle::transition;
use super::types::{
    ExitReason, ProcessDescriptor, ProcessError, ProcessInfo, ProcessParams, ProcessResult,
    ProcessState,
};
use crate::core::limits::{MAX_PROCESSES, PID_BASE};
use crate::core::types::{ExecutionHandle, Handle, Pid};
use log::{info, warn};
use std::collections::BTreeMap;

/// Process table
///
/// PIDs start at [`PID_BASE`] and increase by one per start. They are never
/// reused, so the cap bounds the PIDs issued over the table's lifetime, not
/// the number of processes alive at once.
#[derive(Debug, Clone)]
pub struct ProcessTable {
    processes: BTreeMap<Pid, ProcessInfo>,
    next_pid: Pid,
    cap: u32,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::with_cap(MAX_PROCESSES)
    }

    pub fn with_cap(cap: u32) -> Self {
        info!("Process table initialized (PID base {}, cap {})", PID_BASE, cap);
        Self {
            processes: BTreeMap::new(),
            next_pid: PID_BASE,
            cap,
        }
    }

    /// Issue a PID and record the process as `Created`
    pub fn start_process(
        &mut self,
        descriptor: ProcessDescriptor,
        params: ProcessParams,
    ) -> ProcessResult<Pid> {
        if let Err(e) = self.ensure_capacity() {
            warn!("Refused to start {}: {}", descriptor.name, e);
            return Err(e);
        }

        let pid = self.next_pid;
        self.next_pid += 1;

        info!(
            "Created process: {} (PID: {}, footprint: {})",
            descriptor.name, pid, descriptor.footprint
        );
        self.processes
            .insert(pid, ProcessInfo::new(pid, descriptor, params));

        Ok(pid)
    }

    /// Fail with `ProcessOverflow` if no further PID can be issued
    pub fn ensure_capacity(&self) -> ProcessResult<()> {
        let issued = self.issued();
        if issued >= self.cap {
            return Err(ProcessError::ProcessOverflow {
                issued,
                limit: self.cap,
            });
        }
        Ok(())
    }

    /// Start a process with default memory parameters
    pub fn start(&mut self, descriptor: ProcessDescriptor) -> ProcessResult<Pid> {
        self.start_process(descriptor, ProcessParams::default())
    }

    /// Remove a process, returning its terminated record
    ///
    /// The caller releases the allocations listed on the record.
    pub fn end_process(&mut self, pid: Pid, reason: ExitReason) -> ProcessResult<ProcessInfo> {
        let process = self.get_mut(pid)?;
        transition(process, ProcessState::Terminated)?;
        process.exit_reason = Some(reason);

        let process = self
            .processes
            .remove(&pid)
            .ok_or(ProcessError::UnknownProcess(pid))?;

        info!(
            "Ended process: {} (PID: {}, reason: {:?})",
            process.name, pid, process.exit_reason
        );
        Ok(process)
    }

    /// Mark a process as accepted by the execution host
    pub fn mark_running(&mut self, pid: Pid) -> ProcessResult<()> {
        let process = self.get_mut(pid)?;
        transition(process, ProcessState::Running)
    }

    /// Record an allocation reserved for a process
    pub fn attach_allocation(&mut self, pid: Pid, handle: Handle) -> ProcessResult<()> {
        self.get_mut(pid)?.allocations.push(handle);
        Ok(())
    }

    /// Record the host execution backing a process
    pub fn attach_execution(&mut self, pid: Pid, execution: ExecutionHandle) -> ProcessResult<()> {
        self.get_mut(pid)?.execution = Some(execution);
        Ok(())
    }

    pub fn get(&self, pid: Pid) -> Option<&ProcessInfo> {
        self.processes.get(&pid)
    }

    fn get_mut(&mut self, pid: Pid) -> ProcessResult<&mut ProcessInfo> {
        self.processes
            .get_mut(&pid)
            .ok_or(ProcessError::UnknownProcess(pid))
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.processes.contains_key(&pid)
    }

    /// Live processes in PID order
    pub fn list(&self) -> Vec<ProcessInfo> {
        self.processes.values().cloned().collect()
    }

    /// Live process count
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// PIDs issued since the base
    pub fn issued(&self) -> u32 {
        self.next_pid - PID_BASE
    }

    /// PID the next successful start will issue
    pub fn next_pid(&self) -> Pid {
        self.next_pid
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}
