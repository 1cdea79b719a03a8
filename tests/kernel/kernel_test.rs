/*!
 * Kernel Context Tests
 * Start/end wiring between memory, process table and host
 */

use pretty_assertions::assert_eq;
use sandbox_os_kernel::core::limits::PID_BASE;
use sandbox_os_kernel::core::types::ExecutionHandle;
use sandbox_os_kernel::host::HostError;
use sandbox_os_kernel::memory::MemoryError;
use sandbox_os_kernel::process::ProcessError;
use sandbox_os_kernel::{
    ExecutionHost, ExitReason, HostEvent, Kernel, KernelConfig, KernelError, ProcessIdentity,
    ProcessParams, ProcessState, SandboxedBundle,
};
use std::sync::{Arc, Mutex};

/// Host that records launches and never reports events on its own
#[derive(Default)]
struct RecordingHost {
    refuse: bool,
    launched: Mutex<Vec<(ProcessIdentity, String)>>,
    terminated: Mutex<Vec<ExecutionHandle>>,
}

impl RecordingHost {
    fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }
}

impl ExecutionHost for RecordingHost {
    fn launch(
        &self,
        identity: ProcessIdentity,
        bundle: SandboxedBundle,
    ) -> Result<ExecutionHandle, HostError> {
        if self.refuse {
            return Err(HostError::LaunchFailed {
                pid: identity.pid,
                reason: "sandbox unavailable".into(),
            });
        }
        self.launched
            .lock()
            .unwrap()
            .push((identity, bundle.source().to_string()));
        Ok(ExecutionHandle::new())
    }

    fn terminate(&self, execution: ExecutionHandle) -> Result<(), HostError> {
        self.terminated.lock().unwrap().push(execution);
        Ok(())
    }

    fn running(&self) -> usize {
        self.launched.lock().unwrap().len() - self.terminated.lock().unwrap().len()
    }
}

fn boot(config: KernelConfig) -> (Kernel, Arc<RecordingHost>) {
    let host = Arc::new(RecordingHost::default());
    (Kernel::boot(config, host.clone()), host)
}

#[test]
fn test_spawn_reserves_memory_and_runs() {
    let (mut kernel, host) = boot(KernelConfig::default());

    let pid = kernel.spawn("hello", "SYSTEM.log(1)", None).unwrap();
    assert_eq!(pid, PID_BASE);

    let info = kernel.process(pid).unwrap();
    assert_eq!(info.state, ProcessState::Running);
    assert_eq!(info.allocations, vec![0]);
    assert!(info.execution.is_some());

    // Footprint is below the default initial size, so 255 bytes are reserved
    let stats = kernel.stats();
    assert_eq!(stats.bytes_used, 255);
    assert_eq!(stats.pool_used, 1);

    let launched = host.launched.lock().unwrap();
    assert_eq!(launched[0].0, ProcessIdentity::new(pid, "hello"));
    assert_eq!(launched[0].1, "SYSTEM.log(1)");
}

#[test]
fn test_end_frees_memory_and_tears_down() {
    let (mut kernel, host) = boot(KernelConfig::default());
    let pid = kernel.spawn("app", "x", None).unwrap();
    let execution = kernel.process(pid).unwrap().execution;

    let record = kernel.end(pid, ExitReason::Requested).unwrap();
    assert_eq!(record.state, ProcessState::Terminated);
    assert_eq!(kernel.stats().bytes_used, 0);
    assert!(kernel.processes().is_empty());
    assert_eq!(host.terminated.lock().unwrap().first().copied(), execution);

    assert!(matches!(
        kernel.end(pid, ExitReason::Requested),
        Err(KernelError::Process(ProcessError::UnknownProcess(p))) if p == pid
    ));
}

#[test]
fn test_large_footprint_sets_reservation() {
    let (mut kernel, _host) = boot(KernelConfig::default());
    // Two quotes and one plain char
    let pid = kernel.spawn("quoted", "'a'", None).unwrap();
    assert_eq!(kernel.process(pid).unwrap().footprint, 257);
    assert_eq!(kernel.stats().bytes_used, 257);
}

#[test]
fn test_admission_refusal_leaves_no_state() {
    let (mut kernel, host) = boot(KernelConfig::default());
    let params = ProcessParams::new(10, 100);

    let err = kernel.spawn("greedy", "''", Some(params)).unwrap_err();
    assert!(matches!(
        err,
        KernelError::AdmissionRefused { requested: 256, limit: 100, .. }
    ));

    let stats = kernel.stats();
    assert_eq!(stats.slots_created, 0);
    assert!(kernel.processes().is_empty());
    assert_eq!(kernel.processes().next_pid(), PID_BASE);
    assert!(host.launched.lock().unwrap().is_empty());
}

#[test]
fn test_out_of_memory_does_not_issue_pid() {
    let (mut kernel, _host) = boot(KernelConfig::default().with_total_memory(300));
    kernel.spawn("first", "a", None).unwrap();

    let err = kernel.spawn("second", "b", None).unwrap_err();
    assert!(matches!(
        err.as_memory(),
        Some(MemoryError::OutOfMemory { requested: 255, available: 45, .. })
    ));
    assert_eq!(kernel.processes().len(), 1);
    assert_eq!(kernel.processes().next_pid(), PID_BASE + 1);
}

#[test]
fn test_process_overflow_consumes_no_slot() {
    let (mut kernel, _host) = boot(KernelConfig::default().with_max_processes(1));
    let pid = kernel.spawn("only", "a", None).unwrap();
    kernel.end(pid, ExitReason::Exited).unwrap();

    let err = kernel.spawn("late", "a", None).unwrap_err();
    assert!(matches!(
        err.as_process(),
        Some(ProcessError::ProcessOverflow { issued: 1, limit: 1 })
    ));
    assert_eq!(kernel.memory().slots_created(), 1);
}

#[test]
fn test_launch_failure_rolls_back() {
    let mut kernel = Kernel::boot(KernelConfig::default(), Arc::new(RecordingHost::refusing()));

    let err = kernel.spawn("doomed", "a", None).unwrap_err();
    assert!(matches!(
        err,
        KernelError::Host(HostError::LaunchFailed { pid, .. }) if pid == PID_BASE
    ));

    assert!(kernel.processes().is_empty());
    assert_eq!(kernel.stats().bytes_used, 0);
    // Neither the PID nor the handle slot is handed out again
    assert_eq!(kernel.processes().next_pid(), PID_BASE + 1);
    assert_eq!(kernel.memory().slots_created(), 1);
}

#[test]
fn test_crash_event_terminates_and_frees() {
    let (mut kernel, _host) = boot(KernelConfig::default());
    let pid = kernel.spawn("fragile", "a", None).unwrap();
    let other = kernel.spawn("steady", "b", None).unwrap();

    let record = kernel
        .handle_host_event(HostEvent::Crash {
            pid,
            error: "ReferenceError".into(),
        })
        .unwrap();
    assert_eq!(
        record.exit_reason,
        Some(ExitReason::Crashed("ReferenceError".into()))
    );
    assert_eq!(kernel.stats().bytes_used, 255);
    assert!(kernel.process(other).is_some());

    // A late exit report for the same PID changes nothing
    assert!(kernel.handle_host_event(HostEvent::Exited { pid }).is_none());
    assert_eq!(kernel.processes().len(), 1);
}

#[test]
fn test_resize_within_limits() {
    let (mut kernel, _host) = boot(KernelConfig::default());
    let params = ProcessParams::new(100, 1000);
    let pid = kernel.spawn("elastic", "a", Some(params)).unwrap();

    kernel.resize_memory(pid, 900).unwrap();
    assert_eq!(kernel.stats().bytes_used, 900);

    assert!(matches!(
        kernel.resize_memory(pid, 1001),
        Err(KernelError::AdmissionRefused { limit: 1000, .. })
    ));
    assert!(matches!(
        kernel.resize_memory(pid, 900).unwrap_err().as_memory(),
        Some(MemoryError::NoOp { size: 900, .. })
    ));
    assert!(matches!(
        kernel.resize_memory(9999, 10),
        Err(KernelError::Process(ProcessError::UnknownProcess(9999)))
    ));
}

#[test]
fn test_shutdown_ends_everything() {
    let (mut kernel, host) = boot(KernelConfig::default());
    for name in ["a", "b", "c"] {
        kernel.spawn(name, "x", None).unwrap();
    }

    assert_eq!(kernel.shutdown(), 3);
    assert!(kernel.processes().is_empty());
    assert_eq!(kernel.stats().bytes_used, 0);
    assert_eq!(host.running(), 0);
}
