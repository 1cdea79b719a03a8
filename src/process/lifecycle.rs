/*!
 * Process Lifecycle
 * State machine for process records
 */

use super::types::{ProcessError, ProcessInfo, ProcessResult, ProcessState};
use log::debug;

impl ProcessState {
    /// Check whether `self -> to` is a legal transition
    ///
    /// `Created -> Terminated` is the cancellation path: a process ended
    /// before the host accepted it.
    pub fn can_transition_to(self, to: ProcessState) -> bool {
        matches!(
            (self, to),
            (ProcessState::Created, ProcessState::Running)
                | (ProcessState::Running, ProcessState::Terminated)
                | (ProcessState::Created, ProcessState::Terminated)
        )
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        self == ProcessState::Terminated
    }
}

/// Move a record to `to`, rejecting illegal transitions
pub(super) fn transition(process: &mut ProcessInfo, to: ProcessState) -> ProcessResult<()> {
    let from = process.state;
    if !from.can_transition_to(to) {
        return Err(ProcessError::InvalidTransition {
            pid: process.pid,
            from,
            to,
        });
    }

    debug!("PID {} ({}): {:?} -> {:?}", process.pid, process.name, from, to);
    process.state = to;
    Ok(())
}
