/*!
 * Script Runtimes
 * The isolated execution primitive behind the task host
 */

use super::SystemApi;
use crate::loader::SandboxedBundle;

/// `Err` carries the script's error message
pub type ScriptOutcome = Result<(), String>;

/// Runs one bundle to completion on a blocking thread
///
/// Implementations bind the bundle's API identifier to `system` before
/// running the source.
pub trait ScriptRuntime: Send + Sync + 'static {
    fn execute(&self, bundle: &SandboxedBundle, system: &SystemApi) -> ScriptOutcome;
}

impl<F> ScriptRuntime for F
where
    F: Fn(&SandboxedBundle, &SystemApi) -> ScriptOutcome + Send + Sync + 'static,
{
    fn execute(&self, bundle: &SandboxedBundle, system: &SystemApi) -> ScriptOutcome {
        self(bundle, system)
    }
}

/// Runtime that accepts every bundle and completes silently
#[derive(Debug, Clone, Copy, Default)]
pub struct InertRuntime;

impl ScriptRuntime for InertRuntime {
    fn execute(&self, bundle: &SandboxedBundle, system: &SystemApi) -> ScriptOutcome {
        log::debug!(
            "PID {} completed inert bundle ({} bytes, bound to {})",
            system.pid(),
            bundle.len(),
            bundle.api_binding()
        );
        Ok(())
    }
}
