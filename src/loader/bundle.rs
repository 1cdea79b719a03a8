/*!
 * Sandboxed Bundle
 *
 * Opaque unit handed to the execution host. The kernel never builds or reads
 * code from it; only the host's runtime looks inside.
 */

use crate::core::limits::SYSTEM_API_BINDING;
use std::fmt;
use std::sync::Arc;

/// Raw script source paired with the identifier the host binds its API to
///
/// The host must bind [`api_binding`](Self::api_binding) to its API object
/// before running the source, and must turn any failure into a crash report
/// instead of letting it propagate.
#[derive(Clone, PartialEq, Eq)]
pub struct SandboxedBundle {
    source: Arc<str>,
    api_binding: &'static str,
}

impl SandboxedBundle {
    pub(super) fn wrap(source: &str) -> Self {
        Self {
            source: Arc::from(source),
            api_binding: SYSTEM_API_BINDING,
        }
    }

    /// Untrusted source, for the host runtime only
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn api_binding(&self) -> &'static str {
        self.api_binding
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

// Keep untrusted source out of logs
impl fmt::Debug for SandboxedBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SandboxedBundle")
            .field("api_binding", &self.api_binding)
            .field("len", &self.source.len())
            .finish()
    }
}
