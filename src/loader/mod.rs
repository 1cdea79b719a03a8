/*!
 * Script Loader
 *
 * Turns raw script source into a sandboxed bundle plus its footprint
 * estimate, and hands bundles to the execution host.
 */

mod bundle;

pub use bundle::SandboxedBundle;

use crate::core::types::{ExecutionHandle, Footprint};
use crate::host::{ExecutionHost, HostResult, ProcessIdentity};
use crate::memory::footprint;
use log::debug;
use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Loader errors
#[derive(Error, Debug, Diagnostic)]
pub enum LoaderError {
    #[error("Failed to read script {}: {source}", path.display())]
    #[diagnostic(code(loader::io), help("Check that the script path exists and is readable."))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type LoaderResult<T> = Result<T, LoaderError>;

/// A script ready for admission
#[derive(Debug, Clone)]
pub struct PreprocessedScript {
    pub bundle: SandboxedBundle,
    pub footprint: Footprint,
}

/// A script accepted by the execution host
#[derive(Debug, Clone)]
pub struct LaunchedProcess {
    pub execution: ExecutionHandle,
    pub name: String,
    pub footprint: Footprint,
}

/// Script loader
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptLoader;

impl ScriptLoader {
    pub fn new() -> Self {
        Self
    }

    /// Estimate the footprint of `source` and wrap it for the host
    pub fn preprocess(&self, source: &str) -> PreprocessedScript {
        let footprint = footprint::estimate(source);
        debug!(
            "Preprocessed script: {} bytes, footprint {}",
            source.len(),
            footprint
        );
        PreprocessedScript {
            bundle: SandboxedBundle::wrap(source),
            footprint,
        }
    }

    /// Hand a preprocessed script to the host
    pub fn launch(
        &self,
        host: &dyn ExecutionHost,
        identity: ProcessIdentity,
        script: PreprocessedScript,
    ) -> HostResult<LaunchedProcess> {
        let name = identity.name.clone();
        let execution = host.launch(identity, script.bundle)?;
        Ok(LaunchedProcess {
            execution,
            name,
            footprint: script.footprint,
        })
    }

    /// Preprocess and launch in one step, without memory admission
    pub fn create_process(
        &self,
        host: &dyn ExecutionHost,
        identity: ProcessIdentity,
        source: &str,
    ) -> HostResult<LaunchedProcess> {
        let script = self.preprocess(source);
        self.launch(host, identity, script)
    }

    /// Read a script from disk
    pub async fn read_script(&self, path: impl AsRef<Path>) -> LoaderResult<String> {
        let path = path.as_ref();
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LoaderError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}
