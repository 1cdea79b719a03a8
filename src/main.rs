/*!
 * Sandbox OS Kernel - Main Entry Point
 *
 * Boots a kernel, starts one process per script path given on the command
 * line and runs until every process has terminated or Ctrl+C is pressed.
 */

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use sandbox_os_kernel::{
    init_tracing, InertRuntime, Kernel, KernelConfig, KernelHandle, ScriptLoader, TaskHost,
};

const STATS_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Sandbox OS kernel starting...");
    let config = KernelConfig::from_env().context("Failed to load kernel configuration")?;
    info!(
        total_memory = config.total_memory,
        max_processes = config.max_processes,
        "Configuration loaded"
    );

    let (handle, events) = KernelHandle::channel();
    let host = TaskHost::new(InertRuntime, handle.clone());
    let kernel = Kernel::boot(config, Arc::new(host));
    let kernel_task = tokio::spawn(kernel.run(events));

    let loader = ScriptLoader::new();
    for path in std::env::args().skip(1) {
        let source = match loader.read_script(&path).await {
            Ok(source) => source,
            Err(e) => {
                error!(error = %e, "Skipping script");
                continue;
            }
        };
        match handle.spawn(path.clone(), source, None).await {
            Ok(pid) => info!(pid, script = %path, "Process started"),
            Err(e) => warn!(error = %e, script = %path, "Process refused"),
        }
    }

    info!("Kernel is running - press Ctrl+C to exit");
    let mut ticker = tokio::time::interval(STATS_INTERVAL);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, shutting down");
                break;
            }
            _ = ticker.tick() => {
                let stats = handle.stats().await?;
                let live = handle.processes().await?.len();
                info!(
                    live_processes = live,
                    bytes_used = stats.bytes_used,
                    bytes_left = stats.bytes_left,
                    pool_used = stats.pool_used,
                    pressure = %stats.memory_pressure(),
                    "Kernel statistics"
                );
                if live == 0 {
                    info!("No live processes, shutting down");
                    break;
                }
            }
        }
    }

    handle.shutdown();
    kernel_task.await.context("Kernel dispatch loop panicked")?;
    info!("Kernel stopped");
    Ok(())
}
