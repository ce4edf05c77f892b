//! Signal handling for graceful client shutdown.

use tokio::signal;
use tracing::info;

/// Resolves once the process is asked to stop.
///
/// Handles SIGINT and SIGTERM on Unix and Ctrl+C on Windows.
pub async fn shutdown_signal() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => (),
            _ = sigterm.recv() => ()
        }
    }

    #[cfg(windows)]
    signal::ctrl_c().await?;

    info!("📡 Received shutdown signal - leaving the battle");
    Ok(())
}
