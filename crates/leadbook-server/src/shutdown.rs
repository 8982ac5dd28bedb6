//! Process shutdown signals

use std::time::Duration;

use futures::future::join_all;
use tokio::{signal, task::JoinHandle};
use tracing::{info, warn};

/// Resolves on Ctrl+C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}

/// Waits for background tasks to wind down, giving up after `timeout`.
pub async fn join_background(handles: Vec<JoinHandle<()>>, timeout: Duration) {
    if handles.is_empty() {
        return;
    }

    let count = handles.len();
    match tokio::time::timeout(timeout, join_all(handles)).await {
        Ok(results) => {
            for result in results {
                if let Err(e) = result {
                    warn!(error = %e, "Background task ended abnormally");
                }
            }
            info!(count, "Background tasks stopped");
        },
        Err(_) => warn!(
            count,
            timeout_secs = timeout.as_secs(),
            "Background tasks did not stop in time"
        ),
    }
}
