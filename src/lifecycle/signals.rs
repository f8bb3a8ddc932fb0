//! OS signal handling.
//!
//! # Responsibilities
//! - SIGTERM/SIGINT resolve `shutdown_signal`
//! - SIGHUP becomes a `ReloadTrigger::Signal`, never a shutdown

use tokio::sync::{broadcast, mpsc};

use crate::mapping::ReloadTrigger;

/// Resolves on the first Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}

/// Forward SIGHUP to `triggers` until shutdown.
#[cfg(unix)]
pub fn spawn_hangup_listener(triggers: mpsc::UnboundedSender<ReloadTrigger>, mut shutdown: broadcast::Receiver<()>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(sig) => sig,
        Err(e) => {
            tracing::warn!(error = %e, "SIGHUP reload unavailable");
            return;
        }
    };

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    tracing::info!("Received SIGHUP, scheduling reload");
                    if triggers.send(ReloadTrigger::Signal).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

#[cfg(not(unix))]
pub fn spawn_hangup_listener(_triggers: mpsc::UnboundedSender<ReloadTrigger>, _shutdown: broadcast::Receiver<()>) {}
