use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use shorturl_core::LinkStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Background work wound down once the server has stopped.
pub struct Teardown {
    pub shutdown_tx: watch::Sender<bool>,
    pub health_task: JoinHandle<()>,
    pub store: Arc<dyn LinkStore>,
}

impl Teardown {
    async fn run(self) -> anyhow::Result<()> {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.health_task.await {
            warn!(error = %e, "cache health check ended abnormally");
        }

        self.store
            .disconnect()
            .await
            .context("failed to disconnect store")
    }
}

/// Waits for the server to exit or for `signal`, then runs `teardown`.
///
/// Teardown always runs, also when the server fails on its own. A server
/// error takes precedence over a teardown error.
pub async fn serve_until_stopped(
    mut server: JoinHandle<std::io::Result<()>>,
    signal: impl Future<Output = ()>,
    drain_timeout: Duration,
    teardown: Teardown,
) -> anyhow::Result<()> {
    let served: anyhow::Result<()> = tokio::select! {
        joined = &mut server => flatten(joined),
        _ = signal => {
            info!(timeout = ?drain_timeout, "shutdown requested, draining requests");
            let _ = teardown.shutdown_tx.send(true);
            match tokio::time::timeout(drain_timeout, &mut server).await {
                Ok(joined) => flatten(joined),
                Err(_) => {
                    warn!("requests still in flight after shutdown timeout, aborting");
                    server.abort();
                    Ok(())
                }
            }
        }
    };

    if let Err(e) = &served {
        error!(error = %e, "server stopped with an error");
    }

    let stopped = teardown.run().await;
    served?;
    stopped?;
    info!("shutdown complete");
    Ok(())
}

fn flatten(
    joined: std::result::Result<std::io::Result<()>, tokio::task::JoinError>,
) -> anyhow::Result<()> {
    joined
        .context("server task panicked")?
        .context("server error")
}

/// Resolves once `true` has been sent on the shutdown channel.
pub async fn stopped(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
