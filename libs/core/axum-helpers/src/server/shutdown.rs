use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Coordinates graceful shutdown around a root [`CancellationToken`].
///
/// The token is shared with request handlers (see
/// [`RequestCancellation`](crate::extractors::RequestCancellation)), so
/// cancelling it stops in-flight storage work as well as the listener.
#[derive(Clone, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The root token. Cancelled exactly when shutdown starts.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Start shutdown. Later calls are no-ops.
    pub fn shutdown(&self) {
        if !self.token.is_cancelled() {
            info!("Initiating graceful shutdown");
            self.token.cancel();
        }
    }

    /// Resolves once shutdown has started, by signal or by [`shutdown`](Self::shutdown).
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Wait for SIGINT/SIGTERM and start shutdown. Returns early if shutdown
    /// was started some other way.
    pub async fn wait_for_signal(&self) {
        tokio::select! {
            _ = shutdown_signal() => self.shutdown(),
            _ = self.token.cancelled() => {},
        }
    }
}

async fn ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

/// Resolves on the first SIGINT (Ctrl+C) or SIGTERM.
pub async fn shutdown_signal() {
    tokio::select! {
        _ = ctrl_c() => info!("Received SIGINT (Ctrl+C)"),
        _ = terminate() => info!("Received SIGTERM"),
    }
}
