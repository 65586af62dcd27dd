//! Screening API server lifecycle. Binds the listener, serves
//! `screening_router()` in a background task, and hands back a handle
//! with a shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::screening_router;
use crate::core_state::{CoreState, StartupError};

/// Metadata for a running server.
#[derive(Debug, Clone)]
pub struct ServerSession {
    pub server_addr: String,
    pub port: u16,
}

/// Handle to a running screening API server.
pub struct ScreeningServer {
    pub session: ServerSession,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ScreeningServer {
    /// Ask the server to stop accepting connections.
    /// In-flight requests are allowed to finish.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Screening API server shutdown signal sent");
        }
    }

    /// Wait for the serve task to exit.
    pub async fn stopped(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Screening API server task panicked: {e}");
            }
        }
    }
}

/// Bind `addr` and start serving in a background task.
pub async fn start_server(
    core: Arc<CoreState>,
    addr: SocketAddr,
) -> Result<ScreeningServer, StartupError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| StartupError::Server(format!("Failed to bind {addr}: {e}")))?;

    let addr = listener
        .local_addr()
        .map_err(|e| StartupError::Server(format!("Failed to get server address: {e}")))?;

    let app = screening_router(core);

    let session = ServerSession {
        server_addr: addr.to_string(),
        port: addr.port(),
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Screening API server received shutdown signal");
        };

        tracing::info!(%addr, "Screening API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Screening API server error: {e}");
        }

        tracing::info!("Screening API server stopped");
    });

    Ok(ScreeningServer {
        session,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}
