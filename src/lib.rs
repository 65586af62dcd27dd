pub mod api; // HTTP router, endpoints, server lifecycle
pub mod config;
pub mod core_state; // Startup wiring of predictor + store
pub mod models;
pub mod predictor; // Classifier artifacts
pub mod screening; // Request pipeline
pub mod store; // Record persistence

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::config::ServiceConfig;
use crate::core_state::{CoreState, StartupError};

/// Start the service and block until Ctrl-C.
///
/// Collaborators are built before the async runtime starts; the Firestore
/// store owns a blocking HTTP client that must not be created inside it.
pub fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = ServiceConfig::from_env()?;
    let core = Arc::new(CoreState::from_config(&config)?);

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| StartupError::Server(format!("Failed to start async runtime: {e}")))?;

    // `core` outlives the runtime's tasks so the store's blocking client is
    // dropped outside async context.
    runtime.block_on(async {
        let mut server = api::start_server(core.clone(), config.bind_addr).await?;
        tracing::info!(addr = %server.session.server_addr, "Accepting predictions");

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for Ctrl-C: {e}");
        }
        server.shutdown();
        server.stopped().await;
        Ok::<(), StartupError>(())
    })
}
