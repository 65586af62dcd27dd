//! Process-wide collaborators, built once at startup.
//!
//! `CoreState` owns the predictor and the record store. Both are read-only
//! after construction and shared across requests without locking; the
//! axum layer holds it behind an `Arc`.

use std::sync::Arc;

use crate::config::{ServiceConfig, StoreKind};
use crate::predictor::{self, ArtifactError, Predictor};
use crate::store::firestore::FirestoreSetupError;
use crate::store::{FirestoreStore, MemoryStore, RecordStore};

/// Startup failures. Any of these stops the process.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error(transparent)]
    Model(#[from] ArtifactError),
    #[error(transparent)]
    Store(#[from] FirestoreSetupError),
    #[error("Server error: {0}")]
    Server(String),
}

pub struct CoreState {
    predictor: Arc<dyn Predictor>,
    store: Arc<dyn RecordStore>,
}

impl CoreState {
    /// Assemble from already-built collaborators.
    pub fn new(predictor: Arc<dyn Predictor>, store: Arc<dyn RecordStore>) -> Self {
        Self { predictor, store }
    }

    /// Load the model artifact and connect the configured store.
    ///
    /// Builds a blocking HTTP client for Firestore, so call this outside
    /// the async runtime.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, StartupError> {
        let predictor: Arc<dyn Predictor> = Arc::from(predictor::load_artifact(&config.model_path)?);

        let store: Arc<dyn RecordStore> = match config.store {
            StoreKind::Firestore => Arc::new(FirestoreStore::from_settings(&config.firestore)?),
            StoreKind::Memory => {
                tracing::warn!("Using in-memory record store; predictions are not persisted");
                Arc::new(MemoryStore::new())
            }
        };

        tracing::info!(
            model = %predictor.describe(),
            store = %store.describe(),
            "Collaborators ready"
        );

        Ok(Self::new(predictor, store))
    }

    pub fn predictor(&self) -> &dyn Predictor {
        self.predictor.as_ref()
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }
}
