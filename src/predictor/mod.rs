//! Diabetes classifier behind a trait seam.
//!
//! The model is trained elsewhere and shipped as a JSON artifact. It is
//! loaded once at startup and shared read-only across requests.
//! Artifacts are tagged by `model_type`:
//! - `logistic_regression` → [`LogisticModel`]
//! - `random_forest` → [`ForestModel`]

pub mod forest;
pub mod logistic;

use std::path::Path;
use std::sync::Mutex;

use serde::Deserialize;

use crate::models::features::{feature_names, FeatureVector, FEATURE_COUNT};
use crate::models::prediction::Label;

pub use forest::ForestModel;
pub use logistic::LogisticModel;

/// Binary classifier over the 16-feature symptom vector.
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<Label, PredictorError>;

    /// Short identifier for logs.
    fn describe(&self) -> String;
}

/// Failure while running a loaded model.
#[derive(Debug, thiserror::Error)]
pub enum PredictorError {
    #[error("Model produced a non-finite score")]
    NonFiniteScore,
    #[error("Model inference failed: {0}")]
    Inference(String),
}

/// Failure while loading a model artifact. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Cannot read model artifact {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Malformed model artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Model feature order does not match the service schema (position {position}: expected {expected:?}, found {found:?})")]
    FeatureOrder {
        position: usize,
        expected: &'static str,
        found: String,
    },
    #[error("Model expects {found} features, service sends 16")]
    FeatureCount { found: usize },
    #[error("Invalid model parameters: {0}")]
    Invalid(String),
}

#[derive(Deserialize)]
#[serde(tag = "model_type", rename_all = "snake_case")]
enum ModelArtifact {
    LogisticRegression(logistic::LogisticArtifact),
    RandomForest(forest::ForestArtifact),
}

/// Load a model artifact from disk.
pub fn load_artifact(path: &Path) -> Result<Box<dyn Predictor>, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_artifact(&bytes)
}

/// Parse and validate a model artifact.
pub fn parse_artifact(bytes: &[u8]) -> Result<Box<dyn Predictor>, ArtifactError> {
    let predictor: Box<dyn Predictor> = match serde_json::from_slice::<ModelArtifact>(bytes)? {
        ModelArtifact::LogisticRegression(artifact) => Box::new(LogisticModel::try_from(artifact)?),
        ModelArtifact::RandomForest(artifact) => Box::new(ForestModel::try_from(artifact)?),
    };
    tracing::info!(model = %predictor.describe(), "Model artifact loaded");
    Ok(predictor)
}

/// The artifact's feature list must be the service schema, in order.
pub(crate) fn check_feature_names(names: &[String]) -> Result<(), ArtifactError> {
    if names.len() != FEATURE_COUNT {
        return Err(ArtifactError::FeatureCount { found: names.len() });
    }
    for (position, (expected, found)) in feature_names().zip(names).enumerate() {
        if expected != found.as_str() {
            return Err(ArtifactError::FeatureOrder {
                position,
                expected,
                found: found.clone(),
            });
        }
    }
    Ok(())
}

/// Convert a fixed-length parameter list, naming the parameter on failure.
pub(crate) fn fixed<const N: usize>(what: &str, values: Vec<f64>) -> Result<[f64; N], ArtifactError> {
    let len = values.len();
    let array: [f64; N] = values
        .try_into()
        .map_err(|_| ArtifactError::Invalid(format!("{what} has {len} entries, expected {N}")))?;
    if array.iter().any(|v| !v.is_finite()) {
        return Err(ArtifactError::Invalid(format!("{what} contains a non-finite value")));
    }
    Ok(array)
}

/// Mock predictor for testing. Returns a fixed label or a fixed failure.
/// Records every vector it sees.
pub struct MockPredictor {
    outcome: Result<Label, String>,
    seen: Mutex<Vec<FeatureVector>>,
}

impl MockPredictor {
    pub fn returning(label: Label) -> Self {
        Self {
            outcome: Ok(label),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn last_input(&self) -> Option<FeatureVector> {
        self.seen.lock().ok().and_then(|s| s.last().cloned())
    }
}

impl Predictor for MockPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<Label, PredictorError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(features.clone());
        }
        self.outcome.clone().map_err(PredictorError::Inference)
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}
