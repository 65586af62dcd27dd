//! Screening pipeline: validate → predict → build record → append → respond.
//!
//! Transport-agnostic and blocking; the HTTP layer runs it on the blocking
//! pool. Each step short-circuits, and nothing is rolled back on failure.

use serde::Serialize;

use crate::config::PREDICTIONS_COLLECTION;
use crate::core_state::CoreState;
use crate::models::{Label, PersistedRecord, PredictionRequest, PredictionResult};
use crate::predictor::PredictorError;
use crate::store::StoreError;

/// Success payload for `/predict`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionResponse {
    pub prediction: String,
    pub label: Label,
}

#[derive(Debug, thiserror::Error)]
pub enum ScreeningError {
    /// Client error. No predictor call, no store write.
    #[error(transparent)]
    Validation(#[from] crate::models::InvalidInput),
    /// Anything that failed after validation.
    #[error("{0}")]
    Internal(String),
}

impl From<PredictorError> for ScreeningError {
    fn from(err: PredictorError) -> Self {
        ScreeningError::Internal(err.to_string())
    }
}

impl From<StoreError> for ScreeningError {
    fn from(err: StoreError) -> Self {
        ScreeningError::Internal(err.to_string())
    }
}

/// Run one `/predict` submission end to end.
pub fn handle(core: &CoreState, body: &[u8]) -> Result<PredictionResponse, ScreeningError> {
    let request = PredictionRequest::from_body(body).map_err(|e| {
        tracing::info!(reason = e.reason, "Prediction request rejected");
        e
    })?;
    screen(core, &request)
}

/// Steps 2–6 for an already-validated request.
pub fn screen(
    core: &CoreState,
    request: &PredictionRequest,
) -> Result<PredictionResponse, ScreeningError> {
    let label = core.predictor().predict(&request.features)?;
    let result = PredictionResult::for_patient(&request.name, label);
    let record = PersistedRecord::build(request, &result);

    let document_id = core.store().append(PREDICTIONS_COLLECTION, &record)?;
    tracing::info!(
        label = label.as_u8(),
        %document_id,
        collection = PREDICTIONS_COLLECTION,
        "Prediction recorded"
    );

    Ok(PredictionResponse {
        prediction: result.message,
        label: result.label,
    })
}
