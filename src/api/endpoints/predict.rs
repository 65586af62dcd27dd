//! `POST /predict`: screen one patient record.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::screening::{self, PredictionResponse};

/// The raw body is validated by the pipeline itself, so malformed JSON gets
/// the same 400 as a missing field rather than an extractor rejection.
/// A body the extractor cannot buffer (over the size limit) still gets a
/// JSON error. Prediction and the store write block, so they run off the
/// async workers.
pub async fn predict(
    State(ctx): State<ApiContext>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let body = body?;
    let core = ctx.core.clone();
    let response = tokio::task::spawn_blocking(move || screening::handle(&core, &body)).await??;
    Ok(Json(response))
}
