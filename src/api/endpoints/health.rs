//! Liveness endpoint.

use crate::config::LIVENESS_MESSAGE;

/// `GET /`: fixed liveness string.
pub async fn live() -> &'static str {
    LIVENESS_MESSAGE
}
