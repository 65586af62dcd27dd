//! Screening API router.
//!
//! Routes:
//! - `GET /`: liveness
//! - `POST /predict`: screen a patient record
//!
//! Every route sits behind permissive CORS (the mobile client calls from
//! arbitrary origins) and the request log.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the screening API router around shared collaborators.
pub fn screening_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/", get(endpoints::health::live))
        .route("/predict", post(endpoints::predict::predict))
        .with_state(ctx)
        // ServiceBuilder layers run top to bottom: CORS outermost
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(axum::middleware::from_fn(middleware::request_log::log_request)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::PREDICTIONS_COLLECTION;
    use crate::models::{FieldValue, Label};
    use crate::predictor::MockPredictor;
    use crate::store::MemoryStore;

    fn test_app(predictor: MockPredictor) -> (Router, Arc<MockPredictor>, Arc<MemoryStore>) {
        let predictor = Arc::new(predictor);
        let store = Arc::new(MemoryStore::new());
        let core = Arc::new(CoreState::new(predictor.clone(), store.clone()));
        (screening_router(core), predictor, store)
    }

    fn predict_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn response_json(response: axum::http::Response<Body>) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 65536)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    const ASHA: &str = r#"{"name":"Asha","contact":"555","address":"X","features":[45,1,1,0,0,0,0,0,0,0,0,0,0,0,0,0]}"#;

    #[tokio::test]
    async fn liveness_returns_fixed_text() {
        let (app, _, _) = test_app(MockPredictor::returning(Label::LowRisk));
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Diabetes Prediction API is Live!");
    }

    #[tokio::test]
    async fn predict_positive_response_shape() {
        let (app, _, store) = test_app(MockPredictor::returning(Label::EarlyStage));
        let response = app.oneshot(predict_request(ASHA)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(
            json,
            serde_json::json!({
                "prediction": "Asha Patient Diagnosed with early-stage diabetes",
                "label": 1
            })
        );

        let records = store.records(PREDICTIONS_COLLECTION);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("Gender"), Some(&FieldValue::from("Male")));
    }

    #[tokio::test]
    async fn predict_negative_response_shape() {
        let (app, _, _) = test_app(MockPredictor::returning(Label::LowRisk));
        let response = app.oneshot(predict_request(ASHA)).await.unwrap();
        let json = response_json(response).await;
        assert_eq!(json["prediction"], "Individual assessed as low-risk for diabetes");
        assert_eq!(json["label"], 0);
    }

    #[tokio::test]
    async fn fifteen_features_returns_400_without_side_effects() {
        let (app, predictor, store) = test_app(MockPredictor::returning(Label::EarlyStage));
        let body = r#"{"name":"Asha","contact":"555","address":"X","features":[45,1,1,0,0,0,0,0,0,0,0,0,0,0,0]}"#;
        let response = app.oneshot(predict_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"], "Invalid input. Ensure correct fields and feature length.");
        assert_eq!(predictor.calls(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn malformed_json_returns_400() {
        let (app, _, store) = test_app(MockPredictor::returning(Label::EarlyStage));
        let response = app.oneshot(predict_request("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn oversized_body_gets_json_error() {
        let (app, predictor, store) = test_app(MockPredictor::returning(Label::EarlyStage));
        let long_name = "a".repeat(3 * 1024 * 1024);
        let body = ASHA.replace("Asha", &long_name);
        let response = app.oneshot(predict_request(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()["content-type"], "application/json");
        let json = response_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("length limit exceeded"));
        assert_eq!(predictor.calls(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn missing_content_type_is_still_validated() {
        let (app, _, _) = test_app(MockPredictor::returning(Label::EarlyStage));
        let req = Request::builder()
            .method("POST")
            .uri("/predict")
            .body(Body::from(ASHA))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn predictor_failure_returns_500_with_message() {
        let (app, _, store) = test_app(MockPredictor::failing("model exploded"));
        let response = app.oneshot(predict_request(ASHA)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = response_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("model exploded"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn store_failure_returns_500() {
        let (app, _, store) = test_app(MockPredictor::returning(Label::LowRisk));
        store.set_failing(true);
        let response = app.oneshot(predict_request(ASHA)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = response_json(response).await;
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let (app, _, _) = test_app(MockPredictor::returning(Label::LowRisk));
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        let id = response.headers().get("X-Request-Id").unwrap().to_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let (app, _, _) = test_app(MockPredictor::returning(Label::LowRisk));
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/predict")
            .header("Origin", "http://localhost:3000")
            .header("Access-Control-Request-Method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();

        assert!(response.status().is_success());
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn get_predict_is_not_allowed() {
        let (app, _, _) = test_app(MockPredictor::returning(Label::LowRisk));
        let req = Request::builder().uri("/predict").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let (app, _, _) = test_app(MockPredictor::returning(Label::LowRisk));
        let req = Request::builder().uri("/nonexistent").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
