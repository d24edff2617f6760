//! Integration tests for the scoring engine API endpoints

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use engine_lib::{
    health::{components, ComponentStatus, HealthRegistry},
    observability::{EngineMetrics, StructuredLogger},
    orchestrator::{Orchestrator, OrchestratorConfig},
    predictor::{ModelFamily, ModelHandle, ModelRegistry, ProbabilityModel},
    FeatureVector,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

struct ConstModel(f32);

impl ProbabilityModel for ConstModel {
    fn infer(&self, _view: &[f32]) -> anyhow::Result<f32> {
        Ok(self.0)
    }

    fn version(&self) -> &str {
        "test"
    }
}

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub health_registry: HealthRegistry,
    pub metrics: EngineMetrics,
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(feature_vector): Json<FeatureVector>,
) -> impl IntoResponse {
    match state.orchestrator.predict(&feature_vector).await {
        Ok(prediction) => (StatusCode::OK, Json(json!(prediction))),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;
    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;
    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(readiness))
}

async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

fn create_test_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn setup_test_app(models: Vec<(&str, ModelFamily, f32)>) -> (Router, Arc<AppState>) {
    let registry = Arc::new(ModelRegistry::new());
    for (id, family, p) in models {
        registry.register(ModelHandle::new(id, family, Box::new(ConstModel(p))));
    }
    let orchestrator = Arc::new(Orchestrator::new(
        registry,
        OrchestratorConfig::default(),
        StructuredLogger::new("test-engine"),
    ));

    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL_REGISTRY).await;
    health_registry.register(components::ORCHESTRATOR).await;

    let metrics = EngineMetrics::new();
    let state = Arc::new(AppState {
        orchestrator,
        health_registry,
        metrics,
    });
    let router = create_test_router(state.clone());

    (router, state)
}

fn predict_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_predict_with_empty_registry_serves_neutral_prior() {
    let (app, _state) = setup_test_app(vec![]).await;

    let response = app.oneshot(predict_request(json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let prediction: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(prediction["combined"]["raw_probability"], 0.5);
    assert_eq!(prediction["combined"]["model_agreement"], 0.0);
    assert_eq!(
        prediction["combined"]["models_used"]
            .as_array()
            .unwrap()
            .len(),
        0
    );
}

#[tokio::test]
async fn test_predict_returns_full_response_shape() {
    let (app, _state) = setup_test_app(vec![
        ("dna-v1", ModelFamily::Dna, 0.7),
        ("temporal-v1", ModelFamily::Temporal, 0.6),
    ])
    .await;

    let response = app
        .oneshot(predict_request(json!({
            "funding_stage": "series_a",
            "total_capital_raised_usd": 20_000_000.0,
            "annual_revenue_run_rate_usd": 5_000_000.0
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let prediction: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert!(prediction["final_probability"].is_number());
    assert!(prediction["verdict"].is_string());
    assert!(prediction["pillars"]["capital"].is_number());
    assert!(prediction["combined"]["confidence_interval"]["lower"].is_number());
    assert!(prediction["insights"].is_array());
    assert_eq!(
        prediction["combined"]["models_used"],
        json!(["dna-v1", "temporal-v1"])
    );
}

#[tokio::test]
async fn test_predict_ignores_unknown_fields() {
    let (app, _state) = setup_test_app(vec![("dna-v1", ModelFamily::Dna, 0.6)]).await;

    let response = app
        .oneshot(predict_request(json!({
            "runway_months": 18.0,
            "field_from_a_future_schema": "ignored",
            "another_unknown": 42
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_predict_rejects_non_finite_input() {
    let (app, _state) = setup_test_app(vec![("dna-v1", ModelFamily::Dna, 0.6)]).await;

    // JSON has no NaN literal, so malformed numerics surface as a parse
    // failure before the orchestrator sees them
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"runway_months": NaN}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state) = setup_test_app(vec![]).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["model_registry"].is_object());
    assert!(health["components"]["orchestrator"].is_object());
}

#[tokio::test]
async fn test_healthz_returns_ok_when_degraded() {
    let (app, state) = setup_test_app(vec![]).await;

    state
        .health_registry
        .set_degraded(components::MODEL_REGISTRY, "2 of 4 model families usable")
        .await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Degraded still returns 200 (operational)
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(health["status"], "degraded");
}

#[tokio::test]
async fn test_readyz_transitions_with_ready_flag() {
    let (app, state) = setup_test_app(vec![]).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    state.health_registry.set_ready(true).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readyz_returns_503_when_ready_but_unhealthy() {
    let (app, state) = setup_test_app(vec![]).await;

    state.health_registry.set_ready(true).await;
    state
        .health_registry
        .set_unhealthy(components::MODEL_REGISTRY, "Failed")
        .await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, state) = setup_test_app(vec![]).await;

    state.metrics.observe_prediction_latency(0.001);
    state.metrics.observe_model_latency("dna", 0.0005);
    state.metrics.set_models_loaded(2);
    state.metrics.set_model_info("dna", "v1.0.0");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("scoring_engine_prediction_latency_seconds"));
    assert!(metrics_text.contains("scoring_engine_model_inference_latency_seconds"));
    assert!(metrics_text.contains("scoring_engine_models_loaded"));
    assert!(metrics_text.contains("scoring_engine_model_info"));
}

#[tokio::test]
async fn test_prediction_updates_counters() {
    let (app, _state) = setup_test_app(vec![("stage-v1", ModelFamily::Stage, 0.55)]).await;

    let response = app
        .clone()
        .oneshot(predict_request(json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("scoring_engine_predictions_generated_total"));
}
