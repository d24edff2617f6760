//! Observability infrastructure for the scoring engine
//!
//! Provides:
//! - Prometheus metrics (prediction latency, per-family inference latency,
//!   failure counters, loaded-model info)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_histogram_vec, register_int_gauge, GaugeVec,
    Histogram, HistogramVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct EngineMetricsInner {
    prediction_latency_seconds: Histogram,
    model_inference_latency_seconds: HistogramVec,
    model_info: GaugeVec,
    models_loaded: IntGauge,
    predictions_generated: IntGauge,
    model_failures: IntGauge,
    structural_rejections: IntGauge,
    pattern_nudges: IntGauge,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "scoring_engine_prediction_latency_seconds",
                "End-to-end time spent serving one prediction",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            model_inference_latency_seconds: register_histogram_vec!(
                "scoring_engine_model_inference_latency_seconds",
                "Time spent invoking a single model family",
                &["family"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register model_inference_latency_seconds"),

            model_info: register_gauge_vec!(
                "scoring_engine_model_info",
                "Information about the currently loaded scoring models",
                &["family", "version"]
            )
            .expect("Failed to register model_info"),

            models_loaded: register_int_gauge!(
                "scoring_engine_models_loaded",
                "Number of model families with a usable handle"
            )
            .expect("Failed to register models_loaded"),

            predictions_generated: register_int_gauge!(
                "scoring_engine_predictions_generated_total",
                "Total number of predictions generated"
            )
            .expect("Failed to register predictions_generated"),

            model_failures: register_int_gauge!(
                "scoring_engine_model_failures_total",
                "Total number of per-model inference failures or timeouts"
            )
            .expect("Failed to register model_failures"),

            structural_rejections: register_int_gauge!(
                "scoring_engine_structural_rejections_total",
                "Total number of requests rejected for malformed feature vectors"
            )
            .expect("Failed to register structural_rejections"),

            pattern_nudges: register_int_gauge!(
                "scoring_engine_pattern_nudges_total",
                "Total number of predictions adjusted by a pattern match"
            )
            .expect("Failed to register pattern_nudges"),
        }
    }
}

/// Engine metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct EngineMetrics {
    // This is just a marker - we use the global instance
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record an end-to-end prediction latency observation
    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    /// Record a single model family's inference latency
    pub fn observe_model_latency(&self, family: &str, duration_secs: f64) {
        self.inner()
            .model_inference_latency_seconds
            .with_label_values(&[family])
            .observe(duration_secs);
    }

    /// Record a loaded model family and version
    pub fn set_model_info(&self, family: &str, version: &str) {
        self.inner()
            .model_info
            .with_label_values(&[family, version])
            .set(1.0);
    }

    /// Update the count of usable model handles
    pub fn set_models_loaded(&self, count: i64) {
        self.inner().models_loaded.set(count);
    }

    /// Increment predictions generated counter
    pub fn inc_predictions(&self) {
        self.inner().predictions_generated.inc();
    }

    /// Increment per-model failure counter
    pub fn inc_model_failures(&self) {
        self.inner().model_failures.inc();
    }

    /// Increment structural rejection counter
    pub fn inc_structural_rejections(&self) {
        self.inner().structural_rejections.inc();
    }

    /// Increment pattern nudge counter
    pub fn inc_pattern_nudges(&self) {
        self.inner().pattern_nudges.inc();
    }
}

/// Structured logger for engine events
///
/// Provides consistent JSON-formatted logging for predictions, model
/// failures, and degraded serving.
#[derive(Clone)]
pub struct StructuredLogger {
    instance_name: String,
}

impl StructuredLogger {
    pub fn new(instance_name: impl Into<String>) -> Self {
        Self {
            instance_name: instance_name.into(),
        }
    }

    /// Log a completed prediction
    pub fn log_prediction(
        &self,
        final_probability: f64,
        verdict: &str,
        models_used: usize,
        agreement: f64,
    ) {
        info!(
            event = "prediction_generated",
            instance = %self.instance_name,
            final_probability = final_probability,
            verdict = %verdict,
            models_used = models_used,
            agreement = agreement,
            "Generated prediction"
        );
    }

    /// Log a model family that failed to load at start-up
    pub fn log_model_load_failed(&self, family: &str, reason: &str) {
        warn!(
            event = "model_load_failed",
            instance = %self.instance_name,
            family = %family,
            reason = %reason,
            "Model family excluded from ensemble"
        );
    }

    /// Log a per-request model failure or timeout
    pub fn log_model_inference_failed(&self, model_id: &str, error: &dyn std::fmt::Display) {
        warn!(
            event = "model_inference_failed",
            instance = %self.instance_name,
            model_id = %model_id,
            error = %error,
            "Model excluded from this prediction"
        );
    }

    /// Log a prediction served with no trained model signal
    pub fn log_degraded_prediction(&self) {
        warn!(
            event = "degraded_prediction",
            instance = %self.instance_name,
            "Serving prediction with zero usable models; neutral prior in effect"
        );
    }

    /// Log a pattern nudge applied to the displayed probability
    pub fn log_pattern_nudge(&self, pattern: &str, delta: f64) {
        info!(
            event = "pattern_nudge",
            instance = %self.instance_name,
            pattern = %pattern,
            delta = delta,
            "Pattern match adjusted displayed probability"
        );
    }

    /// Log engine startup
    pub fn log_startup(&self, version: &str, models_loaded: usize) {
        info!(
            event = "engine_started",
            instance = %self.instance_name,
            engine_version = %version,
            models_loaded = models_loaded,
            "Scoring engine started"
        );
    }

    /// Log engine shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "engine_shutdown",
            instance = %self.instance_name,
            reason = %reason,
            "Scoring engine shutting down"
        );
    }
}
