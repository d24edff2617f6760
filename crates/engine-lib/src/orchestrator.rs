//! Top-level prediction orchestration
//!
//! Wires registry, adapters, pillar scorer, ensemble, calibrator and pattern
//! reconciler into one `predict()` call. Policy: always return a well-formed
//! prediction for any structurally valid feature vector. Individual model
//! failures and timeouts are logged and excluded from the ensemble; with zero
//! usable models the response carries the neutral prior and an empty
//! `models_used` so callers can tell "no signal" from "low success."

use crate::camp;
use crate::error::{ModelError, StructuralInputError};
use crate::features::FeatureVector;
use crate::models::{CombinedPrediction, PatternMatch, PillarScores, Prediction, Verdict};
use crate::observability::{EngineMetrics, StructuredLogger};
use crate::patterns::{pattern_adjustment, PatternLibrary, DEFAULT_NUDGE_CAP};
use crate::predictor::{
    calibrate, combine, confidence_interval, effective_sample_size, CalibrationMethod,
    ModelRegistry,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default per-model inference timeout.
pub const INFERENCE_TIMEOUT: Duration = Duration::from_millis(100);

/// Probability cut points for the human-facing verdict. Owned by the config
/// layer, not hard-coded in the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct VerdictThresholds {
    /// Below this: FAIL.
    pub fail: f64,
    /// Below this: CONDITIONAL.
    pub conditional: f64,
    /// At or below this: PASS; above: STRONG PASS.
    pub pass: f64,
}

impl Default for VerdictThresholds {
    fn default() -> Self {
        Self {
            fail: 0.40,
            conditional: 0.65,
            pass: 0.80,
        }
    }
}

impl VerdictThresholds {
    pub fn verdict(&self, probability: f64) -> Verdict {
        if probability < self.fail {
            Verdict::Fail
        } else if probability < self.conditional {
            Verdict::Conditional
        } else if probability <= self.pass {
            Verdict::Pass
        } else {
            Verdict::StrongPass
        }
    }
}

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub verdict_thresholds: VerdictThresholds,
    pub calibration_method: CalibrationMethod,
    /// 1.0 is a calibration no-op.
    pub calibration_factor: f64,
    /// Per-model invocation time box; a timed-out model is excluded exactly
    /// like a failed-to-load one.
    pub inference_timeout: Duration,
    /// Cap on the pattern nudge, in probability points.
    pub pattern_nudge_cap: f64,
    /// Optional per-model ensemble weights; missing ids default to 1.0.
    pub model_weights: BTreeMap<String, f64>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            verdict_thresholds: VerdictThresholds::default(),
            calibration_method: CalibrationMethod::Platt,
            calibration_factor: 1.0,
            inference_timeout: INFERENCE_TIMEOUT,
            pattern_nudge_cap: DEFAULT_NUDGE_CAP,
            model_weights: BTreeMap::new(),
        }
    }
}

/// The top-level entry point for scoring.
pub struct Orchestrator {
    registry: Arc<ModelRegistry>,
    patterns: PatternLibrary,
    config: OrchestratorConfig,
    metrics: EngineMetrics,
    logger: StructuredLogger,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<ModelRegistry>,
        config: OrchestratorConfig,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            registry,
            patterns: PatternLibrary::builtin(),
            config,
            metrics: EngineMetrics::new(),
            logger,
        }
    }

    /// Score one feature vector.
    ///
    /// Errors only for a structurally invalid vector; every other failure is
    /// absorbed into a degraded but well-formed prediction.
    pub async fn predict(&self, fv: &FeatureVector) -> Result<Prediction, StructuralInputError> {
        let start = Instant::now();

        if let Err(e) = fv.validate() {
            self.metrics.inc_structural_rejections();
            warn!(error = %e, "Rejected structurally invalid feature vector");
            return Err(e);
        }

        // Rule-based baseline; cannot fail.
        let pillars = camp::score(fv);

        let contributions = self.invoke_models(fv).await;

        let (raw, agreement) = combine(&contributions, &self.config.model_weights);
        let calibrated = calibrate(
            raw,
            self.config.calibration_method,
            self.config.calibration_factor,
        );
        let n = effective_sample_size(contributions.len(), fv.coverage());
        let interval = confidence_interval(calibrated, n);

        let matches = self.patterns.matches(fv);
        let adjustment =
            pattern_adjustment(&matches, calibrated, &interval, self.config.pattern_nudge_cap);
        if adjustment != 0.0 {
            self.metrics.inc_pattern_nudges();
            self.logger
                .log_pattern_nudge(&matches[0].pattern_name, adjustment);
        }
        let final_probability = calibrated + adjustment;

        let verdict = self.config.verdict_thresholds.verdict(final_probability);
        let models_used: Vec<String> = contributions.keys().cloned().collect();
        if models_used.is_empty() {
            self.logger.log_degraded_prediction();
        }
        let insights = build_insights(&pillars, &matches, &models_used, agreement);

        let prediction = Prediction {
            combined: CombinedPrediction {
                raw_probability: raw,
                calibrated_probability: calibrated,
                confidence_interval: interval,
                per_model_contributions: contributions,
                model_agreement: agreement,
                models_used: models_used.clone(),
            },
            pillars,
            patterns: matches,
            pattern_adjustment: adjustment,
            final_probability,
            verdict,
            insights,
        };

        self.metrics
            .observe_prediction_latency(start.elapsed().as_secs_f64());
        self.metrics.inc_predictions();
        self.logger.log_prediction(
            final_probability,
            verdict.as_str(),
            models_used.len(),
            agreement,
        );

        Ok(prediction)
    }

    /// Invoke every available model, time-boxed. Failures become log lines
    /// and metric increments, never request failures.
    ///
    /// Inference is synchronous, so each invocation runs on the blocking
    /// pool; the timeout races the join handle. A model that overruns is
    /// excluded exactly like one that failed to load, and its thread is
    /// detached rather than blocking the runtime.
    async fn invoke_models(&self, fv: &FeatureVector) -> BTreeMap<String, f64> {
        let mut contributions = BTreeMap::new();

        for handle in self.registry.available() {
            let started = Instant::now();
            let task = tokio::task::spawn_blocking({
                let handle = Arc::clone(&handle);
                let fv = fv.clone();
                move || handle.invoke(&fv)
            });
            let result = match tokio::time::timeout(self.config.inference_timeout, task).await {
                Ok(Ok(r)) => r,
                Ok(Err(join_error)) => Err(ModelError::Inference {
                    model_id: handle.id().to_string(),
                    source: anyhow::Error::new(join_error),
                }),
                Err(_) => Err(ModelError::Timeout {
                    model_id: handle.id().to_string(),
                    timeout_ms: self.config.inference_timeout.as_millis() as u64,
                }),
            };
            self.metrics.observe_model_latency(
                handle.family().as_str(),
                started.elapsed().as_secs_f64(),
            );

            match result {
                Ok(p) => {
                    debug!(model_id = handle.id(), probability = p, "Model contributed");
                    contributions.insert(handle.id().to_string(), p);
                }
                Err(e) => {
                    self.metrics.inc_model_failures();
                    self.logger.log_model_inference_failed(handle.id(), &e);
                }
            }
        }

        contributions
    }
}

/// Deterministic, human-readable rationale strings.
fn build_insights(
    pillars: &PillarScores,
    matches: &[PatternMatch],
    models_used: &[String],
    agreement: f64,
) -> Vec<String> {
    let mut insights = Vec::new();

    match models_used.len() {
        0 => insights.push(
            "No trained models were available; the probability reflects a neutral prior and \
             should be read alongside the CAMP pillar scores."
                .to_string(),
        ),
        1 => insights.push(
            "Only one model family contributed; nominal agreement of 1.0 carries low trust."
                .to_string(),
        ),
        n => {
            if agreement < 0.7 {
                insights.push(format!(
                    "The {} contributing model families disagree (agreement {:.2}); treat the \
                     point estimate with caution.",
                    n, agreement
                ));
            }
        }
    }

    let ranked = pillars.ranked();
    insights.push(format!(
        "Strongest pillar: {} ({:.2}).",
        ranked[0].0, ranked[0].1
    ));
    insights.push(format!(
        "Weakest pillar: {} ({:.2}).",
        ranked[3].0, ranked[3].1
    ));

    if let Some(top) = matches.first() {
        let (lo, hi) = top.expected_success_rate;
        insights.push(format!(
            "Resembles the '{}' archetype (confidence {:.2}); companies in this profile \
             historically succeed {:.0}%-{:.0}% of the time.",
            top.pattern_name,
            top.confidence,
            lo * 100.0,
            hi * 100.0
        ));
    }

    insights
}
