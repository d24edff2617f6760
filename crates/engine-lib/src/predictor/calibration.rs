//! Probability calibration and confidence intervals
//!
//! Corrects systematic bias in the raw ensemble probability and derives a
//! bounded Wilson-score interval whose width grows as the effective sample
//! size shrinks (fewer contributing models, sparser input coverage).

use crate::models::ConfidenceInterval;
use serde::{Deserialize, Serialize};

/// Clamp distance from exact 0/1 before any log or logit operation.
pub const PROBABILITY_EPSILON: f64 = 1e-7;

/// z for a 95% Wilson interval.
const WILSON_Z: f64 = 1.96;

/// Supported calibration transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationMethod {
    /// Platt-style: sigmoid(factor * logit(raw)). factor = 1.0 is a no-op.
    Platt,
    /// Power-style: raw ^ factor.
    Power,
}

fn clamp_probability(p: f64) -> f64 {
    p.clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON)
}

/// Map the raw combined probability to a calibrated one. Input is
/// epsilon-clamped away from 0/1 so the logit/log never blows up; output is
/// clamped the same way.
pub fn calibrate(raw: f64, method: CalibrationMethod, factor: f64) -> f64 {
    let p = clamp_probability(raw);
    let calibrated = match method {
        CalibrationMethod::Platt => {
            let logit = (p / (1.0 - p)).ln();
            let scaled = factor * logit;
            1.0 / (1.0 + (-scaled).exp())
        }
        CalibrationMethod::Power => p.powf(factor),
    };
    clamp_probability(calibrated)
}

/// Effective sample size backing the interval: contributing models carry
/// most of the weight, input coverage the rest. Floored so the interval is
/// never degenerate.
pub fn effective_sample_size(models_used: usize, feature_coverage: f64) -> f64 {
    (12.0 * models_used as f64 + 8.0 * feature_coverage.clamp(0.0, 1.0)).max(4.0)
}

/// Wilson score interval around the calibrated probability.
///
/// Always satisfies `lower <= p <= upper` with both bounds in [0, 1].
pub fn confidence_interval(p: f64, effective_n: f64) -> ConfidenceInterval {
    let n = effective_n.max(1.0);
    let p_hat = p.clamp(0.0, 1.0);
    let z2 = WILSON_Z * WILSON_Z;

    let denom = 1.0 + z2 / n;
    let center = p_hat + z2 / (2.0 * n);
    let margin = WILSON_Z * (p_hat * (1.0 - p_hat) / n + z2 / (4.0 * n * n)).sqrt();

    let lower = ((center - margin) / denom).clamp(0.0, 1.0).min(p_hat);
    let upper = ((center + margin) / denom).clamp(0.0, 1.0).max(p_hat);

    ConfidenceInterval { lower, upper }
}
