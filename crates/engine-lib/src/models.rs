//! Output records for the scoring engine
//!
//! Everything here is request-scoped and immutable once assembled. Timestamps
//! are deliberately absent so identical inputs produce identical outputs;
//! request timing lives in logs and metrics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bounded confidence interval around the calibrated probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn contains(&self, p: f64) -> bool {
        self.lower <= p && p <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Stage-specific weights applied to the four pillars. Sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PillarWeights {
    pub capital: f64,
    pub advantage: f64,
    pub market: f64,
    pub people: f64,
}

/// The four rule-based CAMP sub-scores, each in [0, 1], plus the weights
/// used and the resulting weighted overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PillarScores {
    pub capital: f64,
    pub advantage: f64,
    pub market: f64,
    pub people: f64,
    pub weights: PillarWeights,
    pub weighted_overall: f64,
}

impl PillarScores {
    /// (name, score) pairs ordered strongest first.
    pub fn ranked(&self) -> [(&'static str, f64); 4] {
        let mut pairs = [
            ("capital", self.capital),
            ("advantage", self.advantage),
            ("market", self.market),
            ("people", self.people),
        ];
        pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        pairs
    }
}

/// Ensemble output before pattern reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedPrediction {
    pub raw_probability: f64,
    pub calibrated_probability: f64,
    pub confidence_interval: ConfidenceInterval,
    /// model_id -> probability, for explainability.
    pub per_model_contributions: BTreeMap<String, f64>,
    /// 1.0 minus the normalized spread across contributing probabilities.
    /// Exactly 1.0 when a single model contributed; callers must also check
    /// `models_used` before trusting it.
    pub model_agreement: f64,
    /// Ids of the models that actually participated. Empty means the engine
    /// had no trained signal and `raw_probability` is the neutral prior.
    pub models_used: Vec<String>,
}

/// One archetype match, ranked by confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub pattern_name: String,
    pub confidence: f64,
    pub category: String,
    pub expected_success_rate: (f64, f64),
}

/// Discretized human-facing label derived from the final probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "FAIL")]
    Fail,
    #[serde(rename = "CONDITIONAL")]
    Conditional,
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "STRONG PASS")]
    StrongPass,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Fail => "FAIL",
            Verdict::Conditional => "CONDITIONAL",
            Verdict::Pass => "PASS",
            Verdict::StrongPass => "STRONG PASS",
        }
    }
}

/// Final output record for one `predict()` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub combined: CombinedPrediction,
    pub pillars: PillarScores,
    pub patterns: Vec<PatternMatch>,
    /// Bounded delta applied by the pattern reconciler; zero when no
    /// high-confidence pattern matched.
    pub pattern_adjustment: f64,
    /// Displayed probability: calibrated probability plus the pattern
    /// adjustment, always inside the confidence interval.
    pub final_probability: f64,
    pub verdict: Verdict,
    pub insights: Vec<String>,
}
