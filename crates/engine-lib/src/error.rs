//! Error taxonomy for the scoring engine
//!
//! Only `StructuralInputError` aborts a request. Everything model-related is
//! recovered locally: a failing model is excluded from the ensemble and the
//! caller sees the degradation through `models_used` and the interval width.

use thiserror::Error;

/// The feature vector is malformed beyond recoverable defaults.
///
/// This is the only error class that aborts a request before producing a
/// prediction.
#[derive(Debug, Clone, Error)]
#[error("invalid feature vector: {0}")]
pub struct StructuralInputError(pub String);

/// Per-model failure during a single prediction.
///
/// Consumed as data by the ensemble combiner: only `Ok` probabilities
/// contribute, so excluding failed models is a data-flow fact rather than
/// exception-driven branching.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model family '{family}' has no usable handle")]
    Unavailable { family: String },

    #[error("inference failed for model '{model_id}': {source}")]
    Inference {
        model_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("inference timed out for model '{model_id}' after {timeout_ms}ms")]
    Timeout { model_id: String, timeout_ms: u64 },

    #[error("prepared view for model '{model_id}' has {got} columns, schema expects {expected}")]
    SchemaMismatch {
        model_id: String,
        expected: usize,
        got: usize,
    },
}

impl ModelError {
    /// Model id (or family) this error is attributed to, for logging.
    pub fn model_id(&self) -> &str {
        match self {
            ModelError::Unavailable { family } => family,
            ModelError::Inference { model_id, .. } => model_id,
            ModelError::Timeout { model_id, .. } => model_id,
            ModelError::SchemaMismatch { model_id, .. } => model_id,
        }
    }
}
