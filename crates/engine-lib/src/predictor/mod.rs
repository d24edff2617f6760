//! Multi-model prediction: adapters, registry, ensembling, calibration

mod adapters;
mod calibration;
mod ensemble;
mod registry;

pub use adapters::{adapter_for, ModelAdapter, ModelFamily, ModelInputView};
pub use calibration::{
    calibrate, confidence_interval, effective_sample_size, CalibrationMethod,
    PROBABILITY_EPSILON,
};
pub use ensemble::{combine, NEUTRAL_PROBABILITY};
pub use registry::{LoadFailure, ModelHandle, ModelRegistry, OnnxModel};

use anyhow::Result;

/// Seam between the registry and the underlying estimator.
///
/// Production models are ONNX artifacts behind [`OnnxModel`]; tests supply
/// trivial stand-ins. Implementations must be safe to share across concurrent
/// requests, which in practice means read-only after construction.
pub trait ProbabilityModel: Send + Sync {
    /// Map a prepared feature view to a success probability.
    ///
    /// The returned value is clamped into [0, 1] by the caller; trained
    /// estimators can emit slightly out-of-range values at numeric edges.
    fn infer(&self, view: &[f32]) -> Result<f32>;

    /// Version string of the underlying artifact.
    fn version(&self) -> &str;
}
