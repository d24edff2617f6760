//! Model registry: owns the loaded sub-models
//!
//! Loads one ONNX artifact per model family via tract and is the single
//! source of truth for which models are usable right now. Loading is never
//! all-or-nothing: a family whose artifact is missing or corrupt is recorded
//! as a failure and simply excluded from ensembling. Handles are read-only
//! after load and shared freely across concurrent requests.

use super::adapters::{adapter_for, ModelAdapter, ModelFamily};
use super::ProbabilityModel;
use crate::error::ModelError;
use crate::features::FeatureVector;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::{Arc, RwLock};
use tract_onnx::prelude::*;
use tracing::{debug, info, warn};

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-backed probability model using tract for lightweight inference.
pub struct OnnxModel {
    plan: TractModel,
    version: String,
    input_width: usize,
}

impl OnnxModel {
    /// Load and optimize an ONNX artifact from bytes. The input shape is
    /// pinned to `[1, input_width]`; a schema-incompatible artifact fails
    /// here rather than at inference time.
    pub fn load(model_bytes: &[u8], input_width: usize, version: &str) -> Result<Self> {
        let plan = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, input_width]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(Self {
            plan,
            version: version.to_string(),
            input_width,
        })
    }
}

impl ProbabilityModel for OnnxModel {
    fn infer(&self, view: &[f32]) -> Result<f32> {
        let input: Tensor =
            tract_ndarray::Array2::from_shape_vec((1, self.input_width), view.to_vec())
                .context("Feature view does not match model input shape")?
                .into();
        let result = self.plan.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;
        let values = output.to_array_view::<f32>()?;
        values
            .iter()
            .next()
            .copied()
            .context("Model output tensor is empty")
    }

    fn version(&self) -> &str {
        &self.version
    }
}

/// One loaded sub-model: family adapter plus the underlying estimator.
pub struct ModelHandle {
    id: String,
    family: ModelFamily,
    adapter: Box<dyn ModelAdapter>,
    model: Box<dyn ProbabilityModel>,
}

impl ModelHandle {
    pub fn new(id: impl Into<String>, family: ModelFamily, model: Box<dyn ProbabilityModel>) -> Self {
        Self {
            id: id.into(),
            family,
            adapter: adapter_for(family),
            model,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn family(&self) -> ModelFamily {
        self.family
    }

    pub fn model_version(&self) -> &str {
        self.model.version()
    }

    /// Prepare this family's feature view and run the estimator.
    ///
    /// The returned probability is defensively clamped into [0, 1].
    pub fn invoke(&self, fv: &FeatureVector) -> Result<f64, ModelError> {
        let view = self.adapter.prepare(fv);
        let expected = self.adapter.schema().len();
        if view.len() != expected {
            return Err(ModelError::SchemaMismatch {
                model_id: self.id.clone(),
                expected,
                got: view.len(),
            });
        }
        let p = self
            .model
            .infer(view.as_slice())
            .map_err(|source| ModelError::Inference {
                model_id: self.id.clone(),
                source,
            })?;
        Ok((p as f64).clamp(0.0, 1.0))
    }
}

/// Structured record of a family that failed to load.
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub family: ModelFamily,
    pub reason: String,
}

/// Owns the set of usable [`ModelHandle`]s.
///
/// Constructed once at process start and injected into the orchestrator.
/// Read-only during steady-state serving; the locks exist for load time and
/// optional hot-reload.
pub struct ModelRegistry {
    handles: RwLock<Vec<Arc<ModelHandle>>>,
    failures: RwLock<Vec<LoadFailure>>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            handles: RwLock::new(Vec::new()),
            failures: RwLock::new(Vec::new()),
        }
    }

    /// Attempt to load every family's artifact from `dir`. Failures are
    /// recorded and skipped; returns the number of usable handles.
    pub fn load_dir(&self, dir: &Path) -> usize {
        for family in ModelFamily::ALL {
            if let Err(e) = self.load_family(dir, family) {
                let reason = format!("{:#}", e);
                warn!(family = family.as_str(), reason = %reason, "Model artifact unusable, excluding family");
                self.record_failure(family, reason);
            }
        }
        let usable = self.len();
        info!(usable, "Model registry loaded");
        usable
    }

    fn load_family(&self, dir: &Path, family: ModelFamily) -> Result<()> {
        let path = dir.join(family.artifact_name());
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read artifact {}", path.display()))?;
        let width = adapter_for(family).schema().len();
        let model = OnnxModel::load(&bytes, width, "v1.0.0")
            .with_context(|| format!("Failed to load artifact {}", path.display()))?;
        self.register(ModelHandle::new(
            format!("{}-v1", family.as_str()),
            family,
            Box::new(model),
        ));
        debug!(family = family.as_str(), "Model artifact loaded");
        Ok(())
    }

    /// Register an already-constructed handle. Also the seam tests use to
    /// install non-ONNX estimators.
    pub fn register(&self, handle: ModelHandle) {
        let mut handles = match self.handles.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        handles.push(Arc::new(handle));
    }

    fn record_failure(&self, family: ModelFamily, reason: String) {
        let mut failures = match self.failures.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        failures.push(LoadFailure { family, reason });
    }

    /// Currently usable handles. Cheap clones of shared pointers; safe to
    /// call concurrently with predictions.
    pub fn available(&self) -> Vec<Arc<ModelHandle>> {
        let handles = match self.handles.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        handles.clone()
    }

    /// Families that failed to load, with reasons.
    pub fn failures(&self) -> Vec<LoadFailure> {
        let failures = match self.failures.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        failures.clone()
    }

    pub fn len(&self) -> usize {
        self.available().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ConstModel(f32);

    impl ProbabilityModel for ConstModel {
        fn infer(&self, _view: &[f32]) -> Result<f32> {
            Ok(self.0)
        }

        fn version(&self) -> &str {
            "test"
        }
    }

    struct FailingModel;

    impl ProbabilityModel for FailingModel {
        fn infer(&self, _view: &[f32]) -> Result<f32> {
            anyhow::bail!("estimator exploded")
        }

        fn version(&self) -> &str {
            "test"
        }
    }

    #[test]
    fn test_missing_artifacts_recorded_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new();
        let usable = registry.load_dir(dir.path());

        assert_eq!(usable, 0);
        assert!(registry.is_empty());
        let failures = registry.failures();
        assert_eq!(failures.len(), ModelFamily::ALL.len());
        assert!(failures[0].reason.contains("Failed to read artifact"));
    }

    #[test]
    fn test_corrupt_artifact_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dna.onnx"), b"not an onnx file").unwrap();
        let registry = ModelRegistry::new();
        registry.load_dir(dir.path());

        assert!(registry.is_empty());
        assert!(registry
            .failures()
            .iter()
            .any(|f| f.family == ModelFamily::Dna));
    }

    #[test]
    fn test_registered_handle_available_and_invocable() {
        let registry = ModelRegistry::new();
        registry.register(ModelHandle::new(
            "dna-v1",
            ModelFamily::Dna,
            Box::new(ConstModel(0.7)),
        ));

        let handles = registry.available();
        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].id(), "dna-v1");

        let p = handles[0].invoke(&FeatureVector::default()).unwrap();
        assert!((p - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_invoke_clamps_out_of_range_output() {
        let handle = ModelHandle::new("dna-v1", ModelFamily::Dna, Box::new(ConstModel(1.4)));
        let p = handle.invoke(&FeatureVector::default()).unwrap();
        assert_eq!(p, 1.0);

        let handle = ModelHandle::new("dna-v1", ModelFamily::Dna, Box::new(ConstModel(-0.3)));
        let p = handle.invoke(&FeatureVector::default()).unwrap();
        assert_eq!(p, 0.0);
    }

    #[test]
    fn test_invoke_surfaces_inference_error() {
        let handle = ModelHandle::new("temporal-v1", ModelFamily::Temporal, Box::new(FailingModel));
        let err = handle.invoke(&FeatureVector::default()).unwrap_err();
        assert!(matches!(err, ModelError::Inference { .. }));
        assert_eq!(err.model_id(), "temporal-v1");
    }
}
