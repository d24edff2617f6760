//! Engine configuration

use anyhow::Result;
use engine_lib::orchestrator::{OrchestratorConfig, VerdictThresholds, INFERENCE_TIMEOUT};
use engine_lib::patterns::DEFAULT_NUDGE_CAP;
use engine_lib::predictor::CalibrationMethod;
use serde::Deserialize;
use std::time::Duration;

/// Engine configuration, sourced from ENGINE_-prefixed environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Instance name for structured logs
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// API server port for predictions, health and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding one ONNX artifact per model family
    #[serde(default = "default_model_dir")]
    pub model_dir: String,

    /// Calibration transform: "platt" or "power"
    #[serde(default = "default_calibration_method")]
    pub calibration_method: String,

    /// Calibration factor; 1.0 is a no-op
    #[serde(default = "default_calibration_factor")]
    pub calibration_factor: f64,

    /// Per-model inference timeout in milliseconds
    #[serde(default = "default_inference_timeout_ms")]
    pub inference_timeout_ms: u64,

    /// Cap on the pattern nudge, in probability points
    #[serde(default = "default_pattern_nudge_cap")]
    pub pattern_nudge_cap: f64,

    /// Verdict cut points
    #[serde(default = "default_verdict_fail")]
    pub verdict_fail: f64,
    #[serde(default = "default_verdict_conditional")]
    pub verdict_conditional: f64,
    #[serde(default = "default_verdict_pass")]
    pub verdict_pass: f64,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "scoring-engine".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_model_dir() -> String {
    "/models".to_string()
}

fn default_calibration_method() -> String {
    "platt".to_string()
}

fn default_calibration_factor() -> f64 {
    1.0
}

fn default_inference_timeout_ms() -> u64 {
    INFERENCE_TIMEOUT.as_millis() as u64
}

fn default_pattern_nudge_cap() -> f64 {
    DEFAULT_NUDGE_CAP
}

fn default_verdict_fail() -> f64 {
    0.40
}

fn default_verdict_conditional() -> f64 {
    0.65
}

fn default_verdict_pass() -> f64 {
    0.80
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            api_port: default_api_port(),
            model_dir: default_model_dir(),
            calibration_method: default_calibration_method(),
            calibration_factor: default_calibration_factor(),
            inference_timeout_ms: default_inference_timeout_ms(),
            pattern_nudge_cap: default_pattern_nudge_cap(),
            verdict_fail: default_verdict_fail(),
            verdict_conditional: default_verdict_conditional(),
            verdict_pass: default_verdict_pass(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("ENGINE"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }

    /// Translate into the orchestrator's config
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let calibration_method = match self.calibration_method.as_str() {
            "power" => CalibrationMethod::Power,
            _ => CalibrationMethod::Platt,
        };
        OrchestratorConfig {
            verdict_thresholds: VerdictThresholds {
                fail: self.verdict_fail,
                conditional: self.verdict_conditional,
                pass: self.verdict_pass,
            },
            calibration_method,
            calibration_factor: self.calibration_factor,
            inference_timeout: Duration::from_millis(self.inference_timeout_ms),
            pattern_nudge_cap: self.pattern_nudge_cap,
            model_weights: Default::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.calibration_method, "platt");
        assert_eq!(config.calibration_factor, 1.0);
    }

    #[test]
    fn test_orchestrator_config_translation() {
        let mut config = EngineConfig::default();
        config.calibration_method = "power".to_string();
        config.verdict_pass = 0.85;

        let oc = config.orchestrator_config();
        assert_eq!(oc.calibration_method, CalibrationMethod::Power);
        assert_eq!(oc.verdict_thresholds.pass, 0.85);
        assert_eq!(oc.inference_timeout, INFERENCE_TIMEOUT);
    }

    #[test]
    fn test_unknown_calibration_method_falls_back_to_platt() {
        let mut config = EngineConfig::default();
        config.calibration_method = "isotonic".to_string();
        assert_eq!(
            config.orchestrator_config().calibration_method,
            CalibrationMethod::Platt
        );
    }
}
