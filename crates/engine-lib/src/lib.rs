//! Core library for startup success scoring
//!
//! This crate provides the core functionality for:
//! - Canonical feature vector validation
//! - Rule-based CAMP pillar scoring
//! - Multi-model ensemble prediction with calibration
//! - Pattern archetype reconciliation
//! - Health checks and observability

pub mod camp;
pub mod error;
pub mod features;
pub mod health;
pub mod models;
pub mod observability;
pub mod orchestrator;
pub mod patterns;
pub mod predictor;

pub use error::{ModelError, StructuralInputError};
pub use features::{FeatureVector, FundingStage, ProductStage};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{EngineMetrics, StructuredLogger};
pub use orchestrator::{Orchestrator, OrchestratorConfig, VerdictThresholds};
pub use patterns::PatternLibrary;
pub use predictor::{ModelFamily, ModelHandle, ModelRegistry, ProbabilityModel};
