//! Startup scoring engine binary
//!
//! Loads model artifacts, wires the orchestrator and serves predictions,
//! health checks and Prometheus metrics over HTTP.

mod api;
mod config;

use anyhow::Result;
use engine_lib::{
    health::{components, HealthRegistry},
    observability::{EngineMetrics, StructuredLogger},
    orchestrator::Orchestrator,
    predictor::ModelRegistry,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = config::EngineConfig::load()?;
    info!(
        instance = %config.instance_name,
        model_dir = %config.model_dir,
        api_port = config.api_port,
        "Starting scoring engine"
    );

    let logger = StructuredLogger::new(&config.instance_name);
    let metrics = EngineMetrics::new();

    // Load model artifacts; a missing or corrupt family degrades the
    // ensemble but never prevents startup
    let registry = Arc::new(ModelRegistry::new());
    let usable = registry.load_dir(Path::new(&config.model_dir));
    for failure in registry.failures() {
        logger.log_model_load_failed(failure.family.as_str(), &failure.reason);
    }
    metrics.set_models_loaded(usable as i64);
    for handle in registry.available() {
        metrics.set_model_info(handle.family().as_str(), handle.model_version());
    }

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL_REGISTRY).await;
    health_registry.register(components::ORCHESTRATOR).await;

    let total_families = engine_lib::predictor::ModelFamily::ALL.len();
    if usable == 0 {
        health_registry
            .set_degraded(
                components::MODEL_REGISTRY,
                "No model artifacts loaded; serving neutral prior",
            )
            .await;
    } else if usable < total_families {
        health_registry
            .set_degraded(
                components::MODEL_REGISTRY,
                format!("{} of {} model families usable", usable, total_families),
            )
            .await;
    }

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&registry),
        config.orchestrator_config(),
        logger.clone(),
    ));

    let state = Arc::new(api::AppState::new(
        orchestrator,
        health_registry.clone(),
        metrics,
    ));

    health_registry.set_ready(true).await;
    logger.log_startup(ENGINE_VERSION, usable);

    // Serve until interrupted
    let api_port = config.api_port;
    let server = tokio::spawn(async move {
        if let Err(e) = api::serve(api_port, state).await {
            tracing::error!(error = %e, "API server failed");
        }
    });

    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("interrupt received");
    server.abort();

    Ok(())
}
