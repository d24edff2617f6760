//! Per-family model adapters
//!
//! Each trained model family expects an exact, ordered feature view derived
//! from the canonical vector, including engineered columns that were part of
//! its training contract. `prepare` is pure and deterministic; column order
//! and derived-value formulas must match the published schema for the family
//! or predictions are silently wrong. Beyond a length check at invoke time
//! there is no runtime validation against this.

use crate::camp::{
    normalize_burn_multiple, normalize_bool, normalize_count, normalize_monetary,
    normalize_ordinal, normalize_percent, normalize_ratio, CAPITAL_RAISED_CEILING_USD,
    CASH_CEILING_USD, DAU_MAU_GOOD, LTV_CAC_GOOD, NEUTRAL, RUNWAY_CEILING_MONTHS,
    SAM_CEILING_USD, TAM_CEILING_USD,
};
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};

/// The four independently trained model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Behavioral "DNA" model over efficiency and team signals.
    Dna,
    /// Growth-trajectory model over time-sensitive signals.
    Temporal,
    /// Sector-aware model over market structure signals.
    Industry,
    /// Funding-stage model over capital maturity signals.
    Stage,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 4] = [
        ModelFamily::Dna,
        ModelFamily::Temporal,
        ModelFamily::Industry,
        ModelFamily::Stage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::Dna => "dna",
            ModelFamily::Temporal => "temporal",
            ModelFamily::Industry => "industry",
            ModelFamily::Stage => "stage",
        }
    }

    /// Artifact file name under the model directory.
    pub fn artifact_name(&self) -> String {
        format!("{}.onnx", self.as_str())
    }
}

/// Prepared, ordered feature view for one model invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInputView {
    columns: Vec<f32>,
}

impl ModelInputView {
    pub fn as_slice(&self) -> &[f32] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Translates the canonical vector into one family's expected view.
pub trait ModelAdapter: Send + Sync {
    fn family(&self) -> ModelFamily;

    /// Ordered column names this family's artifact was trained against.
    fn schema(&self) -> &'static [&'static str];

    /// Pure, deterministic view construction. Non-computable derived fields
    /// fall back to the neutral 0.5 rather than failing.
    fn prepare(&self, fv: &FeatureVector) -> ModelInputView;
}

/// Adapter lookup by family.
pub fn adapter_for(family: ModelFamily) -> Box<dyn ModelAdapter> {
    match family {
        ModelFamily::Dna => Box::new(DnaAdapter),
        ModelFamily::Temporal => Box::new(TemporalAdapter),
        ModelFamily::Industry => Box::new(IndustryAdapter),
        ModelFamily::Stage => Box::new(StageAdapter),
    }
}

// Derived columns shared across families. Formulas are part of the model
// training contracts; do not change without re-exporting artifacts.

/// Mean of normalized revenue growth, user growth and 30-day retention.
fn growth_momentum(fv: &FeatureVector) -> f64 {
    (normalize_percent(fv.revenue_growth_rate_percent, -100.0, 200.0)
        + normalize_percent(fv.user_growth_rate_percent, -100.0, 200.0)
        + normalize_percent(fv.product_retention_30d_percent, 0.0, 100.0))
        / 3.0
}

/// Revenue run-rate relative to annualized burn; neutral when there is no
/// burn to divide by. A ratio of 2.0 or better saturates at 1.0.
fn burn_efficiency(fv: &FeatureVector) -> f64 {
    let annual_burn = fv.monthly_burn_usd * 12.0;
    if annual_burn <= 0.0 {
        return NEUTRAL;
    }
    ((fv.annual_revenue_run_rate_usd / annual_burn) / 2.0).clamp(0.0, 1.0)
}

/// 90-day retention as a fraction of 30-day retention; neutral when 30-day
/// retention is zero.
fn retention_decay(fv: &FeatureVector) -> f64 {
    if fv.product_retention_30d_percent <= 0.0 {
        return NEUTRAL;
    }
    (fv.product_retention_90d_percent / fv.product_retention_30d_percent).clamp(0.0, 1.0)
}

/// Inverse of normalized runway: 1.0 means the company is out of road.
fn runway_pressure(fv: &FeatureVector) -> f64 {
    1.0 - normalize_ratio(fv.runway_months, RUNWAY_CEILING_MONTHS)
}

/// Fixed sector vocabulary for the industry model. Unknown sectors map to
/// the trailing catch-all index.
const SECTORS: &[&str] = &[
    "saas",
    "fintech",
    "healthtech",
    "ecommerce",
    "ai_ml",
    "biotech",
    "edtech",
    "climate",
    "gaming",
    "other",
];

fn sector_index(sector: &str) -> f64 {
    let lower = sector.to_ascii_lowercase();
    let idx = SECTORS
        .iter()
        .position(|s| *s == lower)
        .unwrap_or(SECTORS.len() - 1);
    idx as f64 / (SECTORS.len() - 1) as f64
}

fn view(columns: Vec<f64>) -> ModelInputView {
    ModelInputView {
        columns: columns.into_iter().map(|v| v as f32).collect(),
    }
}

struct DnaAdapter;

impl ModelAdapter for DnaAdapter {
    fn family(&self) -> ModelFamily {
        ModelFamily::Dna
    }

    fn schema(&self) -> &'static [&'static str] {
        &[
            "capital_raised",
            "burn_efficiency",
            "runway",
            "revenue_growth",
            "retention_30d",
            "ltv_cac",
            "tech_differentiation",
            "network_effects",
            "founder_experience",
            "prior_exits",
            "team_size",
            "growth_momentum",
        ]
    }

    fn prepare(&self, fv: &FeatureVector) -> ModelInputView {
        view(vec![
            normalize_monetary(fv.total_capital_raised_usd, CAPITAL_RAISED_CEILING_USD),
            burn_efficiency(fv),
            normalize_ratio(fv.runway_months, RUNWAY_CEILING_MONTHS),
            normalize_percent(fv.revenue_growth_rate_percent, -100.0, 200.0),
            normalize_percent(fv.product_retention_30d_percent, 0.0, 100.0),
            normalize_ratio(fv.ltv_cac_ratio, LTV_CAC_GOOD),
            normalize_ordinal(fv.tech_differentiation_score),
            normalize_bool(fv.network_effects_present),
            normalize_ratio(fv.years_experience_avg, 15.0),
            normalize_ratio(fv.prior_successful_exits as f64, 2.0),
            normalize_count(fv.team_size_full_time, 250),
            growth_momentum(fv),
        ])
    }
}

struct TemporalAdapter;

impl ModelAdapter for TemporalAdapter {
    fn family(&self) -> ModelFamily {
        ModelFamily::Temporal
    }

    fn schema(&self) -> &'static [&'static str] {
        &[
            "runway",
            "runway_pressure",
            "revenue_growth",
            "user_growth",
            "net_dollar_retention",
            "retention_30d",
            "retention_decay",
            "burn_multiple",
            "market_growth",
            "growth_momentum",
        ]
    }

    fn prepare(&self, fv: &FeatureVector) -> ModelInputView {
        view(vec![
            normalize_ratio(fv.runway_months, RUNWAY_CEILING_MONTHS),
            runway_pressure(fv),
            normalize_percent(fv.revenue_growth_rate_percent, -100.0, 200.0),
            normalize_percent(fv.user_growth_rate_percent, -100.0, 200.0),
            normalize_percent(fv.net_dollar_retention_percent, 50.0, 150.0),
            normalize_percent(fv.product_retention_30d_percent, 0.0, 100.0),
            retention_decay(fv),
            normalize_burn_multiple(fv.burn_multiple),
            normalize_percent(fv.market_growth_rate_percent, 0.0, 100.0),
            growth_momentum(fv),
        ])
    }
}

struct IndustryAdapter;

impl ModelAdapter for IndustryAdapter {
    fn family(&self) -> ModelFamily {
        ModelFamily::Industry
    }

    fn schema(&self) -> &'static [&'static str] {
        &[
            "sector_index",
            "tam",
            "sam",
            "market_growth",
            "competition",
            "customer_concentration",
            "named_competitors",
            "dau_mau",
            "net_dollar_retention",
            "user_growth",
        ]
    }

    fn prepare(&self, fv: &FeatureVector) -> ModelInputView {
        view(vec![
            sector_index(&fv.sector),
            normalize_monetary(fv.tam_size_usd, TAM_CEILING_USD),
            normalize_monetary(fv.sam_size_usd, SAM_CEILING_USD),
            normalize_percent(fv.market_growth_rate_percent, 0.0, 100.0),
            1.0 - normalize_ordinal(fv.competition_intensity_score),
            1.0 - normalize_percent(fv.customer_concentration_percent, 0.0, 100.0),
            normalize_count(fv.named_competitor_count, 50),
            normalize_ratio(fv.dau_mau_ratio, DAU_MAU_GOOD),
            normalize_percent(fv.net_dollar_retention_percent, 50.0, 150.0),
            normalize_percent(fv.user_growth_rate_percent, -100.0, 200.0),
        ])
    }
}

struct StageAdapter;

impl ModelAdapter for StageAdapter {
    fn family(&self) -> ModelFamily {
        ModelFamily::Stage
    }

    fn schema(&self) -> &'static [&'static str] {
        &[
            "funding_stage",
            "capital_raised",
            "cash_on_hand",
            "burn_multiple",
            "runway",
            "team_size",
            "prior_startups",
            "investor_tier",
            "revenue_growth",
        ]
    }

    fn prepare(&self, fv: &FeatureVector) -> ModelInputView {
        view(vec![
            fv.funding_stage.ordinal(),
            normalize_monetary(fv.total_capital_raised_usd, CAPITAL_RAISED_CEILING_USD),
            normalize_monetary(fv.cash_on_hand_usd, CASH_CEILING_USD),
            normalize_burn_multiple(fv.burn_multiple),
            normalize_ratio(fv.runway_months, RUNWAY_CEILING_MONTHS),
            normalize_count(fv.team_size_full_time, 250),
            normalize_ratio(fv.prior_startup_count as f64, 3.0),
            normalize_ordinal(fv.investor_tier_score),
            normalize_percent(fv.revenue_growth_rate_percent, -100.0, 200.0),
        ])
    }
}
