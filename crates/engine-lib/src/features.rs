//! Canonical feature vector for startup scoring
//!
//! A strongly-typed record with a fixed schema. Unknown JSON keys are ignored
//! at the deserialization boundary and missing fields take the documented
//! defaults, so partial submissions are tolerated rather than rejected. The
//! vector is never mutated after construction; model-specific views are
//! derived copies.

use crate::error::StructuralInputError;
use serde::{Deserialize, Serialize};

/// Funding stage of the company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingStage {
    PreSeed,
    Seed,
    SeriesA,
    SeriesB,
    SeriesC,
    Growth,
    #[serde(other)]
    Unknown,
}

impl Default for FundingStage {
    fn default() -> Self {
        FundingStage::Unknown
    }
}

impl FundingStage {
    /// Ordinal position mapped into [0, 1]; unknown stages sit at the middle.
    pub fn ordinal(&self) -> f64 {
        match self {
            FundingStage::PreSeed => 0.0,
            FundingStage::Seed => 0.2,
            FundingStage::SeriesA => 0.4,
            FundingStage::SeriesB => 0.6,
            FundingStage::SeriesC => 0.8,
            FundingStage::Growth => 1.0,
            FundingStage::Unknown => 0.5,
        }
    }
}

/// Product maturity stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStage {
    Concept,
    Mvp,
    Beta,
    Launched,
    Growth,
    #[serde(other)]
    Unknown,
}

impl Default for ProductStage {
    fn default() -> Self {
        ProductStage::Unknown
    }
}

impl ProductStage {
    pub fn ordinal(&self) -> f64 {
        match self {
            ProductStage::Concept => 0.0,
            ProductStage::Mvp => 0.25,
            ProductStage::Beta => 0.5,
            ProductStage::Launched => 0.75,
            ProductStage::Growth => 1.0,
            ProductStage::Unknown => 0.5,
        }
    }
}

fn neutral_score() -> f64 {
    3.0
}

fn default_ndr() -> f64 {
    100.0
}

fn default_sector() -> String {
    "other".to_string()
}

/// Canonical, validated input record for one prediction request.
///
/// Fields are grouped by CAMP category (capital, advantage, market, people).
/// Monetary fields are USD; `*_percent` fields are percentages (100.0 = 100%);
/// `*_score` fields are 1-5 ordinals defaulting to the neutral 3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    // Capital
    #[serde(default)]
    pub funding_stage: FundingStage,
    #[serde(default)]
    pub total_capital_raised_usd: f64,
    #[serde(default)]
    pub cash_on_hand_usd: f64,
    #[serde(default)]
    pub monthly_burn_usd: f64,
    #[serde(default)]
    pub runway_months: f64,
    #[serde(default)]
    pub annual_revenue_run_rate_usd: f64,
    #[serde(default)]
    pub revenue_growth_rate_percent: f64,
    #[serde(default)]
    pub gross_margin_percent: f64,
    #[serde(default)]
    pub burn_multiple: f64,
    #[serde(default)]
    pub ltv_cac_ratio: f64,
    #[serde(default = "neutral_score")]
    pub investor_tier_score: f64,
    #[serde(default)]
    pub has_debt_financing: bool,

    // Advantage
    #[serde(default)]
    pub patent_count: u32,
    #[serde(default)]
    pub network_effects_present: bool,
    #[serde(default)]
    pub has_data_moat: bool,
    #[serde(default)]
    pub regulatory_advantage_present: bool,
    #[serde(default = "neutral_score")]
    pub tech_differentiation_score: f64,
    #[serde(default = "neutral_score")]
    pub switching_cost_score: f64,
    #[serde(default = "neutral_score")]
    pub brand_strength_score: f64,
    #[serde(default = "neutral_score")]
    pub scalability_score: f64,
    #[serde(default)]
    pub product_stage: ProductStage,
    #[serde(default)]
    pub product_retention_30d_percent: f64,
    #[serde(default)]
    pub product_retention_90d_percent: f64,

    // Market
    #[serde(default = "default_sector")]
    pub sector: String,
    #[serde(default)]
    pub tam_size_usd: f64,
    #[serde(default)]
    pub sam_size_usd: f64,
    #[serde(default)]
    pub som_size_usd: f64,
    #[serde(default)]
    pub market_growth_rate_percent: f64,
    #[serde(default)]
    pub customer_count: u32,
    #[serde(default)]
    pub customer_concentration_percent: f64,
    #[serde(default)]
    pub user_growth_rate_percent: f64,
    #[serde(default = "default_ndr")]
    pub net_dollar_retention_percent: f64,
    #[serde(default = "neutral_score")]
    pub competition_intensity_score: f64,
    #[serde(default)]
    pub named_competitor_count: u32,
    #[serde(default)]
    pub dau_mau_ratio: f64,

    // People
    #[serde(default)]
    pub founder_count: u32,
    #[serde(default)]
    pub team_size_full_time: u32,
    #[serde(default)]
    pub years_experience_avg: f64,
    #[serde(default)]
    pub domain_expertise_years_avg: f64,
    #[serde(default)]
    pub prior_startup_count: u32,
    #[serde(default)]
    pub prior_successful_exits: u32,
    #[serde(default = "neutral_score")]
    pub board_advisor_score: f64,
    #[serde(default)]
    pub advisor_count: u32,
    #[serde(default)]
    pub team_diversity_percent: f64,
    #[serde(default)]
    pub key_person_dependency: bool,
}

impl Default for FeatureVector {
    fn default() -> Self {
        serde_json::from_str("{}").expect("empty object deserializes to defaults")
    }
}

impl FeatureVector {
    /// Structural validation: the only check that can abort a request.
    ///
    /// Out-of-range but finite values are handled downstream by clamping
    /// normalizers; only non-finite floats are irrecoverable.
    pub fn validate(&self) -> Result<(), StructuralInputError> {
        for (name, value) in self.float_fields() {
            if !value.is_finite() {
                return Err(StructuralInputError(format!("{} is not finite", name)));
            }
        }
        Ok(())
    }

    /// Fraction of informative fields, used to scale the effective sample
    /// size behind the confidence interval. Sparse inputs widen the interval.
    pub fn coverage(&self) -> f64 {
        let mut informative = 0usize;
        let floats = self.float_fields();
        let total = floats.len() + 5;
        for (_, value) in &floats {
            if *value != 0.0 && *value != 3.0 && *value != 100.0 {
                informative += 1;
            }
        }
        if self.funding_stage != FundingStage::Unknown {
            informative += 1;
        }
        if self.product_stage != ProductStage::Unknown {
            informative += 1;
        }
        if self.sector != "other" {
            informative += 1;
        }
        if self.customer_count > 0 {
            informative += 1;
        }
        if self.team_size_full_time > 0 {
            informative += 1;
        }
        informative as f64 / total as f64
    }

    fn float_fields(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("total_capital_raised_usd", self.total_capital_raised_usd),
            ("cash_on_hand_usd", self.cash_on_hand_usd),
            ("monthly_burn_usd", self.monthly_burn_usd),
            ("runway_months", self.runway_months),
            ("annual_revenue_run_rate_usd", self.annual_revenue_run_rate_usd),
            ("revenue_growth_rate_percent", self.revenue_growth_rate_percent),
            ("gross_margin_percent", self.gross_margin_percent),
            ("burn_multiple", self.burn_multiple),
            ("ltv_cac_ratio", self.ltv_cac_ratio),
            ("investor_tier_score", self.investor_tier_score),
            ("tech_differentiation_score", self.tech_differentiation_score),
            ("switching_cost_score", self.switching_cost_score),
            ("brand_strength_score", self.brand_strength_score),
            ("scalability_score", self.scalability_score),
            (
                "product_retention_30d_percent",
                self.product_retention_30d_percent,
            ),
            (
                "product_retention_90d_percent",
                self.product_retention_90d_percent,
            ),
            ("tam_size_usd", self.tam_size_usd),
            ("sam_size_usd", self.sam_size_usd),
            ("som_size_usd", self.som_size_usd),
            ("market_growth_rate_percent", self.market_growth_rate_percent),
            (
                "customer_concentration_percent",
                self.customer_concentration_percent,
            ),
            ("user_growth_rate_percent", self.user_growth_rate_percent),
            (
                "net_dollar_retention_percent",
                self.net_dollar_retention_percent,
            ),
            (
                "competition_intensity_score",
                self.competition_intensity_score,
            ),
            ("dau_mau_ratio", self.dau_mau_ratio),
            ("years_experience_avg", self.years_experience_avg),
            ("domain_expertise_years_avg", self.domain_expertise_years_avg),
            ("board_advisor_score", self.board_advisor_score),
            ("team_diversity_percent", self.team_diversity_percent),
        ]
    }
}
