//! Rule-based CAMP pillar scoring
//!
//! Computes the four pillar scores (Capital, Advantage, Market, People) from
//! hand-authored normalization rules, independent of any trained model. This
//! exists so operators can sanity-check ensemble output against a transparent
//! baseline. Every branch has a defined default; nothing here can abort a
//! prediction.

use crate::features::{FeatureVector, FundingStage};
use crate::models::{PillarScores, PillarWeights};

/// Neutral score used when a value cannot be resolved.
pub const NEUTRAL: f64 = 0.5;

// Fixed ceilings for log-scale monetary normalization. A value at or above
// the ceiling scores 1.0.
pub const CAPITAL_RAISED_CEILING_USD: f64 = 100_000_000.0;
pub const CASH_CEILING_USD: f64 = 50_000_000.0;
pub const REVENUE_CEILING_USD: f64 = 100_000_000.0;
pub const TAM_CEILING_USD: f64 = 50_000_000_000.0;
pub const SAM_CEILING_USD: f64 = 5_000_000_000.0;
pub const SOM_CEILING_USD: f64 = 500_000_000.0;

/// Months of runway considered fully comfortable.
pub const RUNWAY_CEILING_MONTHS: f64 = 24.0;
/// LTV:CAC at or above this is considered excellent.
pub const LTV_CAC_GOOD: f64 = 3.0;
/// DAU/MAU at or above this is considered excellent engagement.
pub const DAU_MAU_GOOD: f64 = 0.5;

/// Log-scale normalization against a fixed ceiling. Negative inputs clamp
/// to zero before the log.
pub fn normalize_monetary(value: f64, ceiling: f64) -> f64 {
    let v = value.max(0.0);
    ((v + 1.0).log10() / (ceiling + 1.0).log10()).clamp(0.0, 1.0)
}

/// Linear scaling against a fixed [min, max] range.
pub fn normalize_percent(value: f64, min: f64, max: f64) -> f64 {
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// 1-5 ordinal score rescaled to [0, 1].
pub fn normalize_ordinal(value: f64) -> f64 {
    ((value - 1.0) / 4.0).clamp(0.0, 1.0)
}

/// Ratio where higher is better up to a known "good" threshold.
pub fn normalize_ratio(value: f64, good: f64) -> f64 {
    (value.max(0.0) / good).clamp(0.0, 1.0)
}

/// Count normalized on a log scale against a ceiling.
pub fn normalize_count(count: u32, ceiling: u32) -> f64 {
    normalize_monetary(count as f64, ceiling as f64)
}

/// Burn multiple: net burn per net-new dollar of ARR; lower is better.
/// 1.0 or less is excellent, 5.0 or more is poor. Zero or negative means
/// the ratio was not computable and scores neutral.
pub fn normalize_burn_multiple(value: f64) -> f64 {
    if value <= 0.0 {
        return NEUTRAL;
    }
    (1.0 - (value - 1.0) / 4.0).clamp(0.0, 1.0)
}

pub fn normalize_bool(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Boolean where true is a negative signal (e.g. key person dependency).
pub fn normalize_bool_inverted(value: bool) -> f64 {
    1.0 - normalize_bool(value)
}

/// Arithmetic mean of a pillar's normalized features; neutral for an empty
/// pillar.
fn pillar_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return NEUTRAL;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Stage-specific pillar weights. Early stages weight people and advantage;
/// later stages shift toward market and capital efficiency. Unknown stages
/// get the even seed-like weighting.
pub fn stage_weights(stage: FundingStage) -> PillarWeights {
    match stage {
        FundingStage::PreSeed => PillarWeights {
            capital: 0.10,
            advantage: 0.30,
            market: 0.20,
            people: 0.40,
        },
        FundingStage::Seed => PillarWeights {
            capital: 0.15,
            advantage: 0.30,
            market: 0.25,
            people: 0.30,
        },
        FundingStage::SeriesA => PillarWeights {
            capital: 0.20,
            advantage: 0.25,
            market: 0.30,
            people: 0.25,
        },
        FundingStage::SeriesB => PillarWeights {
            capital: 0.25,
            advantage: 0.25,
            market: 0.30,
            people: 0.20,
        },
        FundingStage::SeriesC | FundingStage::Growth => PillarWeights {
            capital: 0.30,
            advantage: 0.20,
            market: 0.30,
            people: 0.20,
        },
        FundingStage::Unknown => PillarWeights {
            capital: 0.25,
            advantage: 0.25,
            market: 0.25,
            people: 0.25,
        },
    }
}

/// Compute all four pillar scores and the stage-weighted overall score.
pub fn score(fv: &FeatureVector) -> PillarScores {
    let capital = pillar_mean(&[
        normalize_monetary(fv.total_capital_raised_usd, CAPITAL_RAISED_CEILING_USD),
        normalize_monetary(fv.cash_on_hand_usd, CASH_CEILING_USD),
        normalize_monetary(fv.annual_revenue_run_rate_usd, REVENUE_CEILING_USD),
        normalize_percent(fv.revenue_growth_rate_percent, -100.0, 200.0),
        normalize_percent(fv.gross_margin_percent, -50.0, 90.0),
        normalize_ratio(fv.runway_months, RUNWAY_CEILING_MONTHS),
        normalize_burn_multiple(fv.burn_multiple),
        normalize_ratio(fv.ltv_cac_ratio, LTV_CAC_GOOD),
        normalize_ordinal(fv.investor_tier_score),
        normalize_bool_inverted(fv.has_debt_financing),
    ]);

    let advantage = pillar_mean(&[
        normalize_count(fv.patent_count, 50),
        normalize_bool(fv.network_effects_present),
        normalize_bool(fv.has_data_moat),
        normalize_bool(fv.regulatory_advantage_present),
        normalize_ordinal(fv.tech_differentiation_score),
        normalize_ordinal(fv.switching_cost_score),
        normalize_ordinal(fv.brand_strength_score),
        normalize_ordinal(fv.scalability_score),
        fv.product_stage.ordinal(),
        normalize_percent(fv.product_retention_30d_percent, 0.0, 100.0),
        normalize_percent(fv.product_retention_90d_percent, 0.0, 100.0),
    ]);

    let market = pillar_mean(&[
        normalize_monetary(fv.tam_size_usd, TAM_CEILING_USD),
        normalize_monetary(fv.sam_size_usd, SAM_CEILING_USD),
        normalize_monetary(fv.som_size_usd, SOM_CEILING_USD),
        normalize_percent(fv.market_growth_rate_percent, 0.0, 100.0),
        normalize_count(fv.customer_count, 100_000),
        1.0 - normalize_percent(fv.customer_concentration_percent, 0.0, 100.0),
        normalize_percent(fv.user_growth_rate_percent, -100.0, 200.0),
        normalize_percent(fv.net_dollar_retention_percent, 50.0, 150.0),
        1.0 - normalize_ordinal(fv.competition_intensity_score),
        normalize_ratio(fv.dau_mau_ratio, DAU_MAU_GOOD),
    ]);

    let people = pillar_mean(&[
        normalize_ratio(fv.founder_count as f64, 4.0),
        normalize_count(fv.team_size_full_time, 250),
        normalize_ratio(fv.years_experience_avg, 15.0),
        normalize_ratio(fv.domain_expertise_years_avg, 10.0),
        normalize_ratio(fv.prior_startup_count as f64, 3.0),
        normalize_ratio(fv.prior_successful_exits as f64, 2.0),
        normalize_ordinal(fv.board_advisor_score),
        normalize_count(fv.advisor_count, 20),
        normalize_percent(fv.team_diversity_percent, 0.0, 100.0),
        normalize_bool_inverted(fv.key_person_dependency),
    ]);

    let weights = stage_weights(fv.funding_stage);
    let weighted_overall = capital * weights.capital
        + advantage * weights.advantage
        + market * weights.market
        + people * weights.people;

    PillarScores {
        capital,
        advantage,
        market,
        people,
        weights,
        weighted_overall,
    }
}
