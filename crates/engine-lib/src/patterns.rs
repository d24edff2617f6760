//! Pattern archetype matching
//!
//! Compares the feature vector against a small library of named archetypes
//! (feature-range predicates plus an expected success-rate range and example
//! companies). Matches annotate the prediction; a very high-confidence top
//! match may nudge the displayed probability by a small bounded delta, and
//! that nudge must stay within the confidence interval or it is rejected.

use crate::features::FeatureVector;
use crate::models::{ConfidenceInterval, PatternMatch};

/// Matches below this confidence are dropped.
pub const MIN_PATTERN_CONFIDENCE: f64 = 0.5;
/// Only a top match at or above this confidence may nudge the probability.
pub const NUDGE_CONFIDENCE_FLOOR: f64 = 0.85;
/// Default cap on the nudge, in probability points.
pub const DEFAULT_NUDGE_CAP: f64 = 0.05;

/// Inclusive value range for one predicate.
#[derive(Debug, Clone, Copy)]
struct Range {
    min: f64,
    max: f64,
}

impl Range {
    /// 1.0 at the center of the range, falling linearly to 0.0 at the edges;
    /// 0.0 outside the range.
    fn centrality(&self, value: f64) -> f64 {
        if value < self.min || value > self.max {
            return 0.0;
        }
        let half_width = (self.max - self.min) / 2.0;
        if half_width <= 0.0 {
            return 1.0;
        }
        let mid = (self.min + self.max) / 2.0;
        1.0 - (value - mid).abs() / half_width
    }
}

struct Predicate {
    extract: fn(&FeatureVector) -> f64,
    range: Range,
}

impl Predicate {
    fn new(extract: fn(&FeatureVector) -> f64, min: f64, max: f64) -> Self {
        Self {
            extract,
            range: Range { min, max },
        }
    }
}

/// One named archetype.
pub struct Archetype {
    name: &'static str,
    category: &'static str,
    expected_success_rate: (f64, f64),
    pub example_companies: &'static [&'static str],
    predicates: Vec<Predicate>,
}

impl Archetype {
    /// Centrality-weighted fraction of satisfied predicates.
    fn confidence(&self, fv: &FeatureVector) -> f64 {
        if self.predicates.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .predicates
            .iter()
            .map(|p| p.range.centrality((p.extract)(fv)))
            .sum();
        total / self.predicates.len() as f64
    }
}

/// The built-in archetype library.
pub struct PatternLibrary {
    archetypes: Vec<Archetype>,
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PatternLibrary {
    pub fn builtin() -> Self {
        Self {
            archetypes: vec![
                Archetype {
                    name: "Efficient B2B SaaS",
                    category: "efficiency",
                    expected_success_rate: (0.55, 0.75),
                    example_companies: &["Atlassian", "Zoom", "Datadog"],
                    predicates: vec![
                        Predicate::new(|f| f.net_dollar_retention_percent, 100.0, 160.0),
                        Predicate::new(|f| f.burn_multiple, 0.1, 2.0),
                        Predicate::new(|f| f.gross_margin_percent, 65.0, 95.0),
                        Predicate::new(|f| f.ltv_cac_ratio, 3.0, 10.0),
                        Predicate::new(|f| f.revenue_growth_rate_percent, 30.0, 300.0),
                    ],
                },
                Archetype {
                    name: "Blitzscale Consumer",
                    category: "growth",
                    expected_success_rate: (0.35, 0.60),
                    example_companies: &["Instagram", "TikTok", "Discord"],
                    predicates: vec![
                        Predicate::new(|f| f.user_growth_rate_percent, 100.0, 1000.0),
                        Predicate::new(|f| f.dau_mau_ratio, 0.3, 1.0),
                        Predicate::new(|f| f.burn_multiple, 2.0, 10.0),
                        Predicate::new(|f| f.product_retention_30d_percent, 40.0, 100.0),
                    ],
                },
                Archetype {
                    name: "Deep Tech Moat",
                    category: "defensibility",
                    expected_success_rate: (0.45, 0.70),
                    example_companies: &["Waymo", "SpaceX", "Cerebras"],
                    predicates: vec![
                        Predicate::new(|f| f.patent_count as f64, 3.0, 100.0),
                        Predicate::new(|f| f.tech_differentiation_score, 4.0, 5.0),
                        Predicate::new(|f| f.market_growth_rate_percent, 10.0, 100.0),
                        Predicate::new(|f| f.domain_expertise_years_avg, 5.0, 30.0),
                    ],
                },
                Archetype {
                    name: "Cash Furnace",
                    category: "risk",
                    expected_success_rate: (0.05, 0.20),
                    example_companies: &["Quibi", "WeWork (2019)"],
                    predicates: vec![
                        Predicate::new(|f| f.runway_months, 0.0, 6.0),
                        Predicate::new(|f| f.burn_multiple, 4.0, 20.0),
                        Predicate::new(|f| f.revenue_growth_rate_percent, -100.0, 10.0),
                    ],
                },
                Archetype {
                    name: "Zombie Plateau",
                    category: "risk",
                    expected_success_rate: (0.10, 0.30),
                    example_companies: &[],
                    predicates: vec![
                        Predicate::new(|f| f.revenue_growth_rate_percent, -10.0, 15.0),
                        Predicate::new(|f| f.user_growth_rate_percent, -10.0, 10.0),
                        Predicate::new(|f| f.net_dollar_retention_percent, 70.0, 95.0),
                        Predicate::new(|f| f.runway_months, 6.0, 24.0),
                    ],
                },
                Archetype {
                    name: "Seasoned Operators",
                    category: "team",
                    expected_success_rate: (0.50, 0.70),
                    example_companies: &["Affirm", "Rippling"],
                    predicates: vec![
                        Predicate::new(|f| f.prior_successful_exits as f64, 1.0, 5.0),
                        Predicate::new(|f| f.years_experience_avg, 10.0, 40.0),
                        Predicate::new(|f| f.board_advisor_score, 4.0, 5.0),
                        Predicate::new(|f| f.team_size_full_time as f64, 10.0, 500.0),
                    ],
                },
            ],
        }
    }

    /// Archetype matches at or above the confidence floor, strongest first.
    /// Ties break on name so the ordering is deterministic.
    pub fn matches(&self, fv: &FeatureVector) -> Vec<PatternMatch> {
        let mut out: Vec<PatternMatch> = self
            .archetypes
            .iter()
            .filter_map(|a| {
                let confidence = a.confidence(fv);
                if confidence >= MIN_PATTERN_CONFIDENCE {
                    Some(PatternMatch {
                        pattern_name: a.name.to_string(),
                        confidence,
                        category: a.category.to_string(),
                        expected_success_rate: a.expected_success_rate,
                    })
                } else {
                    None
                }
            })
            .collect();
        out.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.pattern_name.cmp(&b.pattern_name))
        });
        out
    }
}

/// Bounded delta the top pattern match applies to the displayed probability.
///
/// Zero unless the top match clears [`NUDGE_CONFIDENCE_FLOOR`]. The nudged
/// value is pulled toward the midpoint of the pattern's expected success
/// rate, capped at `cap` points, and clamped into the confidence interval;
/// a nudge that would leave the interval is truncated to its edge.
pub fn pattern_adjustment(
    matches: &[PatternMatch],
    calibrated: f64,
    interval: &ConfidenceInterval,
    cap: f64,
) -> f64 {
    let top = match matches.first() {
        Some(m) if m.confidence >= NUDGE_CONFIDENCE_FLOOR => m,
        _ => return 0.0,
    };
    let (lo, hi) = top.expected_success_rate;
    let target = (lo + hi) / 2.0;
    let delta = (target - calibrated).clamp(-cap, cap);
    let nudged = (calibrated + delta).clamp(interval.lower, interval.upper);
    nudged - calibrated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn efficient_saas_vector() -> FeatureVector {
        let mut fv = FeatureVector::default();
        fv.net_dollar_retention_percent = 130.0;
        fv.burn_multiple = 1.05;
        fv.gross_margin_percent = 80.0;
        fv.ltv_cac_ratio = 6.5;
        fv.revenue_growth_rate_percent = 165.0;
        fv
    }

    #[test]
    fn test_centered_vector_matches_strongly() {
        let library = PatternLibrary::builtin();
        let matches = library.matches(&efficient_saas_vector());
        assert!(!matches.is_empty());
        assert_eq!(matches[0].pattern_name, "Efficient B2B SaaS");
        assert!(matches[0].confidence > 0.9, "confidence {}", matches[0].confidence);
    }

    #[test]
    fn test_default_vector_matches_nothing() {
        let library = PatternLibrary::builtin();
        let matches = library.matches(&FeatureVector::default());
        assert!(matches.is_empty(), "unexpected matches: {:?}", matches);
    }

    #[test]
    fn test_matches_ranked_by_confidence() {
        let library = PatternLibrary::builtin();
        let mut fv = efficient_saas_vector();
        // Also partially resemble Seasoned Operators
        fv.prior_successful_exits = 1;
        fv.years_experience_avg = 12.0;
        fv.board_advisor_score = 4.2;
        fv.team_size_full_time = 40;
        let matches = library.matches(&fv);
        for pair in matches.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    #[test]
    fn test_centrality_edges_and_outside() {
        let r = Range { min: 0.0, max: 10.0 };
        assert_eq!(r.centrality(5.0), 1.0);
        assert_eq!(r.centrality(0.0), 0.0);
        assert_eq!(r.centrality(10.0), 0.0);
        assert_eq!(r.centrality(-1.0), 0.0);
        assert!((r.centrality(7.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_no_nudge_below_floor() {
        let matches = vec![PatternMatch {
            pattern_name: "x".to_string(),
            confidence: 0.7,
            category: "efficiency".to_string(),
            expected_success_rate: (0.6, 0.8),
        }];
        let ci = ConfidenceInterval {
            lower: 0.2,
            upper: 0.8,
        };
        assert_eq!(pattern_adjustment(&matches, 0.5, &ci, DEFAULT_NUDGE_CAP), 0.0);
    }

    #[test]
    fn test_nudge_capped() {
        let matches = vec![PatternMatch {
            pattern_name: "x".to_string(),
            confidence: 0.95,
            category: "efficiency".to_string(),
            expected_success_rate: (0.6, 0.8),
        }];
        let ci = ConfidenceInterval {
            lower: 0.1,
            upper: 0.9,
        };
        // target 0.7, calibrated 0.5: pull is +0.2 but cap is 0.05
        let adj = pattern_adjustment(&matches, 0.5, &ci, DEFAULT_NUDGE_CAP);
        assert!((adj - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_nudge_respects_interval() {
        let matches = vec![PatternMatch {
            pattern_name: "x".to_string(),
            confidence: 0.95,
            category: "risk".to_string(),
            expected_success_rate: (0.05, 0.15),
        }];
        let ci = ConfidenceInterval {
            lower: 0.48,
            upper: 0.62,
        };
        // Pull is downward but the interval floor is 0.48
        let adj = pattern_adjustment(&matches, 0.5, &ci, DEFAULT_NUDGE_CAP);
        assert!((adj - (-0.02)).abs() < 1e-12);
        let final_p = 0.5 + adj;
        assert!(ci.contains(final_p));
    }

    #[test]
    fn test_no_matches_no_nudge() {
        let ci = ConfidenceInterval {
            lower: 0.0,
            upper: 1.0,
        };
        assert_eq!(pattern_adjustment(&[], 0.5, &ci, DEFAULT_NUDGE_CAP), 0.0);
    }
}
