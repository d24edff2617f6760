//! Ensemble combination of sub-model probabilities
//!
//! Pure weighted averaging over whichever models actually contributed.
//! The combination is a plain weighted sum over an ordered map, so the
//! result cannot depend on model invocation order.

use std::collections::BTreeMap;

/// Probability reported when no model contributed.
pub const NEUTRAL_PROBABILITY: f64 = 0.5;

/// Reduce N sub-model probabilities to `(raw_probability, agreement)`.
///
/// Weights missing from `weights` default to 1.0 and are renormalized over
/// only the contributing models; models absent from `contributions` never
/// enter the denominator. An empty contribution set yields the neutral
/// probability with agreement 0.0 ("no information"). A single contributor
/// yields agreement 1.0, which callers must treat as low-trust rather than
/// confident.
pub fn combine(
    contributions: &BTreeMap<String, f64>,
    weights: &BTreeMap<String, f64>,
) -> (f64, f64) {
    if contributions.is_empty() {
        return (NEUTRAL_PROBABILITY, 0.0);
    }

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let mut min_p = f64::MAX;
    let mut max_p = f64::MIN;

    for (model_id, p) in contributions {
        let p = p.clamp(0.0, 1.0);
        let w = weights.get(model_id).copied().unwrap_or(1.0).max(0.0);
        weighted_sum += w * p;
        weight_total += w;
        min_p = min_p.min(p);
        max_p = max_p.max(p);
    }

    let raw = if weight_total > 0.0 {
        weighted_sum / weight_total
    } else {
        NEUTRAL_PROBABILITY
    };

    let agreement = if contributions.len() == 1 {
        1.0
    } else {
        (1.0 - (max_p - min_p)).clamp(0.0, 1.0)
    };

    (raw.clamp(0.0, 1.0), agreement)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contributions(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_empty_is_neutral_no_information() {
        let (raw, agreement) = combine(&BTreeMap::new(), &BTreeMap::new());
        assert_eq!(raw, NEUTRAL_PROBABILITY);
        assert_eq!(agreement, 0.0);
    }

    #[test]
    fn test_single_model_full_agreement() {
        let c = contributions(&[("dna-v1", 0.8)]);
        let (raw, agreement) = combine(&c, &BTreeMap::new());
        assert!((raw - 0.8).abs() < 1e-12);
        assert_eq!(agreement, 1.0);
    }

    #[test]
    fn test_unweighted_average() {
        let c = contributions(&[("a", 0.2), ("b", 0.4), ("c", 0.6)]);
        let (raw, agreement) = combine(&c, &BTreeMap::new());
        assert!((raw - 0.4).abs() < 1e-12);
        assert!((agreement - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_weights_renormalized_over_contributors() {
        let c = contributions(&[("a", 0.2), ("b", 0.8)]);
        // A weight exists for a model that did not contribute; it must not
        // dilute the denominator.
        let w = contributions(&[("a", 3.0), ("b", 1.0), ("missing", 10.0)]);
        let (raw, _) = combine(&c, &w);
        assert!((raw - (3.0 * 0.2 + 0.8) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_order_independent() {
        let forward = contributions(&[("a", 0.1), ("b", 0.5), ("c", 0.9)]);
        let mut reversed = BTreeMap::new();
        for (k, v) in [("c", 0.9), ("b", 0.5), ("a", 0.1)] {
            reversed.insert(k.to_string(), v);
        }
        assert_eq!(combine(&forward, &BTreeMap::new()), combine(&reversed, &BTreeMap::new()));
    }

    #[test]
    fn test_removing_mean_valued_model_preserves_raw() {
        // If one model's value equals the prior weighted mean exactly,
        // excluding it and renormalizing must not move the result.
        let with = contributions(&[("a", 0.3), ("b", 0.5), ("c", 0.4)]);
        let without = contributions(&[("a", 0.3), ("b", 0.5)]);
        let (raw_with, _) = combine(&with, &BTreeMap::new());
        let (raw_without, _) = combine(&without, &BTreeMap::new());
        assert!((raw_with - raw_without).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_range_inputs_clamped() {
        let c = contributions(&[("a", 1.3), ("b", -0.2)]);
        let (raw, agreement) = combine(&c, &BTreeMap::new());
        assert!((0.0..=1.0).contains(&raw));
        assert!((0.0..=1.0).contains(&agreement));
        assert!((raw - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_all_zero_weights_fall_back_to_neutral() {
        let c = contributions(&[("a", 0.9), ("b", 0.1)]);
        let w = contributions(&[("a", 0.0), ("b", 0.0)]);
        let (raw, _) = combine(&c, &w);
        assert_eq!(raw, NEUTRAL_PROBABILITY);
    }
}
