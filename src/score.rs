// Composite regional performance score.
//
// Each metric is turned into a percentile rank across regions, then the ranks
// are blended with fixed weights and scaled to 0..=100.
use crate::types::RegionAggregate;
use crate::util::round_to;
use std::cmp::Ordering;
use tracing::{debug, warn};

pub const WEIGHT_EFFICIENCY: f64 = 0.4;
pub const WEIGHT_VALUE_PER_STRUCTURE: f64 = 0.3;
pub const WEIGHT_SHARE_SIGNED: f64 = 0.3;

/// Inclusive percentile rank: the fraction of present samples `<=` each sample.
///
/// Tied samples share the same (highest) rank. Missing samples rank 0 and are
/// left out of the denominator.
pub fn percentile_ranks(samples: &[Option<f64>]) -> Vec<f64> {
    let present: Vec<f64> = samples.iter().flatten().copied().collect();
    let n = present.len() as f64;
    samples
        .iter()
        .map(|s| match s {
            Some(v) => present.iter().filter(|p| **p <= *v).count() as f64 / n,
            None => 0.0,
        })
        .collect()
}

/// Score every region and return them best first.
///
/// The sort is stable: equal scores keep their input order, so the same input
/// always yields the same order.
pub fn score(mut aggregates: Vec<RegionAggregate>) -> Vec<RegionAggregate> {
    let efficiency: Vec<Option<f64>> = aggregates.iter().map(|a| a.signature_rate).collect();
    let value: Vec<Option<f64>> = aggregates.iter().map(|a| a.mean_value).collect();
    let share: Vec<Option<f64>> = aggregates.iter().map(|a| a.mean_share_signed).collect();

    for (name, metric) in [
        ("signature efficiency", &efficiency),
        ("value per structure", &value),
        ("share of signed conventions", &share),
    ] {
        if !aggregates.is_empty() && metric.iter().all(Option::is_none) {
            warn!(metric = name, "metric unavailable for current data, it contributes nothing to the score");
        }
    }

    let eff_rank = percentile_ranks(&efficiency);
    let value_rank = percentile_ranks(&value);
    let share_rank = percentile_ranks(&share);

    for (i, agg) in aggregates.iter_mut().enumerate() {
        let blended = WEIGHT_EFFICIENCY * eff_rank[i]
            + WEIGHT_VALUE_PER_STRUCTURE * value_rank[i]
            + WEIGHT_SHARE_SIGNED * share_rank[i];
        agg.score = Some(round_to(100.0 * blended, 2));
    }

    aggregates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
    });
    debug!(regions = aggregates.len(), "scored regions");
    aggregates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FacilityType;

    fn agg(region: &str, rate: Option<f64>, value: Option<f64>, share: Option<f64>) -> RegionAggregate {
        RegionAggregate {
            region: region.to_string(),
            facility_count: 1,
            district_count: 1,
            structures_per_district: Some(1.0),
            dominant_type: FacilityType::Other,
            signed_total: 0.0,
            not_signed_total: 0.0,
            signature_rate: rate,
            mean_value: value,
            mean_share_signed: share,
            metric_means: Vec::new(),
            score: None,
        }
    }

    #[test]
    fn ties_share_the_highest_rank() {
        let ranks = percentile_ranks(&[Some(10.0), Some(20.0), Some(20.0), Some(5.0)]);
        assert_eq!(ranks, vec![0.5, 1.0, 1.0, 0.25]);
    }

    #[test]
    fn missing_samples_rank_zero() {
        let ranks = percentile_ranks(&[None, Some(3.0), Some(1.0)]);
        assert_eq!(ranks, vec![0.0, 1.0, 0.5]);
        assert!(percentile_ranks(&[]).is_empty());
    }

    #[test]
    fn composite_weights_and_order() {
        let scored = score(vec![
            agg("A", Some(10.0), Some(100.0), Some(90.0)),
            agg("B", Some(90.0), Some(50.0), Some(10.0)),
        ]);
        // B: 0.4*1 + 0.3*0.5 + 0.3*0.5 = 0.7; A: 0.4*0.5 + 0.3*1 + 0.3*1 = 0.8
        assert_eq!(scored[0].region, "A");
        assert_eq!(scored[0].score, Some(80.0));
        assert_eq!(scored[1].score, Some(70.0));
    }

    #[test]
    fn single_region_scores_full_marks() {
        let scored = score(vec![agg("A", Some(0.0), Some(0.0), Some(0.0))]);
        assert_eq!(scored[0].score, Some(100.0));
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let input = vec![
            agg("X", Some(50.0), Some(1.0), Some(1.0)),
            agg("Y", Some(50.0), Some(1.0), Some(1.0)),
            agg("Z", Some(10.0), Some(1.0), Some(1.0)),
        ];
        let first = score(input.clone());
        let second = score(input);
        let order: Vec<&str> = first.iter().map(|a| a.region.as_str()).collect();
        assert_eq!(order, vec!["X", "Y", "Z"]);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_input_scores_nothing() {
        assert!(score(Vec::new()).is_empty());
    }
}
