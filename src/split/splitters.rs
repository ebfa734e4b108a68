//! The closed set of splitter policies.
//!
//! Each splitter scores one predictor's conditional statistics and, when a
//! viable split exists, proposes a condition together with its merit, the
//! merit range used in the Hoeffding bound, and the per-branch statistics
//! that seed the child leaves.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{NominalSplitter, NumericSplitter};
use crate::data::Attribute;
use crate::stats::{
    ClassificationStats, NominalClassObserver, NominalRegObserver, NumericClassObserver,
    NumericRegObserver, ObservationStats, RegressionStats, TargetStats,
};

use super::condition::SplitCondition;

/// The outcome of evaluating one predictor for a split.
pub(crate) struct SplitEval {
    pub condition: SplitCondition,
    pub merit: f64,
    pub range: f64,
    pub post: BTreeMap<usize, ObservationStats>,
}

pub(crate) fn nominal_classification(
    policy: NominalSplitter,
    attr: &Arc<Attribute>,
    obs: &NominalClassObserver,
) -> Option<SplitEval> {
    match policy {
        NominalSplitter::InfoGain => infogain_multiway(attr, obs),
        // Variance reduction only applies to regression targets; config
        // normalisation rejects the combination.
        NominalSplitter::VarianceReduction => None,
    }
}

pub(crate) fn numeric_classification(
    policy: NumericSplitter,
    attr: &Arc<Attribute>,
    obs: &NumericClassObserver,
    split_points: usize,
) -> Option<SplitEval> {
    match policy {
        NumericSplitter::Gaussian => gaussian_binary(attr, obs, split_points),
        NumericSplitter::VarianceReduction => None,
    }
}

pub(crate) fn nominal_regression(
    policy: NominalSplitter,
    attr: &Arc<Attribute>,
    obs: &NominalRegObserver,
) -> Option<SplitEval> {
    match policy {
        NominalSplitter::VarianceReduction => variance_multiway(attr, obs),
        NominalSplitter::InfoGain => None,
    }
}

pub(crate) fn numeric_regression(
    policy: NumericSplitter,
    attr: &Arc<Attribute>,
    obs: &NumericRegObserver,
) -> Option<SplitEval> {
    match policy {
        NumericSplitter::VarianceReduction => variance_binary(attr, obs),
        NumericSplitter::Gaussian => None,
    }
}

// =============================================================================
// Classification: information gain
// =============================================================================

fn infogain_multiway(attr: &Arc<Attribute>, obs: &NominalClassObserver) -> Option<SplitEval> {
    if obs.counts.iter().filter(|row| !row.is_empty()).count() < 2 {
        return None;
    }

    let mut pre = Vec::new();
    for row in &obs.counts {
        accumulate(&mut pre, row);
    }
    let total: f64 = pre.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let mut post_entropy = 0.0;
    for row in &obs.counts {
        let row_weight: f64 = row.iter().sum();
        post_entropy += row_weight / total * entropy(row);
    }

    let mut post = BTreeMap::new();
    for (level, row) in obs.counts.iter().enumerate() {
        if row.iter().any(|&w| w > 0.0) {
            post.insert(
                level,
                ObservationStats::Classification(ClassificationStats::from_class_dist(row.clone())),
            );
        }
    }

    Some(SplitEval {
        condition: SplitCondition::nominal_multiway(Arc::clone(attr)),
        merit: entropy(&pre) - post_entropy,
        range: entropy_range(&pre),
        post,
    })
}

/// Binary split of a numeric predictor, scored on a grid of thresholds with
/// per-branch class weights estimated from the per-class Gaussians.
fn gaussian_binary(
    attr: &Arc<Attribute>,
    obs: &NumericClassObserver,
    split_points: usize,
) -> Option<SplitEval> {
    let pre: Vec<f64> = obs.per_class.iter().map(|est| est.weight()).collect();
    if pre.iter().filter(|&&w| w > 0.0).count() < 2 || obs.min >= obs.max {
        return None;
    }
    let total: f64 = pre.iter().sum();
    let pre_entropy = entropy(&pre);

    let mut best: Option<(f64, f64, Vec<f64>, Vec<f64>)> = None;
    for i in 1..=split_points {
        let threshold =
            obs.min + (obs.max - obs.min) * i as f64 / (split_points as f64 + 1.0);

        let mut left = vec![0.0; pre.len()];
        let mut right = vec![0.0; pre.len()];
        for (class, est) in obs.per_class.iter().enumerate() {
            let below = est.weight_below(threshold).clamp(0.0, est.weight());
            left[class] = below;
            right[class] = est.weight() - below;
        }
        let left_weight: f64 = left.iter().sum();
        let right_weight: f64 = right.iter().sum();
        if left_weight <= 0.0 || right_weight <= 0.0 {
            continue;
        }

        let merit = pre_entropy
            - left_weight / total * entropy(&left)
            - right_weight / total * entropy(&right);
        if best.as_ref().is_none_or(|(m, ..)| merit > *m) {
            best = Some((merit, threshold, left, right));
        }
    }

    let (merit, threshold, left, right) = best?;
    let mut post = BTreeMap::new();
    post.insert(
        0,
        ObservationStats::Classification(ClassificationStats::from_class_dist(left)),
    );
    post.insert(
        1,
        ObservationStats::Classification(ClassificationStats::from_class_dist(right)),
    );

    Some(SplitEval {
        condition: SplitCondition::numeric_binary(Arc::clone(attr), threshold),
        merit,
        range: entropy_range(&pre),
        post,
    })
}

fn accumulate(into: &mut Vec<f64>, row: &[f64]) {
    if into.len() < row.len() {
        into.resize(row.len(), 0.0);
    }
    for (acc, w) in into.iter_mut().zip(row) {
        *acc += w;
    }
}

fn entropy(dist: &[f64]) -> f64 {
    let total: f64 = dist.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    dist.iter()
        .filter(|&&w| w > 0.0)
        .map(|&w| {
            let p = w / total;
            -p * p.log2()
        })
        .sum()
}

/// The supremum of information gain: log2 of the number of observed classes.
fn entropy_range(dist: &[f64]) -> f64 {
    let classes = dist.iter().filter(|&&w| w > 0.0).count().max(2);
    (classes as f64).log2()
}

// =============================================================================
// Regression: variance reduction
// =============================================================================

fn variance_multiway(attr: &Arc<Attribute>, obs: &NominalRegObserver) -> Option<SplitEval> {
    if obs.levels.iter().filter(|s| !s.is_empty()).count() < 2 {
        return None;
    }

    let total = obs
        .levels
        .iter()
        .fold(TargetStats::default(), |acc, level| merge(&acc, level));
    let total_weight = total.weight();
    let total_variance = total.variance();
    if total_weight <= 0.0 || total_variance <= 0.0 {
        return None;
    }

    let mut weighted_child_variance = 0.0;
    let mut post = BTreeMap::new();
    for (level, stats) in obs.levels.iter().enumerate() {
        if stats.is_empty() {
            continue;
        }
        weighted_child_variance += stats.weight() / total_weight * stats.variance();
        post.insert(
            level,
            ObservationStats::Regression(RegressionStats::from_target_stats(*stats)),
        );
    }

    Some(SplitEval {
        condition: SplitCondition::nominal_multiway(Arc::clone(attr)),
        merit: total_variance - weighted_child_variance,
        range: total_variance,
        post,
    })
}

fn variance_binary(attr: &Arc<Attribute>, obs: &NumericRegObserver) -> Option<SplitEval> {
    let total = obs.total;
    let total_weight = total.weight();
    let total_variance = total.variance();
    if total_weight <= 0.0 || total_variance <= 0.0 {
        return None;
    }

    let mut best: Option<(f64, f64, TargetStats, TargetStats)> = None;
    for candidate in &obs.candidates {
        let left = candidate.left;
        let right = total.minus(&left);
        if left.is_empty() || right.is_empty() {
            continue;
        }

        let merit = total_variance
            - left.weight() / total_weight * left.variance()
            - right.weight() / total_weight * right.variance();
        if best.as_ref().is_none_or(|(m, ..)| merit > *m) {
            best = Some((merit, candidate.threshold, left, right));
        }
    }

    let (merit, threshold, left, right) = best?;
    let mut post = BTreeMap::new();
    post.insert(
        0,
        ObservationStats::Regression(RegressionStats::from_target_stats(left)),
    );
    post.insert(
        1,
        ObservationStats::Regression(RegressionStats::from_target_stats(right)),
    );

    Some(SplitEval {
        condition: SplitCondition::numeric_binary(Arc::clone(attr), threshold),
        merit,
        range: total_variance,
        post,
    })
}

fn merge(a: &TargetStats, b: &TargetStats) -> TargetStats {
    let (aw, asum, asq) = a.parts();
    let (bw, bsum, bsq) = b.parts();
    TargetStats::from_parts(aw + bw, asum + bsum, asq + bsq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn entropy_of_a_uniform_binary_dist_is_one() {
        assert_relative_eq!(entropy(&[5.0, 5.0]), 1.0);
        assert_relative_eq!(entropy(&[10.0, 0.0]), 0.0);
        assert_eq!(entropy(&[]), 0.0);
    }

    #[test]
    fn perfect_nominal_separation_gains_full_entropy() {
        let attr = Arc::new(Attribute::nominal_with_levels("c", &["a", "b"]));
        let obs = NominalClassObserver {
            counts: vec![vec![8.0, 0.0], vec![0.0, 8.0]],
        };

        let eval = nominal_classification(NominalSplitter::InfoGain, &attr, &obs).unwrap();
        assert_relative_eq!(eval.merit, 1.0);
        assert_relative_eq!(eval.range, 1.0);
        assert_eq!(eval.post.len(), 2);
        assert_eq!(eval.condition.arity(), 2);
    }

    #[test]
    fn single_level_nominal_has_no_split() {
        let attr = Arc::new(Attribute::nominal("c"));
        let obs = NominalClassObserver {
            counts: vec![vec![4.0, 2.0]],
        };
        assert!(nominal_classification(NominalSplitter::InfoGain, &attr, &obs).is_none());
    }

    #[test]
    fn gaussian_split_separates_distant_classes() {
        let attr = Arc::new(Attribute::numeric("x"));
        let mut obs = NumericClassObserver::new();
        // Class 0 clustered near 0, class 1 near 10.
        for v in [-1.0, 0.0, 1.0] {
            observe_numeric(&mut obs, v, 0);
        }
        for v in [9.0, 10.0, 11.0] {
            observe_numeric(&mut obs, v, 1);
        }

        let eval = numeric_classification(NumericSplitter::Gaussian, &attr, &obs, 10).unwrap();
        assert!(eval.merit > 0.8, "merit {} too low", eval.merit);
        let SplitCondition::NumericBinary { threshold, .. } = eval.condition else {
            panic!("expected a numeric condition");
        };
        assert!(threshold > 1.0 && threshold < 9.0, "threshold {threshold}");
    }

    #[test]
    fn variance_reduction_picks_the_true_breakpoint() {
        let attr = Arc::new(Attribute::numeric("x"));
        let mut obs = NumericRegObserver::default();
        for (x, y) in [
            (1.0, 10.0),
            (2.0, 11.0),
            (3.0, 10.5),
            (7.0, 50.0),
            (8.0, 51.0),
            (9.0, 50.5),
        ] {
            observe_regression(&mut obs, x, y);
        }

        let eval = numeric_regression(NumericSplitter::VarianceReduction, &attr, &obs).unwrap();
        assert!(eval.merit > 0.0);
        let SplitCondition::NumericBinary { threshold, .. } = eval.condition else {
            panic!("expected a numeric condition");
        };
        assert!((3.0..7.0).contains(&threshold), "threshold {threshold}");

        let left = &eval.post[&0];
        let right = &eval.post[&1];
        assert_relative_eq!(left.total_weight() + right.total_weight(), 6.0);
    }

    #[test]
    fn task_mismatched_policies_yield_nothing() {
        let attr = Arc::new(Attribute::nominal("c"));
        let obs = NominalClassObserver {
            counts: vec![vec![1.0], vec![2.0]],
        };
        assert!(nominal_classification(NominalSplitter::VarianceReduction, &attr, &obs).is_none());
    }

    fn observe_numeric(obs: &mut NumericClassObserver, value: f64, class: usize) {
        if obs.per_class.len() <= class {
            obs.per_class
                .resize_with(class + 1, crate::stats::GaussianEstimator::default);
        }
        obs.per_class[class].add(value, 1.0);
        obs.min = obs.min.min(value);
        obs.max = obs.max.max(value);
    }

    fn observe_regression(obs: &mut NumericRegObserver, x: f64, y: f64) {
        obs.total.add(y, 1.0);
        for candidate in &mut obs.candidates {
            if x <= candidate.threshold {
                candidate.left.add(y, 1.0);
            }
        }
        let mut left = TargetStats::new();
        left.add(y, 1.0);
        obs.candidates.push(crate::stats::SplitCandidate {
            threshold: x,
            left,
        });
    }
}
