//! Sufficient statistics for regression leaves.

use std::collections::BTreeMap;
use std::mem;

use crate::data::{AttributeValue, Instance, Model, PredictedValue, Prediction};

use super::gaussian::TargetStats;

/// Per-leaf regression statistics: running target moments plus, per
/// predictor, the target statistics conditioned on the predictor value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegressionStats {
    pub(crate) target: TargetStats,
    /// Conditional statistics keyed by predictor name. Empty while the leaf
    /// is deactivated.
    pub(crate) observers: BTreeMap<String, RegObserver>,
    pub(crate) active: bool,
}

impl RegressionStats {
    pub fn new() -> Self {
        Self {
            target: TargetStats::new(),
            observers: BTreeMap::new(),
            active: true,
        }
    }

    /// Seed statistics from target moments, e.g. a split branch.
    pub fn from_target_stats(target: TargetStats) -> Self {
        Self {
            target,
            observers: BTreeMap::new(),
            active: true,
        }
    }

    pub fn update(
        &mut self,
        model: &Model,
        instance: &dyn Instance,
        weight: f64,
        split_points: usize,
    ) {
        let target = model.target_value(instance);
        if target.is_missing() {
            return;
        }
        let y = target.value();
        self.target.add(y, weight);

        if !self.active {
            return;
        }
        for attr in model.predictors() {
            let value = attr.value_in(instance);
            if value.is_missing() {
                continue;
            }
            let observer = self
                .observers
                .entry(attr.name().to_owned())
                .or_insert_with(|| {
                    if attr.is_nominal() {
                        RegObserver::Nominal(NominalRegObserver::default())
                    } else {
                        RegObserver::Numeric(NumericRegObserver::default())
                    }
                });
            observer.observe(value, y, weight, split_points);
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.target.weight()
    }

    /// The target must show spread before a variance reduction is meaningful.
    pub fn is_sufficient(&self) -> bool {
        self.target.variance() > 0.0
    }

    /// A single predicted value: the running mean, voted by observed weight.
    pub fn predict(&self) -> Prediction {
        if self.target.is_empty() {
            return Prediction::default();
        }
        Prediction::new(vec![PredictedValue {
            value: AttributeValue::from(self.target.mean()),
            votes: self.target.weight(),
        }])
    }

    /// A copy carrying only the target moments.
    pub fn marginal(&self) -> Self {
        Self::from_target_stats(self.target)
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.observers.clear();
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub(crate) fn heap_bytes(&self) -> usize {
        self.observers
            .iter()
            .map(|(name, obs)| name.len() + mem::size_of::<String>() + obs.byte_size())
            .sum()
    }
}

/// Conditional target statistics for one predictor.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RegObserver {
    Nominal(NominalRegObserver),
    Numeric(NumericRegObserver),
}

impl RegObserver {
    fn observe(&mut self, value: AttributeValue, y: f64, weight: f64, split_points: usize) {
        match self {
            Self::Nominal(obs) => {
                if let Some(level) = value.index() {
                    obs.observe(level, y, weight);
                }
            }
            Self::Numeric(obs) => obs.observe(value.value(), y, weight, split_points),
        }
    }

    fn byte_size(&self) -> usize {
        mem::size_of::<Self>()
            + match self {
                Self::Nominal(obs) => obs.levels.len() * mem::size_of::<TargetStats>(),
                Self::Numeric(obs) => obs.candidates.len() * mem::size_of::<SplitCandidate>(),
            }
    }
}

/// Target moments per predictor level.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct NominalRegObserver {
    pub(crate) levels: Vec<TargetStats>,
}

impl NominalRegObserver {
    fn observe(&mut self, level: usize, y: f64, weight: f64) {
        if self.levels.len() <= level {
            self.levels.resize_with(level + 1, TargetStats::default);
        }
        self.levels[level].add(y, weight);
    }
}

/// A candidate binary split threshold and the target moments of its left side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SplitCandidate {
    pub(crate) threshold: f64,
    pub(crate) left: TargetStats,
}

/// Target moments conditioned on candidate thresholds of a numeric predictor.
///
/// Thresholds are seeded from the first distinct predictor values observed at
/// the leaf; each candidate accumulates the target moments of the instances
/// at or below it. A candidate seeded late misses the instances that arrived
/// before it, which is acceptable for ranking splits on a stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct NumericRegObserver {
    pub(crate) total: TargetStats,
    pub(crate) candidates: Vec<SplitCandidate>,
}

impl NumericRegObserver {
    fn observe(&mut self, value: f64, y: f64, weight: f64, split_points: usize) {
        self.total.add(y, weight);
        for candidate in &mut self.candidates {
            if value <= candidate.threshold {
                candidate.left.add(y, weight);
            }
        }
        if self.candidates.len() < split_points
            && !self.candidates.iter().any(|c| c.threshold == value)
        {
            let mut left = TargetStats::new();
            left.add(y, weight);
            self.candidates.push(SplitCandidate {
                threshold: value,
                left,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Attribute, MapInstance};
    use approx::assert_relative_eq;

    fn model() -> Model {
        Model::new(
            Attribute::numeric("y"),
            vec![Attribute::numeric("x"), Attribute::nominal("group")],
        )
    }

    fn observe(stats: &mut RegressionStats, model: &Model, x: f64, group: &str, y: f64) {
        let inst = MapInstance::new().set("x", x).set("group", group).set("y", y);
        stats.update(model, &inst, 1.0, 10);
    }

    #[test]
    fn predict_returns_the_running_mean() {
        let model = model();
        let mut stats = RegressionStats::new();
        observe(&mut stats, &model, 1.0, "a", 2.0);
        observe(&mut stats, &model, 2.0, "a", 4.0);
        observe(&mut stats, &model, 3.0, "b", 6.0);

        let prediction = stats.predict();
        assert_relative_eq!(prediction.value(), 4.0);
        assert_relative_eq!(prediction.top().votes, 3.0);
        assert!(stats.is_sufficient());
    }

    #[test]
    fn constant_target_is_not_sufficient() {
        let model = model();
        let mut stats = RegressionStats::new();
        observe(&mut stats, &model, 1.0, "a", 5.0);
        observe(&mut stats, &model, 2.0, "b", 5.0);
        assert!(!stats.is_sufficient());
    }

    #[test]
    fn numeric_observer_tracks_candidate_sides() {
        let model = model();
        let mut stats = RegressionStats::new();
        for (x, y) in [(1.0, 1.0), (2.0, 2.0), (3.0, 30.0), (4.0, 40.0)] {
            observe(&mut stats, &model, x, "a", y);
        }

        let RegObserver::Numeric(obs) = &stats.observers["x"] else {
            panic!("expected numeric observer");
        };
        assert_eq!(obs.candidates.len(), 4);
        assert_relative_eq!(obs.total.weight(), 4.0);

        // The candidate at x = 2 holds the first two targets on its left.
        let c = obs.candidates.iter().find(|c| c.threshold == 2.0).unwrap();
        assert_relative_eq!(c.left.weight(), 2.0);
        assert_relative_eq!(c.left.mean(), 1.5);
    }

    #[test]
    fn candidate_count_is_capped() {
        let model = model();
        let mut stats = RegressionStats::new();
        for i in 0..50 {
            observe(&mut stats, &model, i as f64, "a", i as f64);
        }
        let RegObserver::Numeric(obs) = &stats.observers["x"] else {
            panic!("expected numeric observer");
        };
        assert_eq!(obs.candidates.len(), 10);
    }

    #[test]
    fn deactivate_drops_conditionals_but_predicts() {
        let model = model();
        let mut stats = RegressionStats::new();
        observe(&mut stats, &model, 1.0, "a", 2.0);
        observe(&mut stats, &model, 2.0, "b", 4.0);

        stats.deactivate();
        assert!(stats.observers.is_empty());
        assert_relative_eq!(stats.predict().value(), 3.0);

        observe(&mut stats, &model, 3.0, "a", 9.0);
        assert!(stats.observers.is_empty());
        assert_relative_eq!(stats.total_weight(), 3.0);
    }
}
