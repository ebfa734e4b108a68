//! Sufficient statistics for classification leaves.

use std::collections::BTreeMap;
use std::mem;

use crate::data::{AttributeValue, Instance, Model, PredictedValue, Prediction};

use super::gaussian::GaussianEstimator;

/// Per-leaf classification statistics: the target class distribution plus,
/// per predictor, the class-conditional observer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationStats {
    /// Observed weight per target level.
    pub(crate) target: Vec<f64>,
    /// Class-conditional statistics keyed by predictor name. Empty while the
    /// leaf is deactivated.
    pub(crate) observers: BTreeMap<String, ClassObserver>,
    pub(crate) active: bool,
}

impl ClassificationStats {
    pub fn new() -> Self {
        Self {
            target: Vec::new(),
            observers: BTreeMap::new(),
            active: true,
        }
    }

    /// Seed statistics from a class distribution, e.g. a split branch.
    pub fn from_class_dist(target: Vec<f64>) -> Self {
        Self {
            target,
            observers: BTreeMap::new(),
            active: true,
        }
    }

    pub fn update(&mut self, model: &Model, instance: &dyn Instance, weight: f64) {
        let Some(class) = model.target_value(instance).index() else {
            return;
        };
        if self.target.len() <= class {
            self.target.resize(class + 1, 0.0);
        }
        self.target[class] += weight;

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
                        ClassObserver::Nominal(NominalClassObserver::default())
                    } else {
                        ClassObserver::Numeric(NumericClassObserver::new())
                    }
                });
            observer.observe(value, class, weight);
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.target.iter().sum()
    }

    /// At least two target levels carry weight.
    pub fn is_sufficient(&self) -> bool {
        self.target.iter().filter(|&&w| w > 0.0).count() >= 2
    }

    /// Laplace-smoothed votes per target level.
    pub fn predict(&self, model: &Model) -> Prediction {
        let classes = model.num_classes().max(self.target.len());
        if classes == 0 {
            return Prediction::default();
        }

        let total = self.total_weight();
        let values = (0..classes)
            .map(|class| PredictedValue {
                value: AttributeValue::from(class),
                votes: (self.target.get(class).copied().unwrap_or(0.0) + 1.0)
                    / (total + classes as f64),
            })
            .collect();
        Prediction::new(values)
    }

    /// A copy carrying only the target marginal.
    pub fn marginal(&self) -> Self {
        Self::from_class_dist(self.target.clone())
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.observers.clear();
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub(crate) fn heap_bytes(&self) -> usize {
        let observers: usize = self
            .observers
            .iter()
            .map(|(name, obs)| name.len() + mem::size_of::<String>() + obs.byte_size())
            .sum();
        self.target.len() * mem::size_of::<f64>() + observers
    }
}

/// Class-conditional statistics for one predictor.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ClassObserver {
    Nominal(NominalClassObserver),
    Numeric(NumericClassObserver),
}

impl ClassObserver {
    fn observe(&mut self, value: AttributeValue, class: usize, weight: f64) {
        match self {
            Self::Nominal(obs) => {
                if let Some(level) = value.index() {
                    obs.observe(level, class, weight);
                }
            }
            Self::Numeric(obs) => obs.observe(value.value(), class, weight),
        }
    }

    fn byte_size(&self) -> usize {
        mem::size_of::<Self>()
            + match self {
                Self::Nominal(obs) => obs
                    .counts
                    .iter()
                    .map(|row| mem::size_of::<Vec<f64>>() + row.len() * mem::size_of::<f64>())
                    .sum::<usize>(),
                Self::Numeric(obs) => {
                    obs.per_class.len() * mem::size_of::<GaussianEstimator>()
                }
            }
    }
}

/// Weight per (predictor level, target level) pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct NominalClassObserver {
    /// Indexed `counts[level][class]`.
    pub(crate) counts: Vec<Vec<f64>>,
}

impl NominalClassObserver {
    fn observe(&mut self, level: usize, class: usize, weight: f64) {
        if self.counts.len() <= level {
            self.counts.resize_with(level + 1, Vec::new);
        }
        let row = &mut self.counts[level];
        if row.len() <= class {
            row.resize(class + 1, 0.0);
        }
        row[class] += weight;
    }
}

/// One Gaussian of the predictor per target level, plus the observed range.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NumericClassObserver {
    pub(crate) per_class: Vec<GaussianEstimator>,
    pub(crate) min: f64,
    pub(crate) max: f64,
}

impl NumericClassObserver {
    pub(crate) fn new() -> Self {
        Self {
            per_class: Vec::new(),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn observe(&mut self, value: f64, class: usize, weight: f64) {
        if self.per_class.len() <= class {
            self.per_class
                .resize_with(class + 1, GaussianEstimator::default);
        }
        self.per_class[class].add(value, weight);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Attribute, MapInstance};
    use approx::assert_relative_eq;

    fn model() -> Model {
        Model::new(
            Attribute::nominal_with_levels("play", &["yes", "no"]),
            vec![
                Attribute::nominal("outlook"),
                Attribute::numeric("humidity"),
            ],
        )
    }

    fn observe(stats: &mut ClassificationStats, model: &Model, outlook: &str, humidity: f64, play: &str) {
        let inst = MapInstance::new()
            .set("outlook", outlook)
            .set("humidity", humidity)
            .set("play", play);
        stats.update(model, &inst, 1.0);
    }

    #[test]
    fn update_accumulates_target_and_observers() {
        let model = model();
        let mut stats = ClassificationStats::new();
        observe(&mut stats, &model, "sunny", 85.0, "no");
        observe(&mut stats, &model, "rainy", 70.0, "yes");
        observe(&mut stats, &model, "sunny", 90.0, "no");

        assert_relative_eq!(stats.total_weight(), 3.0);
        assert!(stats.is_sufficient());
        assert_eq!(stats.observers.len(), 2);

        let ClassObserver::Nominal(outlook) = &stats.observers["outlook"] else {
            panic!("expected nominal observer");
        };
        // sunny (level 0) has seen weight 2 for class "no" (index 1).
        assert_relative_eq!(outlook.counts[0][1], 2.0);
    }

    #[test]
    fn missing_predictors_are_skipped() {
        let model = model();
        let mut stats = ClassificationStats::new();
        let inst = MapInstance::new().set("outlook", "sunny").set("play", "yes");
        stats.update(&model, &inst, 1.0);

        assert!(stats.observers.contains_key("outlook"));
        assert!(!stats.observers.contains_key("humidity"));
    }

    #[test]
    fn missing_target_is_a_noop() {
        let model = model();
        let mut stats = ClassificationStats::new();
        let inst = MapInstance::new().set("outlook", "sunny");
        stats.update(&model, &inst, 1.0);
        assert_relative_eq!(stats.total_weight(), 0.0);
    }

    #[test]
    fn single_class_is_not_sufficient() {
        let model = model();
        let mut stats = ClassificationStats::new();
        observe(&mut stats, &model, "sunny", 85.0, "no");
        observe(&mut stats, &model, "rainy", 70.0, "no");
        assert!(!stats.is_sufficient());
    }

    #[test]
    fn predict_smooths_votes() {
        let model = model();
        let mut stats = ClassificationStats::new();
        observe(&mut stats, &model, "sunny", 85.0, "yes");
        observe(&mut stats, &model, "rainy", 70.0, "yes");
        observe(&mut stats, &model, "sunny", 90.0, "no");

        let prediction = stats.predict(&model);
        assert_eq!(prediction.index(), Some(0));
        // (2 + 1) / (3 + 2) for "yes", (1 + 1) / (3 + 2) for "no".
        assert_relative_eq!(prediction.top().votes, 0.6);
    }

    #[test]
    fn deactivate_keeps_the_marginal_only() {
        let model = model();
        let mut stats = ClassificationStats::new();
        observe(&mut stats, &model, "sunny", 85.0, "no");
        observe(&mut stats, &model, "rainy", 70.0, "yes");

        let before = stats.total_weight();
        stats.deactivate();
        assert!(stats.observers.is_empty());
        assert_relative_eq!(stats.total_weight(), before);

        // While inactive, updates touch the marginal but no observers.
        observe(&mut stats, &model, "sunny", 85.0, "no");
        assert!(stats.observers.is_empty());
        assert_relative_eq!(stats.total_weight(), before + 1.0);

        stats.activate();
        observe(&mut stats, &model, "rainy", 60.0, "yes");
        assert!(!stats.observers.is_empty());
    }

    #[test]
    fn update_order_is_irrelevant_for_identical_features() {
        let model = model();
        let a = MapInstance::new()
            .set("outlook", "sunny")
            .set("humidity", 85.0)
            .set("play", "yes");
        let b = MapInstance::new()
            .set("outlook", "sunny")
            .set("humidity", 85.0)
            .set("play", "no");

        let mut ab = ClassificationStats::new();
        ab.update(&model, &a, 1.0);
        ab.update(&model, &b, 1.0);

        let mut ba = ClassificationStats::new();
        ba.update(&model, &b, 1.0);
        ba.update(&model, &a, 1.0);

        assert_eq!(ab, ba);
    }
}
