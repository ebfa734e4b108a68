//! Per-leaf sufficient statistics.
//!
//! Each leaf owns an [`ObservationStats`]: enough summary state to score
//! every candidate split without retaining raw instances. The variant is
//! fixed by the task (classification or regression) and holds the target
//! marginal plus one conditional observer per predictor seen.

mod classification;
mod gaussian;
mod regression;

pub use classification::ClassificationStats;
pub use gaussian::{GaussianEstimator, TargetStats};
pub use regression::RegressionStats;

pub(crate) use classification::{ClassObserver, NominalClassObserver, NumericClassObserver};
pub(crate) use regression::{NominalRegObserver, NumericRegObserver, RegObserver, SplitCandidate};

use crate::config::ResolvedConfig;
use crate::data::{Instance, Model, Prediction};
use crate::split::{splitters, SplitSuggestion};

/// A leaf's sufficient statistics, one variant per task.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservationStats {
    Classification(ClassificationStats),
    Regression(RegressionStats),
}

impl ObservationStats {
    pub fn new(is_regression: bool) -> Self {
        if is_regression {
            Self::Regression(RegressionStats::new())
        } else {
            Self::Classification(ClassificationStats::new())
        }
    }

    /// Fold one instance into the statistics.
    pub fn update(
        &mut self,
        model: &Model,
        instance: &dyn Instance,
        weight: f64,
        split_points: usize,
    ) {
        match self {
            Self::Classification(stats) => stats.update(model, instance, weight),
            Self::Regression(stats) => stats.update(model, instance, weight, split_points),
        }
    }

    /// Total target weight observed.
    pub fn total_weight(&self) -> f64 {
        match self {
            Self::Classification(stats) => stats.total_weight(),
            Self::Regression(stats) => stats.total_weight(),
        }
    }

    /// Whether the statistics can support a split decision.
    pub fn is_sufficient(&self) -> bool {
        match self {
            Self::Classification(stats) => stats.is_sufficient(),
            Self::Regression(stats) => stats.is_sufficient(),
        }
    }

    pub fn predict(&self, model: &Model) -> Prediction {
        match self {
            Self::Classification(stats) => stats.predict(model),
            Self::Regression(stats) => stats.predict(),
        }
    }

    /// A copy carrying only the target marginal, as used for split-node
    /// fallback statistics.
    pub fn marginal(&self) -> Self {
        match self {
            Self::Classification(stats) => Self::Classification(stats.marginal()),
            Self::Regression(stats) => Self::Regression(stats.marginal()),
        }
    }

    /// Shrink to the target marginal; conditional observers are dropped and
    /// not rebuilt until [`activate`](Self::activate).
    pub fn deactivate(&mut self) {
        match self {
            Self::Classification(stats) => stats.deactivate(),
            Self::Regression(stats) => stats.deactivate(),
        }
    }

    /// Resume tracking conditional observers.
    pub fn activate(&mut self) {
        match self {
            Self::Classification(stats) => stats.activate(),
            Self::Regression(stats) => stats.activate(),
        }
    }

    /// Ranked candidate splits, best first.
    ///
    /// Always contains a trailing null suggestion with merit 0, so a merit
    /// gain is well-defined even with a single viable predictor.
    pub(crate) fn best_splits(&self, model: &Model, cfg: &ResolvedConfig) -> Vec<SplitSuggestion> {
        let mut suggestions = vec![SplitSuggestion::null(self.marginal())];

        for attr in model.predictors() {
            let eval = match self {
                Self::Classification(stats) => match stats.observers.get(attr.name()) {
                    Some(ClassObserver::Nominal(obs)) => {
                        splitters::nominal_classification(cfg.nominal, attr, obs)
                    }
                    Some(ClassObserver::Numeric(obs)) => {
                        splitters::numeric_classification(cfg.numeric, attr, obs, cfg.split_points)
                    }
                    None => None,
                },
                Self::Regression(stats) => match stats.observers.get(attr.name()) {
                    Some(RegObserver::Nominal(obs)) => {
                        splitters::nominal_regression(cfg.nominal, attr, obs)
                    }
                    Some(RegObserver::Numeric(obs)) => {
                        splitters::numeric_regression(cfg.numeric, attr, obs)
                    }
                    None => None,
                },
            };
            if let Some(eval) = eval {
                suggestions.push(SplitSuggestion::new(
                    eval.condition,
                    eval.merit,
                    eval.range,
                    self.marginal(),
                    eval.post,
                ));
            }
        }

        SplitSuggestion::rank(&mut suggestions);
        suggestions
    }

    /// Estimated size in bytes, consistent across repeated queries.
    pub fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.heap_bytes()
    }

    pub(crate) fn heap_bytes(&self) -> usize {
        match self {
            Self::Classification(stats) => stats.heap_bytes(),
            Self::Regression(stats) => stats.heap_bytes(),
        }
    }
}
