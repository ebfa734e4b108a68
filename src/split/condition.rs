//! Conditions that route instances down split-node branches.

use std::sync::Arc;

use crate::data::{Attribute, Instance};

/// The test a split node applies to route an instance.
#[derive(Debug, Clone)]
pub enum SplitCondition {
    /// One branch per nominal level of the predictor.
    NominalMultiway { predictor: Arc<Attribute> },
    /// Two branches around a numeric threshold: `<= threshold` and
    /// `> threshold`.
    NumericBinary {
        predictor: Arc<Attribute>,
        threshold: f64,
    },
}

impl SplitCondition {
    pub fn nominal_multiway(predictor: Arc<Attribute>) -> Self {
        Self::NominalMultiway { predictor }
    }

    pub fn numeric_binary(predictor: Arc<Attribute>, threshold: f64) -> Self {
        Self::NumericBinary {
            predictor,
            threshold,
        }
    }

    /// The branch index for an instance. `None` when the predictor value is
    /// missing.
    pub fn branch(&self, instance: &dyn Instance) -> Option<usize> {
        match self {
            Self::NominalMultiway { predictor } => predictor.value_in(instance).index(),
            Self::NumericBinary {
                predictor,
                threshold,
            } => {
                let value = predictor.value_in(instance);
                if value.is_missing() {
                    None
                } else if value.value() <= *threshold {
                    Some(0)
                } else {
                    Some(1)
                }
            }
        }
    }

    pub fn predictor(&self) -> &Arc<Attribute> {
        match self {
            Self::NominalMultiway { predictor } => predictor,
            Self::NumericBinary { predictor, .. } => predictor,
        }
    }

    pub fn predictor_name(&self) -> &str {
        self.predictor().name()
    }

    /// Number of branches the condition can currently route to.
    pub fn arity(&self) -> usize {
        match self {
            Self::NominalMultiway { predictor } => predictor.len(),
            Self::NumericBinary { .. } => 2,
        }
    }

    /// A human-readable description of one branch, for renderings.
    pub fn describe(&self, branch: usize) -> String {
        match self {
            Self::NominalMultiway { predictor } => {
                predictor.values().label(branch).unwrap_or_default()
            }
            Self::NumericBinary { threshold, .. } => match branch {
                0 => format!("<= {threshold}"),
                1 => format!("> {threshold}"),
                _ => String::new(),
            },
        }
    }
}
