//! The model descriptor consulted by the tree.

use std::sync::Arc;

use super::attribute::{Attribute, AttributeValue};
use super::instance::Instance;

/// A read-only descriptor of the learning problem: one target attribute plus
/// the ordered list of predictor attributes.
///
/// The target kind decides the task: a numeric target means regression, a
/// nominal target means classification.
#[derive(Debug, Clone)]
pub struct Model {
    target: Arc<Attribute>,
    predictors: Vec<Arc<Attribute>>,
}

impl Model {
    pub fn new(target: Attribute, predictors: Vec<Attribute>) -> Self {
        Self {
            target: Arc::new(target),
            predictors: predictors.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn is_regression(&self) -> bool {
        self.target.is_numeric()
    }

    pub fn target(&self) -> &Arc<Attribute> {
        &self.target
    }

    pub fn predictors(&self) -> &[Arc<Attribute>] {
        &self.predictors
    }

    /// Look up a predictor attribute by name.
    pub fn predictor(&self, name: &str) -> Option<&Arc<Attribute>> {
        self.predictors.iter().find(|a| a.name() == name)
    }

    /// Number of target levels seen so far; 0 for regression.
    pub fn num_classes(&self) -> usize {
        self.target.len()
    }

    /// Extract the target value from an instance.
    pub fn target_value(&self, instance: &dyn Instance) -> AttributeValue {
        self.target.value_in(instance)
    }
}
