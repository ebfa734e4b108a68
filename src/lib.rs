//! hoeffding: streaming decision trees for Rust.
//!
//! An online learner in the Hoeffding (VFDT) family: labelled instances are
//! consumed one at a time, sufficient statistics accumulate at the leaves,
//! and a leaf is promoted to a split node once the Hoeffding bound shows the
//! best predictor's merit has separated from the runner-up. Classification
//! and regression are both supported, decided by the model's target kind.
//!
//! # Key Types
//!
//! - [`HoeffdingTree`] - The tree, with train/predict/prune
//! - [`TreeConfig`] - Hyperparameter builder
//! - [`Model`] / [`Attribute`] - Describes the target and predictors
//! - [`Instance`] / [`MapInstance`] - Observations fed to the tree
//! - [`Prediction`] - Ranked votes per target value
//!
//! # Example
//!
//! ```
//! use hoeffding::{Attribute, HoeffdingTree, MapInstance, Model, TreeConfig};
//!
//! let model = Model::new(
//!     Attribute::nominal_with_levels("play", &["yes", "no"]),
//!     vec![
//!         Attribute::nominal("outlook"),
//!         Attribute::numeric("humidity"),
//!     ],
//! );
//! let tree = HoeffdingTree::new(model, TreeConfig::default()).unwrap();
//!
//! tree.train(&MapInstance::new()
//!     .set("outlook", "sunny")
//!     .set("humidity", 85)
//!     .set("play", "no"));
//!
//! let prediction = tree.predict(&MapInstance::new().set("outlook", "sunny"));
//! assert!(prediction.index().is_some());
//! ```
//!
//! # Concurrency
//!
//! The tree owns a single readers–writer lock: `train` is the only writer,
//! while `predict`, `info` and the renderings share the read side. A
//! prediction observes a training step either entirely or not at all.

pub mod config;
pub mod data;
pub mod persist;
pub mod split;
pub mod stats;
pub mod tree;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use config::{ConfigError, NominalSplitter, NumericSplitter, TreeConfig};
pub use data::{
    Attribute, AttributeKind, AttributeValue, AttributeValues, Instance, InstanceValue,
    MapInstance, Model, PredictedValue, Prediction,
};
pub use persist::PersistError;
pub use split::{SplitCondition, SplitSuggestion};
pub use stats::ObservationStats;
pub use tree::{HoeffdingTree, PossibleSplit, Trace, TreeInfo};
