//! Tree hyperparameters and splitter policy selection.
//!
//! [`TreeConfig`] uses a builder with validation at build time. Splitter
//! policies form a small closed set, chosen per predictor kind and task;
//! [`TreeConfig::normalize`] fills in the task-appropriate defaults and
//! rejects mismatched choices before any training happens.
//!
//! # Example
//!
//! ```
//! use hoeffding::TreeConfig;
//!
//! // All defaults
//! let config = TreeConfig::builder().build().unwrap();
//!
//! // Customised split decision
//! let config = TreeConfig::builder()
//!     .grace_period(50.0)
//!     .split_confidence(1e-4)
//!     .enable_tracing(true)
//!     .build()
//!     .unwrap();
//! ```

use std::str::FromStr;

use bon::Builder;

// =============================================================================
// ConfigError
// =============================================================================

/// Errors raised during configuration validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The splitter name does not designate a known policy.
    #[error("unknown splitter name: {0:?}")]
    UnknownSplitter(String),
    /// `grace_period` must be positive.
    #[error("grace_period must be positive, got {0}")]
    InvalidGracePeriod(f64),
    /// `split_confidence` must lie strictly between 0 and 1.
    #[error("split_confidence must be in (0, 1), got {0}")]
    InvalidSplitConfidence(f64),
    /// `tie_threshold` must be non-negative.
    #[error("tie_threshold must be non-negative, got {0}")]
    InvalidTieThreshold(f64),
    /// `split_points` must be at least 1.
    #[error("split_points must be at least 1")]
    InvalidSplitPoints,
    /// The chosen splitter does not apply to the model's task.
    #[error("splitter {splitter:?} does not apply to {task} targets")]
    SplitterTaskMismatch {
        splitter: &'static str,
        task: &'static str,
    },
}

// =============================================================================
// Splitter policies
// =============================================================================

/// Split policy for nominal predictors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NominalSplitter {
    /// Information-gain multiway split (classification).
    InfoGain,
    /// Variance-reduction multiway split (regression).
    VarianceReduction,
}

impl NominalSplitter {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InfoGain => "infogain",
            Self::VarianceReduction => "variance",
        }
    }
}

impl FromStr for NominalSplitter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "infogain" => Ok(Self::InfoGain),
            "variance" => Ok(Self::VarianceReduction),
            other => Err(ConfigError::UnknownSplitter(other.to_owned())),
        }
    }
}

/// Split policy for numeric predictors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericSplitter {
    /// Gaussian-approximated binary split on a threshold grid
    /// (classification).
    Gaussian,
    /// Variance-reduction binary split on a threshold grid (regression).
    VarianceReduction,
}

impl NumericSplitter {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gaussian => "gaussian",
            Self::VarianceReduction => "variance",
        }
    }
}

impl FromStr for NumericSplitter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gaussian" => Ok(Self::Gaussian),
            "variance" => Ok(Self::VarianceReduction),
            other => Err(ConfigError::UnknownSplitter(other.to_owned())),
        }
    }
}

// =============================================================================
// TreeConfig
// =============================================================================

/// Hyperparameters of the tree.
///
/// Build with [`TreeConfig::builder`]; unset options keep their defaults.
/// Splitter policies left as `None` are resolved against the model's task
/// when the tree normalises the configuration.
#[derive(Debug, Clone, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct TreeConfig {
    /// Minimum additional weight a leaf must accumulate between split
    /// attempts. Default: 200.
    #[builder(default = 200.0)]
    pub grace_period: f64,

    /// δ in the Hoeffding bound; smaller is more conservative.
    /// Default: 1e-7.
    #[builder(default = 1e-7)]
    pub split_confidence: f64,

    /// Accept the best split regardless of merit gain once the bound falls
    /// below this threshold. Default: 0.05.
    #[builder(default = 0.05)]
    pub tie_threshold: f64,

    /// Training cycles between pruning passes; 0 disables pruning.
    /// Default: 0.
    #[builder(default = 0)]
    pub prune_period: u64,

    /// Target byte budget for the tree. Default: unbounded.
    #[builder(default = usize::MAX)]
    pub prune_mem_target: usize,

    /// Split policy for nominal predictors. `None` picks the task default.
    pub splitter_nominal: Option<NominalSplitter>,

    /// Split policy for numeric predictors. `None` picks the task default.
    pub splitter_numeric: Option<NumericSplitter>,

    /// Number of candidate thresholds evaluated per numeric predictor.
    /// Default: 10.
    #[builder(default = 10)]
    pub split_points: usize,

    /// Produce a [`Trace`](crate::tree::Trace) per training cycle.
    /// Default: false.
    #[builder(default = false)]
    pub enable_tracing: bool,
}

/// Custom finishing function that validates the config.
impl<S: tree_config_builder::IsComplete> TreeConfigBuilder<S> {
    /// Build and validate the configuration.
    pub fn build(self) -> Result<TreeConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::builder().build().expect("default config is valid")
    }
}

impl TreeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.grace_period <= 0.0 {
            return Err(ConfigError::InvalidGracePeriod(self.grace_period));
        }
        if !(self.split_confidence > 0.0 && self.split_confidence < 1.0) {
            return Err(ConfigError::InvalidSplitConfidence(self.split_confidence));
        }
        if self.tie_threshold < 0.0 {
            return Err(ConfigError::InvalidTieThreshold(self.tie_threshold));
        }
        if self.split_points == 0 {
            return Err(ConfigError::InvalidSplitPoints);
        }
        Ok(())
    }

    /// Fill defaults and pick task-appropriate splitters.
    pub(crate) fn normalize(&self, is_regression: bool) -> Result<ResolvedConfig, ConfigError> {
        self.validate()?;

        let nominal = self.splitter_nominal.unwrap_or(if is_regression {
            NominalSplitter::VarianceReduction
        } else {
            NominalSplitter::InfoGain
        });
        let numeric = self.splitter_numeric.unwrap_or(if is_regression {
            NumericSplitter::VarianceReduction
        } else {
            NumericSplitter::Gaussian
        });

        let task = if is_regression {
            "regression"
        } else {
            "classification"
        };
        match (nominal, is_regression) {
            (NominalSplitter::InfoGain, true) | (NominalSplitter::VarianceReduction, false) => {
                return Err(ConfigError::SplitterTaskMismatch {
                    splitter: nominal.name(),
                    task,
                });
            }
            _ => {}
        }
        match (numeric, is_regression) {
            (NumericSplitter::Gaussian, true) | (NumericSplitter::VarianceReduction, false) => {
                return Err(ConfigError::SplitterTaskMismatch {
                    splitter: numeric.name(),
                    task,
                });
            }
            _ => {}
        }

        Ok(ResolvedConfig {
            grace_period: self.grace_period,
            split_confidence: self.split_confidence,
            tie_threshold: self.tie_threshold,
            prune_period: self.prune_period,
            prune_mem_target: self.prune_mem_target,
            nominal,
            numeric,
            split_points: self.split_points,
            enable_tracing: self.enable_tracing,
        })
    }
}

/// A validated configuration with splitters resolved for the model's task.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedConfig {
    pub grace_period: f64,
    pub split_confidence: f64,
    pub tie_threshold: f64,
    pub prune_period: u64,
    pub prune_mem_target: usize,
    pub nominal: NominalSplitter,
    pub numeric: NumericSplitter,
    pub split_points: usize,
    pub enable_tracing: bool,
}

// =============================================================================
// Tests
// =============================================================================
