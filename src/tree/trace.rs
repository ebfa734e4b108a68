//! Per-training-cycle diagnostics.

/// One candidate split considered during a split attempt.
#[derive(Debug, Clone)]
pub struct PossibleSplit {
    pub predictor: String,
    pub merit: f64,
}

/// Diagnostic record of one training cycle's split decision.
///
/// Produced by [`HoeffdingTree::train`](crate::HoeffdingTree::train) when
/// tracing is enabled and the landed leaf was evaluated for a split.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    /// The viable candidate splits, best first.
    pub possible_splits: Vec<PossibleSplit>,
    /// Merit difference between the best split and the runner-up.
    pub merit_gain: f64,
    /// The Hoeffding bound the gain was tested against.
    pub hoeffding_bound: f64,
    /// Whether the split was accepted.
    pub split: bool,
}
