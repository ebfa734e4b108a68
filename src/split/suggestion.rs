//! Candidate split suggestions produced by the splitter policies.

use std::collections::BTreeMap;

use crate::stats::ObservationStats;

use super::condition::SplitCondition;

/// One candidate split: its condition, merit, merit range and the statistics
/// before and after applying it.
///
/// The null suggestion (no condition, merit 0) anchors the merit-gain
/// computation when only one viable predictor exists.
#[derive(Debug, Clone)]
pub struct SplitSuggestion {
    condition: Option<SplitCondition>,
    merit: f64,
    range: f64,
    pre_stats: ObservationStats,
    post_stats: BTreeMap<usize, ObservationStats>,
}

impl SplitSuggestion {
    pub fn new(
        condition: SplitCondition,
        merit: f64,
        range: f64,
        pre_stats: ObservationStats,
        post_stats: BTreeMap<usize, ObservationStats>,
    ) -> Self {
        Self {
            condition: Some(condition),
            merit,
            range,
            pre_stats,
            post_stats,
        }
    }

    /// The null suggestion: no condition, zero merit.
    pub fn null(pre_stats: ObservationStats) -> Self {
        Self {
            condition: None,
            merit: 0.0,
            range: 0.0,
            pre_stats,
            post_stats: BTreeMap::new(),
        }
    }

    pub fn condition(&self) -> Option<&SplitCondition> {
        self.condition.as_ref()
    }

    pub fn merit(&self) -> f64 {
        self.merit
    }

    pub fn range(&self) -> f64 {
        self.range
    }

    pub fn pre_stats(&self) -> &ObservationStats {
        &self.pre_stats
    }

    pub fn post_stats(&self) -> &BTreeMap<usize, ObservationStats> {
        &self.post_stats
    }

    /// Decompose into the pieces a split node is built from.
    ///
    /// Returns `None` for the null suggestion.
    pub fn into_parts(
        self,
    ) -> Option<(
        SplitCondition,
        ObservationStats,
        BTreeMap<usize, ObservationStats>,
    )> {
        let condition = self.condition?;
        Some((condition, self.pre_stats, self.post_stats))
    }

    /// Sort suggestions by descending merit.
    pub fn rank(suggestions: &mut [SplitSuggestion]) {
        suggestions.sort_by(|a, b| {
            b.merit
                .partial_cmp(&a.merit)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Attribute;
    use crate::stats::ObservationStats;
    use std::sync::Arc;

    fn suggestion(merit: f64) -> SplitSuggestion {
        SplitSuggestion::new(
            SplitCondition::numeric_binary(Arc::new(Attribute::numeric("x")), 1.0),
            merit,
            1.0,
            ObservationStats::new(false),
            BTreeMap::new(),
        )
    }

    #[test]
    fn rank_puts_the_best_first() {
        let mut suggestions = vec![
            suggestion(0.1),
            SplitSuggestion::null(ObservationStats::new(false)),
            suggestion(0.7),
        ];
        SplitSuggestion::rank(&mut suggestions);

        let merits: Vec<f64> = suggestions.iter().map(|s| s.merit()).collect();
        assert_eq!(merits, vec![0.7, 0.1, 0.0]);
    }

    #[test]
    fn null_suggestion_has_no_parts() {
        assert!(SplitSuggestion::null(ObservationStats::new(true))
            .into_parts()
            .is_none());
    }
}
