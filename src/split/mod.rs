//! Split conditions, candidate suggestions and the splitter policies.

mod condition;
mod suggestion;
pub(crate) mod splitters;

pub use condition::SplitCondition;
pub use suggestion::SplitSuggestion;
