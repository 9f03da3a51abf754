//! Classification rules and the classifier

mod classifier;
mod predicate;
mod rule_set;

pub use classifier::Classifier;
pub use predicate::Predicate;
pub use rule_set::{Rule, RuleSet, RuleVerdict};
