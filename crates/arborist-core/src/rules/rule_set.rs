use serde::{Deserialize, Serialize};

use super::Predicate;
use crate::model::Verdict;

/// Verdict a rule assigns when it matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleVerdict {
    Keep,
    Delete,
}

impl From<RuleVerdict> for Verdict {
    fn from(verdict: RuleVerdict) -> Self {
        match verdict {
            RuleVerdict::Keep => Verdict::Keep,
            RuleVerdict::Delete => Verdict::Delete,
        }
    }
}

/// A named classification rule
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub verdict: RuleVerdict,
    pub predicate: Predicate,
    pub reason: String,
}

impl Rule {
    pub fn keep(name: impl Into<String>, predicate: Predicate, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verdict: RuleVerdict::Keep,
            predicate,
            reason: reason.into(),
        }
    }

    pub fn delete(name: impl Into<String>, predicate: Predicate, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verdict: RuleVerdict::Delete,
            predicate,
            reason: reason.into(),
        }
    }
}

/// Ordered rule list with KEEP rules always ahead of DELETE rules
///
/// Construction stably partitions the input: relative order inside each
/// group is preserved, so first-match-wins applies within KEEP rules and
/// within DELETE rules, and no DELETE rule can shadow a KEEP rule.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        let (mut ordered, deletes): (Vec<Rule>, Vec<Rule>) = rules
            .into_iter()
            .partition(|r| r.verdict == RuleVerdict::Keep);
        ordered.extend(deletes);
        Self { rules: ordered }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn keep_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules
            .iter()
            .take_while(|r| r.verdict == RuleVerdict::Keep)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_rules_move_ahead_stably() {
        let set = RuleSet::new(vec![
            Rule::delete("d1", Predicate::id_prefix("a"), ""),
            Rule::keep("k1", Predicate::id_prefix("b"), ""),
            Rule::delete("d2", Predicate::id_prefix("c"), ""),
            Rule::keep("k2", Predicate::id_prefix("d"), ""),
        ]);

        let names: Vec<&str> = set.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["k1", "k2", "d1", "d2"]);

        let keep: Vec<&str> = set.keep_rules().map(|r| r.name.as_str()).collect();
        assert_eq!(keep, vec!["k1", "k2"]);
    }
}
