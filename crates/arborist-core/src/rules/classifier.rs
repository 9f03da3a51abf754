use super::{Rule, RuleSet};
use crate::model::{Attributes, Disposition};
use crate::policy::DefaultPolicy;

/// Pure KEEP/DELETE classifier
///
/// Walks the rule set in order and returns the first match. Entities no rule
/// matches are resolved by the default policy. Classification cannot fail;
/// every regex was compiled when the rule set was built.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    rules: RuleSet,
    default_policy: DefaultPolicy,
}

impl Classifier {
    pub fn new(rules: RuleSet, default_policy: DefaultPolicy) -> Self {
        Self {
            rules,
            default_policy,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn default_policy(&self) -> DefaultPolicy {
        self.default_policy
    }

    /// Classify one entity
    ///
    /// # Example
    ///
    /// ```
    /// use arborist_core::model::{Attributes, Verdict};
    /// use arborist_core::policy::DefaultPolicy;
    /// use arborist_core::rules::{Classifier, Predicate, Rule, RuleSet};
    ///
    /// let classifier = Classifier::new(
    ///     RuleSet::new(vec![Rule::keep("core", Predicate::exact_ids(["platform"]), "core tenant")]),
    ///     DefaultPolicy::Delete,
    /// );
    /// assert_eq!(classifier.classify("platform", &Attributes::new()).verdict, Verdict::Keep);
    /// assert_eq!(classifier.classify("acme", &Attributes::new()).verdict, Verdict::Delete);
    /// ```
    pub fn classify(&self, id: &str, attributes: &Attributes) -> Disposition {
        match self.rules.iter().find(|r| r.predicate.matches(id, attributes)) {
            Some(rule) => {
                let reason = if rule.reason.is_empty() {
                    rule.predicate.describe()
                } else {
                    rule.reason.clone()
                };
                Disposition::from_rule(rule.verdict.into(), &rule.name, reason)
            }
            None => self.default_policy.resolve(),
        }
    }

    /// First KEEP rule matching the entity, if any
    ///
    /// Used to protect descendants of DELETE targets that match a KEEP rule.
    pub fn matches_keep(&self, id: &str, attributes: &Attributes) -> Option<&Rule> {
        self.rules
            .keep_rules()
            .find(|r| r.predicate.matches(id, attributes))
    }
}
