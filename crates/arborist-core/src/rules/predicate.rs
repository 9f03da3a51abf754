use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::model::Attributes;

/// Matching condition of a rule
///
/// Predicates are evaluated against an entity's id and attributes. They are
/// pure: a predicate never fails, a missing or mistyped attribute is simply
/// a non-match.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Id is one of a fixed set
    ExactId(BTreeSet<String>),
    /// Id starts with a prefix
    IdPrefix(String),
    /// Id matches a compiled regular expression
    IdRegex(Regex),
    /// Named attribute equals a JSON value
    FieldEquals { field: String, value: Value },
    /// Substring match on any of the listed string attributes
    NameContains {
        fields: Vec<String>,
        needle: String,
        case_insensitive: bool,
    },
    /// Array attribute contains a string element
    TagContains { field: String, tag: String },
}

impl Predicate {
    pub fn exact_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::ExactId(ids.into_iter().map(Into::into).collect())
    }

    pub fn id_prefix(prefix: impl Into<String>) -> Self {
        Predicate::IdPrefix(prefix.into())
    }

    pub fn name_contains<I, S>(fields: I, needle: impl Into<String>, case_insensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let needle = needle.into();
        Predicate::NameContains {
            fields: fields.into_iter().map(Into::into).collect(),
            needle: if case_insensitive {
                needle.to_lowercase()
            } else {
                needle
            },
            case_insensitive,
        }
    }

    pub fn matches(&self, id: &str, attributes: &Attributes) -> bool {
        match self {
            Predicate::ExactId(ids) => ids.contains(id),
            Predicate::IdPrefix(prefix) => id.starts_with(prefix.as_str()),
            Predicate::IdRegex(re) => re.is_match(id),
            Predicate::FieldEquals { field, value } => attributes.get(field) == Some(value),
            Predicate::NameContains {
                fields,
                needle,
                case_insensitive,
            } => fields.iter().any(|field| {
                attributes.get_str(field).is_some_and(|text| {
                    if *case_insensitive {
                        text.to_lowercase().contains(needle.as_str())
                    } else {
                        text.contains(needle.as_str())
                    }
                })
            }),
            Predicate::TagContains { field, tag } => attributes
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.iter().any(|v| v.as_str() == Some(tag.as_str()))),
        }
    }

    /// Short human-readable form used in dispositions
    pub fn describe(&self) -> String {
        match self {
            Predicate::ExactId(ids) => {
                let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
                format!("id in {{{}}}", ids.join(", "))
            }
            Predicate::IdPrefix(prefix) => format!("id starts with '{}'", prefix),
            Predicate::IdRegex(re) => format!("id matches /{}/", re.as_str()),
            Predicate::FieldEquals { field, value } => format!("{} == {}", field, value),
            Predicate::NameContains { fields, needle, .. } => {
                format!("{} contains '{}'", fields.join("|"), needle)
            }
            Predicate::TagContains { field, tag } => format!("{} has tag '{}'", field, tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exact_and_prefix() {
        let attrs = Attributes::new();
        assert!(Predicate::exact_ids(["platform"]).matches("platform", &attrs));
        assert!(!Predicate::exact_ids(["platform"]).matches("platform-2", &attrs));
        assert!(Predicate::id_prefix("test-org-").matches("test-org-7", &attrs));
        assert!(!Predicate::id_prefix("test-org-").matches("acme", &attrs));
    }

    #[test]
    fn test_id_regex() {
        let p = Predicate::IdRegex(Regex::new(r"^e2e-\d+$").unwrap());
        assert!(p.matches("e2e-42", &Attributes::new()));
        assert!(!p.matches("e2e-x", &Attributes::new()));
    }

    #[test]
    fn test_field_equals_is_type_sensitive() {
        let attrs = Attributes::new().with("plan", "trial").with("seats", 3);
        let p = Predicate::FieldEquals {
            field: "plan".to_string(),
            value: json!("trial"),
        };
        assert!(p.matches("x", &attrs));

        let p = Predicate::FieldEquals {
            field: "seats".to_string(),
            value: json!("3"),
        };
        assert!(!p.matches("x", &attrs));
    }

    #[test]
    fn test_name_contains_case_insensitive() {
        let attrs = Attributes::new().with("displayName", "QA Sandbox");
        let ci = Predicate::name_contains(["name", "displayName"], "sandbox", true);
        let cs = Predicate::name_contains(["name", "displayName"], "sandbox", false);
        assert!(ci.matches("x", &attrs));
        assert!(!cs.matches("x", &attrs));
    }

    #[test]
    fn test_tag_contains() {
        let attrs = Attributes::new().with("tags", json!(["ephemeral", "ci"]));
        let p = Predicate::TagContains {
            field: "tags".to_string(),
            tag: "ci".to_string(),
        };
        assert!(p.matches("x", &attrs));
        assert!(!p.matches("x", &Attributes::new().with("tags", "ci")));
    }
}
