//! Label-selector matching over chart keywords.
//!
//! A chart's keywords are treated as a label set in which every keyword
//! maps to itself, so both `matchLabels: {stable: stable}` and an `Exists`
//! requirement on `stable` select a chart keyworded `stable`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Set-based operator of a [`LabelSelectorRequirement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectorOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

impl fmt::Display for SelectorOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorOperator::In => write!(f, "In"),
            SelectorOperator::NotIn => write!(f, "NotIn"),
            SelectorOperator::Exists => write!(f, "Exists"),
            SelectorOperator::DoesNotExist => write!(f, "DoesNotExist"),
        }
    }
}

/// One set-based requirement: `key`, `operator`, and for `In`/`NotIn`
/// a non-empty list of `values`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSelectorRequirement {
    pub key: String,
    pub operator: SelectorOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl LabelSelectorRequirement {
    pub fn new(key: impl Into<String>, operator: SelectorOperator, values: &[&str]) -> Self {
        Self {
            key: key.into(),
            operator,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.key.trim().is_empty() {
            return Err("requirement key must not be empty".to_string());
        }
        match self.operator {
            SelectorOperator::In | SelectorOperator::NotIn if self.values.is_empty() => Err(
                format!("{} requirement on '{}' needs values", self.operator, self.key),
            ),
            SelectorOperator::Exists | SelectorOperator::DoesNotExist
                if !self.values.is_empty() =>
            {
                Err(format!(
                    "{} requirement on '{}' must not carry values",
                    self.operator, self.key
                ))
            }
            _ => Ok(()),
        }
    }

    fn matches(&self, labels: &BTreeMap<&str, &str>) -> bool {
        let value = labels.get(self.key.as_str());
        match self.operator {
            SelectorOperator::In => value.is_some_and(|v| self.values.iter().any(|x| x == v)),
            SelectorOperator::NotIn => !value.is_some_and(|v| self.values.iter().any(|x| x == v)),
            SelectorOperator::Exists => value.is_some(),
            SelectorOperator::DoesNotExist => value.is_none(),
        }
    }
}

/// Predicate over a label set. All requirements must hold.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<LabelSelectorRequirement>,
}

impl LabelSelector {
    /// Create a selector with no requirements. It matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require label `key` to equal `value`.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.match_labels.insert(key.into(), value.into());
        self
    }

    /// Add a set-based requirement.
    pub fn with_expression(mut self, requirement: LabelSelectorRequirement) -> Self {
        self.match_expressions.push(requirement);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty() && self.match_expressions.is_empty()
    }

    /// Evaluate the selector against chart keywords.
    ///
    /// A malformed selector never matches.
    pub fn matches_keywords(&self, keywords: &[String]) -> bool {
        if self.is_empty() {
            return true;
        }
        if let Err(reason) = self.validate() {
            tracing::debug!("label selector cannot be satisfied: {}", reason);
            return false;
        }

        let labels: BTreeMap<&str, &str> = keywords
            .iter()
            .map(|k| (k.as_str(), k.as_str()))
            .collect();

        let labels_match = self
            .match_labels
            .iter()
            .all(|(key, value)| labels.get(key.as_str()) == Some(&value.as_str()));

        labels_match && self.match_expressions.iter().all(|r| r.matches(&labels))
    }

    fn validate(&self) -> Result<(), String> {
        if self.match_labels.keys().any(|k| k.trim().is_empty()) {
            return Err("matchLabels key must not be empty".to_string());
        }
        self.match_expressions
            .iter()
            .try_for_each(LabelSelectorRequirement::validate)
    }
}

/// Check chart keywords against an optional selector.
///
/// No selector means keywords are unconstrained.
pub fn keywords_match(selector: Option<&LabelSelector>, keywords: &[String]) -> bool {
    selector.is_none_or(|s| s.matches_keywords(keywords))
}
