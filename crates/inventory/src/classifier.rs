//! Step classification: does completing a workflow step move stock?

use serde::{Deserialize, Serialize};

/// Inventory intent of a workflow step.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InventoryMode {
    /// Completion decreases stock (outgoing).
    #[serde(rename = "ISSUE")]
    Issue,
    /// Completion increases stock (incoming).
    #[serde(rename = "RECEIVE")]
    Receive,
    /// No inventory effect.
    #[serde(rename = "NONE")]
    NoEffect,
}

impl InventoryMode {
    pub fn is_inventory(self) -> bool {
        !matches!(self, InventoryMode::NoEffect)
    }
}

/// Keyword sets, matched as lower-case substrings of the step text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepVocabulary {
    pub issue: Vec<String>,
    pub receive: Vec<String>,
}

impl Default for StepVocabulary {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|w| w.to_string()).collect();
        Self {
            issue: words(&[
                "со склада",
                "выдать",
                "отгруз",
                "списать",
                "выдача",
                "продать",
                "продажа",
                "реализовать",
            ]),
            receive: words(&[
                "на склад",
                "принять",
                "прием",
                "приём",
                "получить",
                "возврат",
                "поступление",
                "вернуть",
                "принять возврат",
            ]),
        }
    }
}

impl StepVocabulary {
    pub fn with_issue(mut self, keyword: impl Into<String>) -> Self {
        self.issue.push(keyword.into());
        self
    }

    pub fn with_receive(mut self, keyword: impl Into<String>) -> Self {
        self.receive.push(keyword.into());
        self
    }
}

/// Pure keyword classifier over a [`StepVocabulary`].
///
/// Receive keywords are checked before issue keywords, so text matching both
/// sets classifies as [`InventoryMode::Receive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepClassifier {
    issue: Vec<String>,
    receive: Vec<String>,
}

impl Default for StepClassifier {
    fn default() -> Self {
        Self::new(StepVocabulary::default())
    }
}

impl StepClassifier {
    pub fn new(vocabulary: StepVocabulary) -> Self {
        let normalize = |words: Vec<String>| {
            words
                .into_iter()
                .map(|w| w.to_lowercase())
                .filter(|w| !w.trim().is_empty())
                .collect()
        };
        Self {
            issue: normalize(vocabulary.issue),
            receive: normalize(vocabulary.receive),
        }
    }

    pub fn classify(&self, name: &str, operation: Option<&str>) -> InventoryMode {
        let text = format!(
            "{} {}",
            name.to_lowercase(),
            operation.unwrap_or_default().to_lowercase()
        );
        let matches = |words: &[String]| words.iter().any(|w| text.contains(w.as_str()));

        if matches(&self.receive) {
            InventoryMode::Receive
        } else if matches(&self.issue) {
            InventoryMode::Issue
        } else {
            InventoryMode::NoEffect
        }
    }
}

/// Classify with the default vocabulary.
pub fn classify_step(name: &str, operation: Option<&str>) -> InventoryMode {
    StepClassifier::default().classify(name, operation)
}
