/*!
 * Attribute filter engine.
 *
 * A `FilterRules` value maps HLS attribute names to the set of values a
 * rendition may carry for that attribute. Selection is a pure function over
 * an already-parsed `MasterPlaylist`.
 */

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::AppError;

use super::master::{MasterPlaylist, PlaylistEntry};

/// Attribute key the language override is merged into
pub const LANGUAGE_ATTRIBUTE: &str = "LANGUAGE";

/// Allowed value as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AllowedValue {
    /// Exact string
    Exact(String),
    /// Regular expression that must match the whole value
    Pattern { pattern: String },
}

impl AllowedValue {
    pub fn exact(value: &str) -> Self {
        Self::Exact(value.to_string())
    }

    pub fn pattern(pattern: &str) -> Self {
        Self::Pattern {
            pattern: pattern.to_string(),
        }
    }
}

/// Compiled allowed value
#[derive(Debug, Clone)]
enum Matcher {
    Exact(String),
    Pattern { source: String, regex: Regex },
}

impl Matcher {
    fn compile(value: &AllowedValue) -> Result<Self, AppError> {
        match value {
            AllowedValue::Exact(value) => Ok(Self::Exact(value.clone())),
            AllowedValue::Pattern { pattern } => {
                let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
                    AppError::InvalidFilter(format!("Invalid pattern '{}': {}", pattern, e))
                })?;
                Ok(Self::Pattern {
                    source: pattern.clone(),
                    regex,
                })
            }
        }
    }

    fn matches(&self, candidate: &str) -> bool {
        match self {
            Self::Exact(value) => value == candidate,
            Self::Pattern { regex, .. } => regex.is_match(candidate),
        }
    }

    fn same_as(&self, other: &Matcher) -> bool {
        match (self, other) {
            (Self::Exact(a), Self::Exact(b)) => a == b,
            (Self::Pattern { source: a, .. }, Self::Pattern { source: b, .. }) => a == b,
            _ => false,
        }
    }
}

/// Set of allowed values for one attribute
#[derive(Debug, Clone, Default)]
pub struct AllowedSet {
    matchers: Vec<Matcher>,
}

impl AllowedSet {
    /// Whether `candidate` is a member of the set
    pub fn contains(&self, candidate: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(candidate))
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    fn insert(&mut self, matcher: Matcher) {
        if !self.matchers.iter().any(|m| m.same_as(&matcher)) {
            self.matchers.push(matcher);
        }
    }
}

/// Attribute filter rules, keyed by upper-cased HLS attribute name
#[derive(Debug, Clone, Default)]
pub struct FilterRules {
    rules: BTreeMap<String, AllowedSet>,
}

impl FilterRules {
    /// Rules that match every rendition
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile rules from configuration values
    pub fn from_config(config: &BTreeMap<String, Vec<AllowedValue>>) -> Result<Self, AppError> {
        let mut rules = Self::new();
        for (attribute, values) in config {
            rules = rules.with_values(attribute, values)?;
        }
        Ok(rules)
    }

    /// Add allowed values for an attribute, extending any existing set
    pub fn with_values(mut self, attribute: &str, values: &[AllowedValue]) -> Result<Self, AppError> {
        let set = self.rules.entry(attribute.to_ascii_uppercase()).or_default();
        for value in values {
            set.insert(Matcher::compile(value)?);
        }
        Ok(self)
    }

    /// Add exact allowed values for an attribute
    pub fn with_exact(mut self, attribute: &str, values: &[&str]) -> Self {
        let set = self.rules.entry(attribute.to_ascii_uppercase()).or_default();
        for value in values {
            set.insert(Matcher::Exact(value.to_string()));
        }
        self
    }

    /// Allowed set for an attribute, if constrained
    pub fn get(&self, attribute: &str) -> Option<&AllowedSet> {
        self.rules.get(&attribute.to_ascii_uppercase())
    }

    /// Constrained attribute names
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether a rendition satisfies every rule
    pub fn matches(&self, entry: &PlaylistEntry) -> bool {
        self.rules.iter().all(|(attribute, allowed)| {
            entry
                .attribute(attribute)
                .is_some_and(|value| allowed.contains(&value))
        })
    }

    /// Union of two rule sets, attribute by attribute.
    ///
    /// An attribute only one side constrains is unconstrained on the other,
    /// so it is dropped; shared attributes get the union of both value sets.
    /// A rendition matched by either side is matched by the result.
    pub fn merge(&self, other: &FilterRules) -> FilterRules {
        let rules = self
            .rules
            .iter()
            .filter_map(|(attribute, allowed)| {
                let theirs = other.rules.get(attribute)?;
                let mut set = allowed.clone();
                for matcher in &theirs.matchers {
                    set.insert(matcher.clone());
                }
                Some((attribute.clone(), set))
            })
            .collect();
        FilterRules { rules }
    }

    /// Merge an optional language override into the `LANGUAGE` rule
    ///
    /// The languages extend an existing `LANGUAGE` set, or become the set
    /// when the rules do not constrain the language yet.
    pub fn with_language_override(&self, languages: Option<&[String]>) -> FilterRules {
        match languages {
            Some(languages) if !languages.is_empty() => {
                let refs: Vec<&str> = languages.iter().map(String::as_str).collect();
                self.clone().with_exact(LANGUAGE_ATTRIBUTE, &refs)
            }
            _ => self.clone(),
        }
    }
}

/// Renditions matching `rules`, in playlist order
pub fn select<'a>(master: &'a MasterPlaylist, rules: &FilterRules) -> Vec<&'a PlaylistEntry> {
    master.entries.iter().filter(|entry| rules.matches(entry)).collect()
}
