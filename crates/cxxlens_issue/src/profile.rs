//! Rule profiles.
//!
//! A profile maps rule ids to the severity and debt coefficient that should be
//! attached to matching issues. Issues whose rule is absent from the profile, or
//! disabled in it, are not reported at all.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Issue, ProfileError, Severity};

/// A single rule entry in a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Namespaced rule id, e.g. `cppcheck.nullPointer`.
    pub key: String,

    /// Severity attached to matching issues.
    #[serde(default)]
    pub severity: Severity,

    /// Debt coefficient attached to matching issues.
    #[serde(default, rename = "debt", skip_serializing_if = "Option::is_none")]
    pub debt_coefficient: Option<f64>,

    /// Whether the rule is active.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Rule {
    /// Creates an enabled rule.
    pub fn new(key: impl Into<String>, severity: Severity) -> Self {
        Self {
            key: key.into(),
            severity,
            debt_coefficient: None,
            enabled: true,
        }
    }

    /// Sets the debt coefficient.
    pub fn with_debt(mut self, debt: f64) -> Self {
        self.debt_coefficient = Some(debt);
        self
    }

    /// Marks the rule as disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[derive(Deserialize)]
struct ProfileDocument {
    #[serde(default)]
    language: String,
    #[serde(default)]
    rules: Vec<Rule>,
}

/// The active rule table for one language.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleProfile {
    language: String,
    rules: HashMap<String, Rule>,
}

impl RuleProfile {
    /// Creates an empty profile.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            rules: HashMap::new(),
        }
    }

    /// Adds a rule, replacing any rule with the same key.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.insert(rule);
        self
    }

    /// Inserts a rule, replacing any rule with the same key.
    pub fn insert(&mut self, rule: Rule) {
        self.rules.insert(rule.key.clone(), rule);
    }

    /// Loads a profile from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parses a profile document.
    ///
    /// ```json
    /// { "language": "c++", "rules": [ { "key": "cppcheck.nullPointer", "severity": "CRITICAL" } ] }
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let document: ProfileDocument = serde_json::from_str(json)?;

        let mut profile = Self::new(document.language);
        for rule in document.rules {
            if rule.key.trim().is_empty() {
                return Err(ProfileError::invalid_profile("rule with empty key"));
            }
            if profile.rules.contains_key(&rule.key) {
                return Err(ProfileError::invalid_profile(format!(
                    "duplicate rule key: {}",
                    rule.key
                )));
            }
            profile.insert(rule);
        }

        debug!(
            "Loaded profile for '{}' with {} rules",
            profile.language,
            profile.rules.len()
        );
        Ok(profile)
    }

    /// Returns the profile language.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Returns the number of rules, enabled or not.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the profile has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Looks up a rule by id, returning it only if it is enabled.
    pub fn resolve(&self, rule_id: &str) -> Option<&Rule> {
        self.rules.get(rule_id).filter(|rule| rule.enabled)
    }

    /// Applies the profile to an issue.
    ///
    /// Returns the issue with severity and debt filled in, or `None` if its rule
    /// is not enabled in this profile.
    pub fn annotate(&self, mut issue: Issue) -> Option<Issue> {
        let rule = self.resolve(&issue.rule_id)?;
        issue.severity = Some(rule.severity);
        issue.debt = rule.debt_coefficient;
        Some(issue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_profile() -> RuleProfile {
        RuleProfile::new("c++")
            .with_rule(Rule::new("cppcheck.nullPointer", Severity::Critical).with_debt(0.5))
            .with_rule(Rule::new("vera++:T001", Severity::Minor))
            .with_rule(Rule::new("rats.", Severity::Major).disabled())
    }

    #[test]
    fn test_resolve_enabled_rule() {
        let profile = sample_profile();
        let rule = profile.resolve("cppcheck.nullPointer").unwrap();
        assert_eq!(rule.severity, Severity::Critical);
    }

    #[test]
    fn test_resolve_disabled_rule_is_none() {
        let profile = sample_profile();
        assert!(profile.resolve("rats.").is_none());
    }

    #[test]
    fn test_resolve_missing_rule_is_none() {
        let profile = sample_profile();
        assert!(profile.resolve("cppcheck.unknown").is_none());
    }

    #[test]
    fn test_annotate_sets_severity_and_debt() {
        let profile = sample_profile();
        let issue = Issue::new("cppcheck.nullPointer", "Null pointer", 3, "a.cpp");

        let annotated = profile.annotate(issue).unwrap();
        assert_eq!(annotated.severity, Some(Severity::Critical));
        assert_eq!(annotated.debt, Some(0.5));
    }

    #[test]
    fn test_annotate_drops_unknown_rule() {
        let profile = sample_profile();
        let issue = Issue::new("pclint:534", "Ignoring return value", 3, "a.cpp");
        assert!(profile.annotate(issue).is_none());
    }

    #[test]
    fn test_rule_ids_are_matched_exactly() {
        let profile = sample_profile();
        // vera++ rules are keyed with ':' and must not match the '.' form.
        assert!(profile.resolve("vera++.T001").is_none());
        assert!(profile.resolve("vera++:T001").is_some());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "language": "c++",
            "rules": [
                { "key": "cppcheck.nullPointer", "severity": "CRITICAL", "debt": 0.25 },
                { "key": "pclint:534", "severity": "minor", "enabled": false },
                { "key": "other.cpplint.whitespace/comments" }
            ]
        }"#;

        let profile = RuleProfile::from_json(json).unwrap();
        assert_eq!(profile.language(), "c++");
        assert_eq!(profile.len(), 3);

        let rule = profile.resolve("cppcheck.nullPointer").unwrap();
        assert_eq!(rule.debt_coefficient, Some(0.25));
        assert!(profile.resolve("pclint:534").is_none());

        let default_rule = profile.resolve("other.cpplint.whitespace/comments").unwrap();
        assert_eq!(default_rule.severity, Severity::Major);
    }

    #[test]
    fn test_from_json_rejects_duplicates() {
        let json = r#"{ "rules": [ { "key": "rats." }, { "key": "rats." } ] }"#;
        let err = RuleProfile::from_json(json).unwrap_err();
        assert!(err.to_string().contains("duplicate rule key"));
    }

    #[test]
    fn test_from_json_rejects_bad_severity() {
        let json = r#"{ "rules": [ { "key": "rats.", "severity": "FATAL" } ] }"#;
        assert!(RuleProfile::from_json(json).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(&path, r#"{ "language": "c++", "rules": [ { "key": "rats." } ] }"#)
            .unwrap();

        let profile = RuleProfile::from_file(&path).unwrap();
        assert!(profile.resolve("rats.").is_some());
    }
}
