//! Issue types produced by tool adapters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProfileError;

/// Severity assigned to an issue by the active rule profile.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Severity {
    /// Must be fixed before anything else.
    Blocker,
    /// High impact defect.
    Critical,
    /// Regular defect.
    #[default]
    Major,
    /// Low impact defect.
    Minor,
    /// Informational finding.
    Info,
}

impl Severity {
    /// Returns the upper-case name used in reports and profiles.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Blocker => "BLOCKER",
            Severity::Critical => "CRITICAL",
            Severity::Major => "MAJOR",
            Severity::Minor => "MINOR",
            Severity::Info => "INFO",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BLOCKER" => Ok(Severity::Blocker),
            "CRITICAL" => Ok(Severity::Critical),
            "MAJOR" => Ok(Severity::Major),
            "MINOR" => Ok(Severity::Minor),
            "INFO" => Ok(Severity::Info),
            _ => Err(ProfileError::invalid_severity(s)),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = ProfileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A single normalized static-analysis finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// 1-based line number, or 0 when the tool reported no location.
    pub line: u32,

    /// The finding's message.
    pub message: String,

    /// Namespaced rule identifier (`<tool>.<code>` or `<tool>:<code>`).
    pub rule_id: String,

    /// File the finding belongs to.
    ///
    /// Holds the path as reported by the tool until the analyzer rewrites it.
    pub component: String,

    /// Severity, unset until the rule is resolved in a profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    /// Technical debt coefficient taken from the profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt: Option<f64>,
}

impl Issue {
    /// Creates a new issue with no severity.
    pub fn new(
        rule_id: impl Into<String>,
        message: impl Into<String>,
        line: u32,
        component: impl Into<String>,
    ) -> Self {
        Self {
            line,
            message: message.into(),
            rule_id: rule_id.into(),
            component: component.into(),
            severity: None,
            debt: None,
        }
    }

    /// Sets the severity level.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Sets the debt coefficient.
    pub fn with_debt(mut self, debt: f64) -> Self {
        self.debt = Some(debt);
        self
    }

    /// Returns the repository key part of the rule id.
    ///
    /// The key is everything before the first `.` or `:` separator.
    pub fn repository_key(&self) -> &str {
        match self.rule_id.find(['.', ':']) {
            Some(idx) => &self.rule_id[..idx],
            None => &self.rule_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_issue_new() {
        let issue = Issue::new("cppcheck.nullPointer", "Null pointer", 12, "/src/a.cpp");

        assert_eq!(issue.rule_id, "cppcheck.nullPointer");
        assert_eq!(issue.message, "Null pointer");
        assert_eq!(issue.line, 12);
        assert_eq!(issue.component, "/src/a.cpp");
        assert!(issue.severity.is_none());
        assert!(issue.debt.is_none());
    }

    #[test]
    fn test_issue_builders() {
        let issue = Issue::new("rats.", "msg", 1, "a.c")
            .with_severity(Severity::Critical)
            .with_debt(0.5);

        assert_eq!(issue.severity, Some(Severity::Critical));
        assert_eq!(issue.debt, Some(0.5));
    }

    #[rstest]
    #[case("cppcheck.nullPointer", "cppcheck")]
    #[case("vera++:T001", "vera++")]
    #[case("other.cpplint.whitespace/comments", "other")]
    #[case("rats.", "rats")]
    #[case("bare", "bare")]
    fn test_repository_key(#[case] rule_id: &str, #[case] expected: &str) {
        let issue = Issue::new(rule_id, "", 0, "");
        assert_eq!(issue.repository_key(), expected);
    }

    #[rstest]
    #[case("BLOCKER", Severity::Blocker)]
    #[case("critical", Severity::Critical)]
    #[case(" Major ", Severity::Major)]
    #[case("minor", Severity::Minor)]
    #[case("Info", Severity::Info)]
    fn test_severity_from_str(#[case] input: &str, #[case] expected: Severity) {
        assert_eq!(input.parse::<Severity>().unwrap(), expected);
    }

    #[test]
    fn test_severity_from_str_invalid() {
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn test_issue_serialization_skips_unset_fields() {
        let issue = Issue::new("pclint:534", "Ignoring return value", 7, "a.cpp");
        let json = serde_json::to_value(&issue).unwrap();

        assert_eq!(json["ruleId"], "pclint:534");
        assert_eq!(json["line"], 7);
        assert!(json.get("severity").is_none());
        assert!(json.get("debt").is_none());
    }

    #[test]
    fn test_severity_deserializes_any_case() {
        let severity: Severity = serde_json::from_str("\"blocker\"").unwrap();
        assert_eq!(severity, Severity::Blocker);
    }

    #[test]
    fn test_severity_serializes_upper_case() {
        let json = serde_json::to_string(&Severity::Minor).unwrap();
        assert_eq!(json, "\"MINOR\"");
        assert_eq!(Severity::Minor.to_string(), "MINOR");
    }
}
