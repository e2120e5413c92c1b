use cxxlens_issue::Issue;

use super::scan::scan_bracketed;
use super::{ParseOutcome, ToolAdapter, ToolKind};
use crate::config::ToolSettings;

/// Adapter for any tool emitting `path(line): message [id]` lines,
/// such as cpplint with `--output=vs7`.
#[derive(Debug, Clone)]
pub struct CustomAdapter {
    settings: ToolSettings,
    custom_key: Option<String>,
}

impl CustomAdapter {
    /// Creates the adapter. A non-empty `custom_key` is inserted between the
    /// `other.` prefix and the tool's own rule id.
    pub fn new(settings: ToolSettings, custom_key: Option<String>) -> Self {
        Self {
            settings,
            custom_key: custom_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn custom_key(&self) -> Option<&str> {
        self.custom_key.as_deref()
    }

    fn rule_id(&self, id: &str) -> String {
        match &self.custom_key {
            Some(key) => self.kind().rule_id(&format!("{}.{}", key, id)),
            None => self.kind().rule_id(id),
        }
    }
}

impl ToolAdapter for CustomAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::Custom
    }

    fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    fn parse(&self, lines: &[String]) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        for line in lines {
            match scan_bracketed(line) {
                Ok(found) => outcome.issues.push(Issue::new(
                    self.rule_id(found.id),
                    found.message,
                    found.line,
                    found.file,
                )),
                Err(reason) => outcome.skip(self.kind(), line.as_str(), reason),
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn adapter(key: Option<&str>) -> CustomAdapter {
        CustomAdapter::new(
            ToolSettings::new("python").with_arguments("cpplint_mod.py --output=vs7"),
            key.map(str::to_string),
        )
    }

    #[test]
    fn test_parse_style_line() {
        let lines = vec!["/src/a.cpp(42): style  [whitespace/comments]".to_string()];
        let outcome = adapter(None).parse(&lines);

        assert!(outcome.skipped.is_empty());
        assert_eq!(
            outcome.issues,
            vec![Issue::new(
                "other.whitespace/comments",
                "style",
                42,
                "/src/a.cpp"
            )]
        );
    }

    #[test]
    fn test_custom_key_namespaces_rule() {
        let lines = vec![
            "/src/a.cpp(3):  Missing space before {  [whitespace/braces] [5]".to_string(),
        ];
        let outcome = adapter(Some("cpplint")).parse(&lines);

        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].rule_id, "other.cpplint.whitespace/braces");
        assert_eq!(outcome.issues[0].message, "Missing space before {");
    }

    #[test]
    fn test_blank_custom_key_is_ignored() {
        let adapter = adapter(Some("  "));
        assert_eq!(adapter.custom_key(), None);
    }

    #[test]
    fn test_malformed_lines_do_not_hide_good_ones() {
        let lines = vec![
            "Done processing /src/a.cpp".to_string(),
            "/src/a.cpp(7): Using C-style cast.  [readability/casting] [4]".to_string(),
            "Total errors found: 1".to_string(),
            "/src/a.cpp(x): bad  [build/include]".to_string(),
        ];
        let outcome = adapter(None).parse(&lines);

        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].line, 7);
        assert_eq!(outcome.skipped.len(), 3);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let lines = vec![
            "/src/a.cpp(1): a  [x/y]".to_string(),
            "/src/a.cpp(2): b  [x/z]".to_string(),
        ];
        let adapter = adapter(Some("cpplint"));
        assert_eq!(adapter.parse(&lines), adapter.parse(&lines));
    }

    #[test]
    fn test_command_line() {
        let spec = adapter(None).build_command(Path::new("/src/a.cpp"));
        assert_eq!(spec.program, Path::new("python"));
        assert_eq!(spec.args, vec!["cpplint_mod.py", "--output=vs7", "/src/a.cpp"]);
    }
}
