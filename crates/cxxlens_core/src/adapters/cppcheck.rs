use cxxlens_issue::Issue;
use roxmltree::{Document, Node};

use super::scan::parse_line_number;
use super::{ParseOutcome, ToolAdapter, ToolKind};
use crate::config::ToolSettings;
use crate::error::ParseError;

/// Checks reported per translation unit that are only meaningful across the
/// whole program.
const DROPPED_IDS: &[&str] = &["unusedFunction"];

/// cppcheck adapter. Expects the `--xml` report.
#[derive(Debug, Clone)]
pub struct CppCheckAdapter {
    settings: ToolSettings,
}

impl CppCheckAdapter {
    pub fn new(settings: ToolSettings) -> Self {
        Self { settings }
    }

    fn convert(&self, error: Node<'_, '_>, outcome: &mut ParseOutcome) {
        let Some(id) = error.attribute("id").filter(|id| !id.is_empty()) else {
            outcome.skip(
                self.kind(),
                "<error> without id",
                ParseError::MissingField("id"),
            );
            return;
        };

        if DROPPED_IDS.contains(&id) {
            return;
        }

        // Version 1 reports carry the location on the record itself,
        // version 2 reports in nested <location> elements.
        let location = error
            .children()
            .find(|n| n.is_element() && n.tag_name().name() == "location");
        let file = error
            .attribute("file")
            .or_else(|| location.and_then(|l| l.attribute("file")))
            .unwrap_or_default();
        let line = match error
            .attribute("line")
            .or_else(|| location.and_then(|l| l.attribute("line")))
        {
            Some(value) => match parse_line_number(value) {
                Ok(line) => line,
                Err(reason) => {
                    outcome.skip(self.kind(), format!("<error id=\"{}\">", id), reason);
                    return;
                }
            },
            None => 0,
        };
        let message = error.attribute("msg").unwrap_or_default();

        outcome
            .issues
            .push(Issue::new(self.kind().rule_id(id), message, line, file));
    }
}

/// Cuts the XML report out of the captured lines, dropping progress chatter
/// printed around it.
pub(super) fn extract_document(lines: &[String]) -> Option<String> {
    let text = lines.join("\n");
    let start = text.find('<')?;
    let end = text.rfind('>')?;
    (end > start).then(|| text[start..=end].to_string())
}

impl ToolAdapter for CppCheckAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::CppCheck
    }

    fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    fn parse(&self, lines: &[String]) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        if lines.is_empty() {
            return outcome;
        }

        let Some(text) = extract_document(lines) else {
            outcome.skip(
                self.kind(),
                format!("{} line(s) of output", lines.len()),
                ParseError::MalformedDocument("no XML report found".to_string()),
            );
            return outcome;
        };

        let doc = match Document::parse(&text) {
            Ok(doc) => doc,
            Err(e) => {
                outcome.skip(
                    self.kind(),
                    "cppcheck report",
                    ParseError::MalformedDocument(e.to_string()),
                );
                return outcome;
            }
        };

        for error in doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "error")
        {
            self.convert(error, &mut outcome);
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(text: &str) -> Vec<String> {
        text.lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn adapter() -> CppCheckAdapter {
        CppCheckAdapter::new(
            ToolSettings::new("cppcheck").with_arguments("--inline-suppr --enable=all --xml"),
        )
    }

    #[test]
    fn test_parse_version_two_report() {
        let output = lines(
            r#"Checking /src/a.cpp ...
<?xml version="1.0" encoding="UTF-8"?>
<results version="2">
    <cppcheck version="2.13.0"/>
    <errors>
        <error id="nullPointer" severity="error" msg="Null pointer dereference: p" verbose="Null pointer dereference: p" cwe="476">
            <location file="/src/a.cpp" line="12" column="5"/>
            <location file="/src/a.cpp" line="10" column="9" info="Assignment"/>
        </error>
        <error id="unusedFunction" severity="style" msg="The function 'f' is never used.">
            <location file="/src/a.cpp" line="30" column="0"/>
        </error>
        <error id="missingIncludeSystem" severity="information" msg="Cppcheck cannot find all the include files"/>
    </errors>
</results>"#,
        );

        let outcome = adapter().parse(&output);

        assert!(outcome.skipped.is_empty());
        assert_eq!(
            outcome.issues,
            vec![
                Issue::new(
                    "cppcheck.nullPointer",
                    "Null pointer dereference: p",
                    12,
                    "/src/a.cpp"
                ),
                Issue::new(
                    "cppcheck.missingIncludeSystem",
                    "Cppcheck cannot find all the include files",
                    0,
                    ""
                ),
            ]
        );
    }

    #[test]
    fn test_parse_version_one_report() {
        let output = lines(
            r#"<?xml version="1.0"?>
<results>
<error file="/src/a.cpp" line="7" id="uninitvar" severity="error" msg="Uninitialized variable: x"/>
<error file="/src/a.cpp" line="9" id="unusedFunction" severity="style" msg="unused"/>
</results>"#,
        );

        let outcome = adapter().parse(&output);

        assert_eq!(
            outcome.issues,
            vec![Issue::new(
                "cppcheck.uninitvar",
                "Uninitialized variable: x",
                7,
                "/src/a.cpp"
            )]
        );
    }

    #[test]
    fn test_trailing_chatter_is_ignored() {
        let output = lines(
            r#"<results><errors><error id="a" msg="m"><location file="f.c" line="1"/></error></errors></results>
1/1 files checked 100% done"#,
        );
        assert_eq!(adapter().parse(&output).issues.len(), 1);
    }

    #[test]
    fn test_bad_records_are_skipped_individually() {
        let output = lines(
            r#"<results><errors>
<error severity="style" msg="no id"/>
<error id="a" msg="bad line"><location file="f.c" line="x"/></error>
<error id="b" msg="fine"><location file="f.c" line="3"/></error>
</errors></results>"#,
        );

        let outcome = adapter().parse(&output);

        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].rule_id, "cppcheck.b");
        assert_eq!(outcome.skipped.len(), 2);
        assert_eq!(outcome.skipped[0].reason, ParseError::MissingField("id"));
        assert_eq!(
            outcome.skipped[1].reason,
            ParseError::InvalidLineNumber("x".to_string())
        );
    }

    #[test]
    fn test_malformed_document() {
        let outcome = adapter().parse(&lines("<results><errors><error id=\"a\"></results>"));
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
        assert!(matches!(
            outcome.skipped[0].reason,
            ParseError::MalformedDocument(_)
        ));
    }

    #[test]
    fn test_output_without_report() {
        let outcome = adapter().parse(&lines("Checking /src/a.cpp ..."));
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
    }
}
