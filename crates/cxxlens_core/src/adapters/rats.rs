use cxxlens_issue::Issue;
use roxmltree::{Document, Node};

use super::cppcheck::extract_document;
use super::scan::parse_line_number;
use super::{ParseOutcome, ToolAdapter, ToolKind};
use crate::config::ToolSettings;
use crate::error::ParseError;

/// RATS adapter. Expects the `--xml` report.
#[derive(Debug, Clone)]
pub struct RatsAdapter {
    settings: ToolSettings,
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name).and_then(|n| n.text())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl RatsAdapter {
    pub fn new(settings: ToolSettings) -> Self {
        Self { settings }
    }

    fn convert(&self, vulnerability: Node<'_, '_>, outcome: &mut ParseOutcome) {
        let kind = child_text(vulnerability, "type").unwrap_or_default().trim();

        // Only records without a type are converted.
        if !kind.is_empty() {
            return;
        }

        let rule_id = self.kind().rule_id(kind);
        let message = collapse_whitespace(child_text(vulnerability, "message").unwrap_or_default());

        for file in vulnerability
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "file")
        {
            let Some(name) = child_text(file, "name").map(str::trim).filter(|n| !n.is_empty())
            else {
                outcome.skip(
                    self.kind(),
                    "<file> without name",
                    ParseError::MissingField("name"),
                );
                continue;
            };

            for line in file
                .children()
                .filter(|n| n.is_element() && n.tag_name().name() == "line")
            {
                match parse_line_number(line.text().unwrap_or_default()) {
                    Ok(number) => outcome.issues.push(Issue::new(
                        rule_id.clone(),
                        message.clone(),
                        number,
                        name,
                    )),
                    Err(reason) => outcome.skip(self.kind(), format!("{}: <line>", name), reason),
                }
            }
        }
    }
}

impl ToolAdapter for RatsAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::Rats
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
                    "rats report",
                    ParseError::MalformedDocument(e.to_string()),
                );
                return outcome;
            }
        };

        for vulnerability in doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "vulnerability")
        {
            self.convert(vulnerability, &mut outcome);
        }

        outcome
    }
}
