use cxxlens_issue::Issue;

use super::scan::parse_line_number;
use super::{ParseOutcome, ToolAdapter, ToolKind};
use crate::config::ToolSettings;
use crate::error::ParseError;

/// vera++ adapter. Expects `-showrules` output: `path:line[:col]:(rule)message`.
#[derive(Debug, Clone)]
pub struct VeraAdapter {
    settings: ToolSettings,
}

#[derive(Debug, PartialEq, Eq)]
struct VeraLine<'a> {
    file: &'a str,
    line: u32,
    rule: &'a str,
    message: &'a str,
}

impl VeraAdapter {
    pub fn new(settings: ToolSettings) -> Self {
        Self { settings }
    }
}

/// Length of a `C:\` or `C:/` prefix, if the line starts with one.
fn drive_prefix_len(line: &str) -> usize {
    let bytes = line.as_bytes();
    if bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
    {
        2
    } else {
        0
    }
}

fn scan(line: &str) -> Result<VeraLine<'_>, ParseError> {
    let drive = drive_prefix_len(line);
    let path_end = line[drive..]
        .find(':')
        .map(|idx| drive + idx)
        .ok_or(ParseError::MissingDelimiter(':'))?;

    let file = line[..path_end].trim();
    if file.is_empty() {
        return Err(ParseError::MissingField("file"));
    }

    let (number, rest) = line[path_end + 1..]
        .split_once(':')
        .ok_or(ParseError::MissingDelimiter(':'))?;
    let line_number = parse_line_number(number)?;

    let rest = match rest.split_once(':') {
        Some((column, tail))
            if !column.trim().is_empty() && column.trim().bytes().all(|b| b.is_ascii_digit()) =>
        {
            tail
        }
        _ => rest,
    };

    let (_, rest) = rest
        .split_once('(')
        .ok_or(ParseError::MissingDelimiter('('))?;
    let (rule, message) = rest
        .split_once(')')
        .ok_or(ParseError::MissingDelimiter(')'))?;

    let rule = rule.trim();
    if rule.is_empty() {
        return Err(ParseError::MissingField("rule"));
    }

    Ok(VeraLine {
        file,
        line: line_number,
        rule,
        message: message.trim(),
    })
}

impl ToolAdapter for VeraAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::Vera
    }

    fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    fn parse(&self, lines: &[String]) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        for line in lines {
            match scan(line) {
                Ok(found) => outcome.issues.push(Issue::new(
                    self.kind().rule_id(found.rule),
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
