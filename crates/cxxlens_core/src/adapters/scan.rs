//! Delimiter scanning shared by the line-oriented adapters.

use crate::error::ParseError;

/// One finding of the `path(line): message [id]` grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BracketedLine<'a> {
    pub file: &'a str,
    pub line: u32,
    pub message: &'a str,
    pub id: &'a str,
}

/// Parses a 1-based line number field.
pub(crate) fn parse_line_number(field: &str) -> Result<u32, ParseError> {
    let field = field.trim();
    field
        .parse::<u32>()
        .map_err(|_| ParseError::InvalidLineNumber(field.to_string()))
}

/// Scans `path(line): message [id]`.
///
/// The two characters following `(line` (the closing parenthesis and the
/// colon) are skipped; whatever trails the closing `]` is ignored.
pub(crate) fn scan_bracketed(line: &str) -> Result<BracketedLine<'_>, ParseError> {
    let (file, rest) = line
        .split_once('(')
        .ok_or(ParseError::MissingDelimiter('('))?;
    let (number, rest) = rest
        .split_once(')')
        .ok_or(ParseError::MissingDelimiter(')'))?;
    let line_number = parse_line_number(number)?;

    let rest = rest.strip_prefix(':').unwrap_or(rest);
    let (message, rest) = rest
        .split_once('[')
        .ok_or(ParseError::MissingDelimiter('['))?;
    let (id, _) = rest
        .split_once(']')
        .ok_or(ParseError::MissingDelimiter(']'))?;

    let file = file.trim();
    if file.is_empty() {
        return Err(ParseError::MissingField("file"));
    }
    let id = id.trim();
    if id.is_empty() {
        return Err(ParseError::MissingField("id"));
    }

    Ok(BracketedLine {
        file,
        line: line_number,
        message: message.trim(),
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_scan_cpplint_line() {
        let scanned =
            scan_bracketed("/src/a.cpp(42):  Line ends in whitespace.  [whitespace/end_of_line] [4]")
                .unwrap();
        assert_eq!(
            scanned,
            BracketedLine {
                file: "/src/a.cpp",
                line: 42,
                message: "Line ends in whitespace.",
                id: "whitespace/end_of_line",
            }
        );
    }

    #[test]
    fn test_scan_pclint_line() {
        let scanned = scan_bracketed(
            r"C:\work\src\main.cpp(7): error : (Warning -- Ignoring return value) : [534]",
        )
        .unwrap();
        assert_eq!(scanned.file, r"C:\work\src\main.cpp");
        assert_eq!(scanned.line, 7);
        assert_eq!(
            scanned.message,
            "error : (Warning -- Ignoring return value) :"
        );
        assert_eq!(scanned.id, "534");
    }

    #[rstest]
    #[case::no_paren("Done processing /src/a.cpp", ParseError::MissingDelimiter('('))]
    #[case::unclosed_paren("/src/a.cpp(42: msg [x]", ParseError::MissingDelimiter(')'))]
    #[case::bad_number("/src/a.cpp(abc): msg [x]", ParseError::InvalidLineNumber("abc".to_string()))]
    #[case::no_bracket("/src/a.cpp(1): msg", ParseError::MissingDelimiter('['))]
    #[case::unclosed_bracket("/src/a.cpp(1): msg [x", ParseError::MissingDelimiter(']'))]
    #[case::empty_id("/src/a.cpp(1): msg []", ParseError::MissingField("id"))]
    #[case::empty_file("(1): msg [x]", ParseError::MissingField("file"))]
    fn test_scan_rejects(#[case] line: &str, #[case] expected: ParseError) {
        assert_eq!(scan_bracketed(line).unwrap_err(), expected);
    }

    #[rstest]
    #[case("42", Ok(42))]
    #[case(" 7 ", Ok(7))]
    #[case("-1", Err(ParseError::InvalidLineNumber("-1".to_string())))]
    #[case("", Err(ParseError::InvalidLineNumber(String::new())))]
    fn test_parse_line_number(#[case] field: &str, #[case] expected: Result<u32, ParseError>) {
        assert_eq!(parse_line_number(field), expected);
    }
}
