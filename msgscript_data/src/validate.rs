use std::collections::HashSet;
use std::fmt;

use crate::*;

/// Validation error for structurally suspicious content in a compiled [`Script`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NoWindows,
    DuplicateIdentifier { id: String },
    EmptyIdentifier { index: usize },
    EmbeddedNewline { window: String, line: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NoWindows => write!(f, "script contains no windows"),
            ValidationError::DuplicateIdentifier { id } => {
                write!(f, "duplicate window identifier '{id}'")
            },
            ValidationError::EmptyIdentifier { index } => {
                write!(f, "window #{index} has an empty identifier")
            },
            ValidationError::EmbeddedNewline { window, line } => {
                write!(f, "window '{window}' line {line} has text containing a newline")
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a compiled script for problems the compiler itself tolerates.
///
/// ```
/// use msgscript_data::{DialogWindow, FormatVersion, Line, Script, Token, Window, validate_script};
///
/// let script = Script::new(
///     FormatVersion::V1,
///     vec![Window::Dialog(DialogWindow {
///         identifier: "intro".into(),
///         speaker: None,
///         lines: vec![Line::new(vec![Token::text("Hello")])],
///     })],
/// );
/// assert!(validate_script(&script).is_empty());
/// ```
pub fn validate_script(script: &Script) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if script.windows.is_empty() {
        errors.push(ValidationError::NoWindows);
    }

    let mut seen = HashSet::new();
    for (index, window) in script.windows.iter().enumerate() {
        let id = window.identifier();
        if id.trim().is_empty() {
            errors.push(ValidationError::EmptyIdentifier { index });
        } else if !seen.insert(id.to_string()) {
            errors.push(ValidationError::DuplicateIdentifier { id: id.to_string() });
        }

        if let Window::Dialog(DialogWindow {
            speaker: Some(Speaker::Named { name_line }),
            ..
        }) = window
        {
            check_line(id, 0, name_line, &mut errors);
        }
        for (n, line) in window.lines().iter().enumerate() {
            check_line(id, n + 1, line, &mut errors);
        }
    }

    errors
}

fn check_line(window: &str, line_no: usize, line: &Line, errors: &mut Vec<ValidationError>) {
    let has_newline = line.tokens.iter().any(|t| matches!(t, Token::Text(s) if s.contains('\n')));
    if has_newline {
        errors.push(ValidationError::EmbeddedNewline {
            window: window.to_string(),
            line: line_no,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialog(id: &str, lines: Vec<Line>) -> Window {
        Window::Dialog(DialogWindow {
            identifier: id.to_string(),
            speaker: None,
            lines,
        })
    }

    fn text_line(s: &str) -> Line {
        Line::new(vec![Token::text(s)])
    }

    #[test]
    fn empty_script_is_reported() {
        let script = Script::new(FormatVersion::V1, Vec::new());
        assert_eq!(validate_script(&script), vec![ValidationError::NoWindows]);
    }

    #[test]
    fn duplicate_identifiers_are_reported_once_per_repeat() {
        let script = Script::new(
            FormatVersion::V1,
            vec![
                dialog("a", vec![text_line("x")]),
                dialog("a", vec![text_line("y")]),
                dialog("b", Vec::new()),
            ],
        );
        let errors = validate_script(&script);
        assert_eq!(errors, vec![ValidationError::DuplicateIdentifier { id: "a".into() }]);
    }

    #[test]
    fn empty_identifier_is_reported() {
        let script = Script::new(FormatVersion::V1, vec![dialog("  ", Vec::new())]);
        assert_eq!(validate_script(&script), vec![ValidationError::EmptyIdentifier { index: 0 }]);
    }

    #[test]
    fn newline_in_text_token_is_reported_with_line_number() {
        let script = Script::new(
            FormatVersion::V1,
            vec![dialog("a", vec![text_line("fine"), text_line("not\nfine")])],
        );
        let errors = validate_script(&script);
        assert_eq!(
            errors,
            vec![ValidationError::EmbeddedNewline {
                window: "a".into(),
                line: 2
            }]
        );
        assert_eq!(errors[0].to_string(), "window 'a' line 2 has text containing a newline");
    }

    #[test]
    fn speaker_line_is_checked_as_line_zero() {
        let script = Script::new(
            FormatVersion::V1,
            vec![Window::Dialog(DialogWindow {
                identifier: "a".into(),
                speaker: Some(Speaker::Named {
                    name_line: text_line("Ju\nnpei"),
                }),
                lines: Vec::new(),
            })],
        );
        assert!(matches!(
            validate_script(&script).as_slice(),
            [ValidationError::EmbeddedNewline { line: 0, .. }]
        ));
    }
}
