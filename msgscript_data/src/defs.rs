use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Window identifier as written after the `dlg`/`sel` keyword.
pub type Id = String;

/// Binary layout the compiled script is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatVersion {
    #[default]
    V1,
    V1BigEndian,
}

impl FormatVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatVersion::V1 => "v1",
            FormatVersion::V1BigEndian => "v1-big-endian",
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a format version name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormatVersion(pub String);

impl fmt::Display for UnknownFormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown format version '{}' (expected v1 | v1-big-endian)", self.0)
    }
}

impl std::error::Error for UnknownFormatVersion {}

impl FromStr for FormatVersion {
    type Err = UnknownFormatVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(FormatVersion::V1),
            "v1-big-endian" | "v1be" => Ok(FormatVersion::V1BigEndian),
            other => Err(UnknownFormatVersion(other.to_string())),
        }
    }
}

/// A fully compiled message script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub format_version: FormatVersion,
    #[serde(default)]
    pub windows: Vec<Window>,
}

impl Script {
    pub fn new(format_version: FormatVersion, windows: Vec<Window>) -> Self {
        Self {
            format_version,
            windows,
        }
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    /// Look up a window by its identifier.
    pub fn window(&self, identifier: &str) -> Option<&Window> {
        self.windows.iter().find(|w| w.identifier() == identifier)
    }
}

/// Discriminant of a [`Window`], handy for filtering and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    Dialog,
    Selection,
}

/// One displayable unit of a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Window {
    Dialog(DialogWindow),
    Selection(SelectionWindow),
}

impl Window {
    pub fn identifier(&self) -> &str {
        match self {
            Window::Dialog(w) => &w.identifier,
            Window::Selection(w) => &w.identifier,
        }
    }

    pub fn lines(&self) -> &[Line] {
        match self {
            Window::Dialog(w) => &w.lines,
            Window::Selection(w) => &w.lines,
        }
    }

    pub fn kind(&self) -> WindowKind {
        match self {
            Window::Dialog(_) => WindowKind::Dialog,
            Window::Selection(_) => WindowKind::Selection,
        }
    }
}

/// A dialog box, optionally attributed to a speaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogWindow {
    pub identifier: Id,
    pub speaker: Option<Speaker>,
    #[serde(default)]
    pub lines: Vec<Line>,
}

/// A selection prompt; each line is one choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionWindow {
    pub identifier: Id,
    #[serde(default)]
    pub lines: Vec<Line>,
}

/// Who is talking in a dialog window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Speaker {
    Named { name_line: Line },
    /// Resolved by the game at runtime.
    VariablyNamed,
}

/// An ordered run of tokens terminated by `<e>` or the end of its text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Line {
    pub tokens: Vec<Token>,
}

impl Line {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Concatenated text content, ignoring function calls and breaks.
    pub fn plain_text(&self) -> String {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                Token::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Smallest unit of a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Token {
    Text(String),
    NewLine,
    Function {
        table_index: i16,
        function_index: i16,
        #[serde(default)]
        arguments: Vec<i16>,
    },
}

impl Token {
    pub fn text(content: impl Into<String>) -> Self {
        Token::Text(content.into())
    }

    pub fn function(table_index: i16, function_index: i16, arguments: Vec<i16>) -> Self {
        Token::Function {
            table_index,
            function_index,
            arguments,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Text(s) => f.write_str(s),
            Token::NewLine => f.write_str("<n>"),
            Token::Function {
                table_index,
                function_index,
                arguments,
            } => {
                write!(f, "<f {table_index} {function_index}")?;
                for arg in arguments {
                    write!(f, " {arg}")?;
                }
                f.write_str(">")
            },
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::Dialog(w) => match &w.speaker {
                Some(Speaker::Named { name_line }) => write!(f, "[dlg {} [{}]]", w.identifier, name_line),
                Some(Speaker::VariablyNamed) => write!(f, "[dlg {} [?]]", w.identifier),
                None => write!(f, "[dlg {}]", w.identifier),
            },
            Window::Selection(w) => write!(f, "[sel {}]", w.identifier),
        }
    }
}
