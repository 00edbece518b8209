use msgscript_data::{Line, Token};

use super::{FailureKind, Outcome, Session};
use crate::syntax::{Rule, SyntaxNode};

/// Control tags understood inside tagged text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    /// `<f table function args...>`
    Function,
    /// `<n>`: break inside the current line.
    NewLine,
    /// `<e>`: end of the current line.
    EndLine,
}

impl TagKind {
    fn from_id(id: &str) -> Option<Self> {
        match id.to_ascii_lowercase().as_str() {
            "f" => Some(TagKind::Function),
            "n" => Some(TagKind::NewLine),
            "e" => Some(TagKind::EndLine),
            _ => None,
        }
    }
}

/// The line being assembled, if one has been started.
#[derive(Debug, Default, PartialEq, Eq)]
enum Accumulator {
    #[default]
    Idle,
    Building(Vec<Token>),
}

/// Groups a stream of tokens into lines.
#[derive(Debug, Default)]
pub(crate) struct LineAssembler {
    lines: Vec<Line>,
    current: Accumulator,
}

impl LineAssembler {
    /// Append to the open line, opening one first if needed.
    pub(crate) fn push(&mut self, token: Token) {
        if let Accumulator::Building(tokens) = &mut self.current {
            tokens.push(token);
        } else {
            self.current = Accumulator::Building(vec![token]);
        }
    }

    /// Close the open line. With no open line an empty line is emitted and
    /// `false` is returned.
    pub(crate) fn end_line(&mut self) -> bool {
        match std::mem::take(&mut self.current) {
            Accumulator::Building(tokens) => {
                self.lines.push(Line::new(tokens));
                true
            },
            Accumulator::Idle => {
                self.lines.push(Line::default());
                false
            },
        }
    }

    /// Flush an unterminated trailing line and return everything assembled.
    pub(crate) fn finish(mut self) -> Vec<Line> {
        if let Accumulator::Building(tokens) = std::mem::take(&mut self.current) {
            self.lines.push(Line::new(tokens));
        }
        self.lines
    }
}

/// Remove `\r\n` and `\n` sequences; a lone `\r` is kept.
pub(crate) fn strip_newlines(text: &str) -> String {
    text.replace("\r\n", "").replace('\n', "")
}

impl Session<'_> {
    /// Compile the children of a `tag_text` node into lines.
    pub(crate) fn compile_lines(&mut self, text: &SyntaxNode<'_>) -> Outcome<Vec<Line>> {
        self.trace(text);
        let mut assembler = LineAssembler::default();

        for element in text.elements() {
            match element.rule() {
                Rule::text => {
                    let content = strip_newlines(element.text());
                    // formatting-only newlines carry no content
                    if !content.is_empty() {
                        assembler.push(Token::Text(content));
                    }
                },
                Rule::tag => {
                    let id = self.required(&element, Rule::tag_id, "Expected tag id")?.text();
                    match TagKind::from_id(id) {
                        Some(TagKind::Function) => {
                            let token = self.compile_function_tag(&element)?;
                            assembler.push(token);
                        },
                        Some(TagKind::NewLine) => assembler.push(Token::NewLine),
                        Some(TagKind::EndLine) => {
                            if !assembler.end_line() {
                                self.warn("Empty line", element.position());
                            }
                        },
                        None => {
                            return Err(self.fail(
                                FailureKind::UnknownTag,
                                format!("Unknown tag with id {id}"),
                                element.position(),
                            ));
                        },
                    }
                },
                _ => {
                    return Err(self.fail(
                        FailureKind::UnexpectedNode,
                        format!("Expected a tag or text, but got {}", element.rule_name()),
                        element.position(),
                    ));
                },
            }
        }

        Ok(assembler.finish())
    }
}
