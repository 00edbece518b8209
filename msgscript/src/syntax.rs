//! Concrete syntax tree for message scripts.
//!
//! Wraps the Pest-generated parser with a small node facade so the compiler
//! only ever asks for children by rule and never touches characters itself.

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser as PestParser;

use crate::diagnostics::SourcePos;

#[derive(PestParser)]
#[grammar = "src/grammar.pest"]
pub(crate) struct MessageScriptParser;

/// The source could not be turned into a syntax tree at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("syntax error at {position}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub position: SourcePos,
}

impl From<pest::error::Error<Rule>> for SyntaxError {
    fn from(e: pest::error::Error<Rule>) -> Self {
        let (line, column) = match e.line_col {
            pest::error::LineColLocation::Pos(pos) => pos,
            pest::error::LineColLocation::Span(start, _) => start,
        };
        Self {
            message: e.variant.message().into_owned(),
            position: SourcePos { line, column },
        }
    }
}

/// A rule node (or atomic token) of the syntax tree.
#[derive(Debug, Clone)]
pub struct SyntaxNode<'i> {
    pair: Pair<'i, Rule>,
}

impl<'i> SyntaxNode<'i> {
    pub(crate) fn new(pair: Pair<'i, Rule>) -> Self {
        Self { pair }
    }

    pub fn rule(&self) -> Rule {
        self.pair.as_rule()
    }

    /// Grammar rule name, used in trace output.
    pub fn rule_name(&self) -> String {
        format!("{:?}", self.pair.as_rule())
    }

    /// 1-based line/column of the first character of this node.
    pub fn position(&self) -> SourcePos {
        let (line, column) = self.pair.as_span().start_pos().line_col();
        SourcePos { line, column }
    }

    /// Literal source text covered by this node.
    pub fn text(&self) -> &'i str {
        self.pair.as_str()
    }

    /// First direct child produced by `rule`, if any.
    pub fn child(&self, rule: Rule) -> Option<SyntaxNode<'i>> {
        self.pair
            .clone()
            .into_inner()
            .find(|p| p.as_rule() == rule)
            .map(SyntaxNode::new)
    }

    /// All direct children produced by `rule`, in source order.
    pub fn children(&self, rule: Rule) -> Vec<SyntaxNode<'i>> {
        self.pair
            .clone()
            .into_inner()
            .filter(|p| p.as_rule() == rule)
            .map(SyntaxNode::new)
            .collect()
    }

    /// Every direct child, in source order.
    pub fn elements(&self) -> impl Iterator<Item = SyntaxNode<'i>> + use<'i> {
        self.pair.clone().into_inner().map(SyntaxNode::new)
    }
}

/// Parse a whole script into its `compilation_unit` root node.
///
/// # Errors
/// Returns a [`SyntaxError`] when the grammar rejects the source.
pub fn parse_compilation_unit(source: &str) -> Result<SyntaxNode<'_>, SyntaxError> {
    parse_rule(Rule::compilation_unit, source)
}

/// Parse `source` as a single instance of `rule`.
pub(crate) fn parse_rule(rule: Rule, source: &str) -> Result<SyntaxNode<'_>, SyntaxError> {
    let mut pairs = MessageScriptParser::parse(rule, source)?;
    pairs.next().map(SyntaxNode::new).ok_or_else(|| SyntaxError {
        message: format!("expected {rule:?}"),
        position: SourcePos { line: 1, column: 1 },
    })
}
