//! Syntax tree to script model compiler.
//!
//! Compilation is all-or-nothing: every step returns an [`Outcome`], and the
//! first fatal condition aborts the whole script. The step that detects a
//! failure reports it on the diagnostics channel exactly once; callers only
//! propagate the [`Aborted`] marker with `?`.

use std::io::Read;

use msgscript_data::{FormatVersion, Script};
use thiserror::Error;

use crate::config::CompilerOptions;
use crate::diagnostics::{DiagnosticListener, Diagnostics, ListenerId, SourcePos};
use crate::syntax::{Rule, SyntaxNode, parse_compilation_unit};

mod fetch;
mod function;
mod lines;
mod window;

pub use function::{IntLiteralError, parse_int_literal};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Returned by the convenience entry points when no script was produced.
///
/// Details of what went wrong are only available on the diagnostics channel.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to compile message script")]
    Failed,
    #[error("failed to read message script source: {0}")]
    Io(#[from] std::io::Error),
}

/// Classification of the condition that aborted a compile step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The source could not be parsed (or decoded) at all.
    Syntax,
    MissingRequiredElement,
    UnknownTag,
    MalformedIntegerLiteral,
    /// A node of a shape the compiler has no rule for.
    UnexpectedNode,
}

/// A compile step failed; its diagnostic has already been emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Aborted(pub(crate) FailureKind);

pub(crate) type Outcome<T> = Result<T, Aborted>;

/// Compiles message script source into a [`Script`].
///
/// ```
/// use msgscript::{FormatVersion, MessageScriptCompiler, Token};
///
/// let mut compiler = MessageScriptCompiler::new(FormatVersion::V1);
/// let script = compiler.compile("[dlg hello]Hello<e>").expect("compiles");
/// assert_eq!(script.windows[0].lines()[0].tokens(), [Token::text("Hello")]);
/// ```
#[derive(Debug)]
pub struct MessageScriptCompiler {
    options: CompilerOptions,
    diagnostics: Diagnostics,
}

impl MessageScriptCompiler {
    pub fn new(format_version: FormatVersion) -> Self {
        Self::with_options(CompilerOptions {
            format_version,
            ..CompilerOptions::default()
        })
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        let diagnostics = Diagnostics::new(options.channel.clone());
        Self { options, diagnostics }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Attach a listener to this compiler's diagnostics channel.
    pub fn subscribe(&mut self, listener: impl DiagnosticListener + 'static) -> ListenerId {
        self.diagnostics.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> Option<Box<dyn DiagnosticListener>> {
        self.diagnostics.unsubscribe(id)
    }

    /// Compile script text.
    ///
    /// # Errors
    /// Returns [`CompileError::Failed`] if the script does not compile.
    pub fn compile(&mut self, source: &str) -> Result<Script, CompileError> {
        self.try_compile(source).ok_or(CompileError::Failed)
    }

    /// Compile script text read to the end from `reader`.
    ///
    /// # Errors
    /// Returns [`CompileError::Io`] if reading fails and
    /// [`CompileError::Failed`] if the script does not compile.
    pub fn compile_reader(&mut self, mut reader: impl Read) -> Result<Script, CompileError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.compile_bytes(&bytes)
    }

    /// Compile UTF-8 encoded script bytes.
    ///
    /// # Errors
    /// Returns [`CompileError::Failed`] if the bytes are not UTF-8 or the
    /// script does not compile.
    pub fn compile_bytes(&mut self, bytes: &[u8]) -> Result<Script, CompileError> {
        self.try_compile_bytes(bytes).ok_or(CompileError::Failed)
    }

    pub fn try_compile(&mut self, source: &str) -> Option<Script> {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        let format_version = self.options.format_version;
        let mut session = Session::new(&mut self.diagnostics);

        let (outcome, unit_pos) = match parse_compilation_unit(source) {
            Ok(root) => (session.compile_unit(&root, format_version), Some(root.position())),
            Err(e) => {
                session.diag.error(format!("Syntax error: {}", e.message), Some(e.position));
                (Err(Aborted(FailureKind::Syntax)), None)
            },
        };

        match outcome {
            Ok(script) => Some(script),
            Err(_) => {
                session.diag.fatal("Failed to compile message script", unit_pos);
                None
            },
        }
    }

    pub fn try_compile_reader(&mut self, mut reader: impl Read) -> Option<Script> {
        let mut bytes = Vec::new();
        if let Err(e) = reader.read_to_end(&mut bytes) {
            self.diagnostics.error(format!("Unable to read source: {e}"), None);
            self.diagnostics.fatal("Failed to compile message script", None);
            return None;
        }
        self.try_compile_bytes(&bytes)
    }

    pub fn try_compile_bytes(&mut self, bytes: &[u8]) -> Option<Script> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        match std::str::from_utf8(bytes) {
            Ok(source) => self.try_compile(source),
            Err(e) => {
                let position = end_position(&bytes[..e.valid_up_to()]);
                self.diagnostics.error(format!("Source is not valid UTF-8: {e}"), Some(position));
                self.diagnostics.fatal("Failed to compile message script", None);
                None
            },
        }
    }
}

impl Default for MessageScriptCompiler {
    fn default() -> Self {
        Self::with_options(CompilerOptions::default())
    }
}

/// Position just past a valid UTF-8 prefix.
fn end_position(valid: &[u8]) -> SourcePos {
    let text = String::from_utf8_lossy(valid);
    let line = text.matches('\n').count() + 1;
    let column = text.rsplit('\n').next().map_or(0, |tail| tail.chars().count()) + 1;
    SourcePos { line, column }
}

/// State shared by the compile steps of a single `try_compile` call.
pub(crate) struct Session<'c> {
    pub(crate) diag: &'c mut Diagnostics,
}

impl<'c> Session<'c> {
    pub(crate) fn new(diag: &'c mut Diagnostics) -> Self {
        Self { diag }
    }

    pub(crate) fn trace(&mut self, node: &SyntaxNode<'_>) {
        let pos = node.position();
        self.diag.info(format!("Compiling {} ({pos})", node.rule_name()), Some(pos));
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>, position: SourcePos) {
        self.diag.warning(message, Some(position));
    }

    /// Report a fatal condition and produce the marker to propagate.
    pub(crate) fn fail(&mut self, kind: FailureKind, message: impl Into<String>, position: SourcePos) -> Aborted {
        self.diag.error(message, Some(position));
        Aborted(kind)
    }

    pub(crate) fn compile_unit(&mut self, unit: &SyntaxNode<'_>, format_version: FormatVersion) -> Outcome<Script> {
        self.trace(unit);
        let window_nodes = self.required_all(unit, Rule::message_window, "Expected at least one message window")?;

        let mut windows = Vec::with_capacity(window_nodes.len());
        for node in &window_nodes {
            windows.push(self.compile_window(node)?);
        }
        Ok(Script::new(format_version, windows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{EventLog, LogLevel};
    use msgscript_data::{Speaker, Token, Window};

    fn compiler_with_log() -> (MessageScriptCompiler, EventLog) {
        let mut compiler = MessageScriptCompiler::new(FormatVersion::V1);
        let log = EventLog::new();
        compiler.subscribe(log.clone());
        (compiler, log)
    }

    #[test]
    fn windows_keep_source_order_and_kind() {
        let (mut compiler, _) = compiler_with_log();
        let src = "[dlg a]one<e>\n[sel b]yes<e>no<e>\n[dlg c [Elizabeth]]three<e>\n";
        let script = compiler.compile(src).expect("compiles");
        let ids: Vec<_> = script.windows.iter().map(Window::identifier).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert!(matches!(script.windows[1], Window::Selection(_)));
        match &script.windows[2] {
            Window::Dialog(w) => assert!(matches!(w.speaker, Some(Speaker::Named { .. }))),
            other => panic!("expected dialog window, got {other:?}"),
        }
    }

    #[test]
    fn format_version_comes_from_options() {
        let mut compiler = MessageScriptCompiler::new(FormatVersion::V1BigEndian);
        let script = compiler.compile("[sel a]x").expect("compiles");
        assert_eq!(script.format_version, FormatVersion::V1BigEndian);
    }

    #[test]
    fn empty_source_fails_with_missing_window_error() {
        let (mut compiler, log) = compiler_with_log();
        assert!(compiler.try_compile("\n\n").is_none());
        let errors = log.at_least(LogLevel::Error);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].level, LogLevel::Error);
        assert!(errors[0].message.contains("message window"));
        assert_eq!(errors[1].level, LogLevel::Fatal);
    }

    #[test]
    fn syntax_error_is_reported_with_position() {
        let (mut compiler, log) = compiler_with_log();
        assert!(matches!(compiler.compile("[dlg a]\nbad ] text"), Err(CompileError::Failed)));
        let errors: Vec<_> = log.events().into_iter().filter(|e| e.level == LogLevel::Error).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].position.map(|p| p.line), Some(2));
    }

    #[test]
    fn bytes_with_bom_compile_like_text() {
        let (mut compiler, _) = compiler_with_log();
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"[dlg a]Hi<e>");
        let script = compiler.compile_bytes(&bytes).expect("compiles");
        assert_eq!(script.windows[0].lines()[0].tokens(), [Token::text("Hi")]);
    }

    #[test]
    fn invalid_utf8_is_a_failure_with_position() {
        let (mut compiler, log) = compiler_with_log();
        let bytes = b"[dlg a]\nok \xFF";
        assert!(compiler.try_compile_bytes(bytes).is_none());
        let error = log.at_least(LogLevel::Error).into_iter().next().expect("error event");
        assert_eq!(error.position, Some(SourcePos { line: 2, column: 4 }));
    }

    #[test]
    fn reader_input_matches_text_input() {
        let src = "[dlg a [Igor]]Welcome<n>to the Velvet Room<e>";
        let (mut by_text, _) = compiler_with_log();
        let (mut by_reader, _) = compiler_with_log();
        let a = by_text.compile(src).expect("text compiles");
        let b = by_reader.compile_reader(src.as_bytes()).expect("reader compiles");
        assert_eq!(a, b);
    }

    #[test]
    fn unsubscribed_listener_sees_nothing_more() {
        let mut compiler = MessageScriptCompiler::default();
        let log = EventLog::new();
        let id = compiler.subscribe(log.clone());
        compiler.compile("[sel a]x").expect("compiles");
        let seen = log.events().len();
        assert!(seen > 0);
        assert!(compiler.unsubscribe(id).is_some());
        compiler.compile("[sel a]x").expect("compiles");
        assert_eq!(log.events().len(), seen);
    }

    #[test]
    fn trace_events_name_each_compiled_node() {
        let (mut compiler, log) = compiler_with_log();
        compiler.compile("[dlg a]x<f 1 2>").expect("compiles");
        let infos: Vec<_> = log
            .events()
            .into_iter()
            .filter(|e| e.level == LogLevel::Info)
            .map(|e| e.message)
            .collect();
        assert_eq!(
            infos,
            [
                "Compiling compilation_unit (1:1)",
                "Compiling dialog_window (1:1)",
                "Compiling tag_text (1:8)",
                "Compiling tag (1:9)",
            ]
        );
    }
}
