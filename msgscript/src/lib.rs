//! msgscript: compiler front-end for the message script dialogue language.
//!
//! Source text such as
//!
//! ```text
//! [dlg intro [Igor]]
//! Welcome to the Velvet Room.<e>
//! <f 0 1 3>This place exists between dream and reality.<e>
//! [sel reply]
//! Who are you?<e>
//! Where am I?<e>
//! ```
//!
//! is parsed with a Pest grammar and compiled into the [`Script`] model from
//! `msgscript_data`: windows, an optional speaker, and lines of text,
//! line-break, and function-call tokens. Progress and problems are reported
//! as leveled events on the compiler's [`Diagnostics`] channel.

pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod syntax;

pub use compiler::{CompileError, FailureKind, IntLiteralError, MessageScriptCompiler, parse_int_literal};
pub use config::{CompilerOptions, ConfigError};
pub use diagnostics::{
    DiagnosticEvent, DiagnosticListener, Diagnostics, EventLog, ListenerId, LogLevel, LogListener, SourcePos,
};
pub use msgscript_data::{
    DialogWindow, FormatVersion, Line, Script, SelectionWindow, Speaker, Token, ValidationError, Window, WindowKind,
    validate_script,
};
pub use syntax::{SyntaxError, SyntaxNode, parse_compilation_unit};
