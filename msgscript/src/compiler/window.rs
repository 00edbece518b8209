use msgscript_data::{DialogWindow, Line, SelectionWindow, Speaker, Window};

use super::{FailureKind, Outcome, Session};
use crate::syntax::{Rule, SyntaxNode};

/// The concrete form of a `message_window` node.
enum WindowNode<'i> {
    Dialog(SyntaxNode<'i>),
    Selection(SyntaxNode<'i>),
}

impl Session<'_> {
    fn classify_window<'i>(&self, node: &SyntaxNode<'i>) -> Option<WindowNode<'i>> {
        if let Some(dialog) = self.optional(node, Rule::dialog_window) {
            return Some(WindowNode::Dialog(dialog));
        }
        self.optional(node, Rule::selection_window).map(WindowNode::Selection)
    }

    pub(crate) fn compile_window(&mut self, node: &SyntaxNode<'_>) -> Outcome<Window> {
        match self.classify_window(node) {
            Some(WindowNode::Dialog(dialog)) => self.compile_dialog_window(&dialog).map(Window::Dialog),
            Some(WindowNode::Selection(selection)) => self.compile_selection_window(&selection).map(Window::Selection),
            None => Err(self.fail(
                FailureKind::UnexpectedNode,
                "Expected dialog or selection window",
                node.position(),
            )),
        }
    }

    fn compile_dialog_window(&mut self, node: &SyntaxNode<'_>) -> Outcome<DialogWindow> {
        self.trace(node);

        let identifier = self.required(node, Rule::identifier, "Expected dialog window name")?;

        let speaker = match self.optional(node, Rule::speaker_name) {
            Some(name) => self.compile_speaker(&name)?,
            None => None,
        };

        let body = self.required(node, Rule::tag_text, "Expected dialog window text")?;
        let lines = self.compile_lines(&body)?;

        Ok(DialogWindow {
            identifier: identifier.text().to_string(),
            speaker,
            lines,
        })
    }

    /// Only the first line of a speaker name is kept.
    fn compile_speaker(&mut self, node: &SyntaxNode<'_>) -> Outcome<Option<Speaker>> {
        self.trace(node);

        let text = self.required(node, Rule::tag_text, "Expected dialog window speaker name text")?;
        let lines: Vec<Line> = self.compile_lines(&text)?;
        if lines.len() > 1 {
            self.warn(
                format!(
                    "Speaker name has {} lines; only the first is used",
                    lines.len()
                ),
                text.position(),
            );
        }

        Ok(lines
            .into_iter()
            .next()
            .map(|name_line| Speaker::Named { name_line }))
    }

    fn compile_selection_window(&mut self, node: &SyntaxNode<'_>) -> Outcome<SelectionWindow> {
        self.trace(node);

        let identifier = self.required(node, Rule::identifier, "Expected selection window name")?;
        let body = self.required(node, Rule::tag_text, "Expected selection window text")?;
        let lines = self.compile_lines(&body)?;

        Ok(SelectionWindow {
            identifier: identifier.text().to_string(),
            lines,
        })
    }
}
