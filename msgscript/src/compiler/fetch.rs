//! Optional and required child lookups.
//!
//! Every absence check in the compiler goes through one of these. Optional
//! lookups are silent; required lookups report the absence at the parent
//! node's position and abort the current step.

use super::{FailureKind, Outcome, Session};
use crate::syntax::{Rule, SyntaxNode};

impl Session<'_> {
    /// First child of `rule`, or `None` without logging anything.
    pub(crate) fn optional<'i>(&self, parent: &SyntaxNode<'i>, rule: Rule) -> Option<SyntaxNode<'i>> {
        parent.child(rule)
    }

    /// First child of `rule`; its absence is a fatal, logged condition.
    pub(crate) fn required<'i>(&mut self, parent: &SyntaxNode<'i>, rule: Rule, message: &str) -> Outcome<SyntaxNode<'i>> {
        match self.optional(parent, rule) {
            Some(node) => Ok(node),
            None => Err(self.fail(FailureKind::MissingRequiredElement, message, parent.position())),
        }
    }

    /// All children of `rule`; at least one must be present.
    pub(crate) fn required_all<'i>(
        &mut self,
        parent: &SyntaxNode<'i>,
        rule: Rule,
        message: &str,
    ) -> Outcome<Vec<SyntaxNode<'i>>> {
        let nodes = parent.children(rule);
        if nodes.is_empty() {
            return Err(self.fail(FailureKind::MissingRequiredElement, message, parent.position()));
        }
        Ok(nodes)
    }

    /// Element `index` of an already fetched child list.
    pub(crate) fn required_at<'i>(
        &mut self,
        parent: &SyntaxNode<'i>,
        nodes: &[SyntaxNode<'i>],
        index: usize,
        message: &str,
    ) -> Outcome<SyntaxNode<'i>> {
        match nodes.get(index) {
            Some(node) => Ok(node.clone()),
            None => Err(self.fail(FailureKind::MissingRequiredElement, message, parent.position())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Aborted;
    use super::*;
    use crate::diagnostics::{Diagnostics, EventLog, LogLevel, SourcePos};
    use crate::syntax::parse_rule;

    #[test]
    fn optional_absence_is_silent() {
        let mut diag = Diagnostics::new("test");
        let log = EventLog::new();
        diag.subscribe(log.clone());
        let session = Session::new(&mut diag);
        let tag = parse_rule(Rule::tag, "<n>").expect("parse ok");
        assert!(session.optional(&tag, Rule::int_literal).is_none());
        assert!(log.events().is_empty());
    }

    #[test]
    fn required_absence_logs_one_error_at_parent() {
        let mut diag = Diagnostics::new("test");
        let log = EventLog::new();
        diag.subscribe(log.clone());
        let mut session = Session::new(&mut diag);
        let tag = parse_rule(Rule::tag, "<>").expect("parse ok");
        let err = session.required(&tag, Rule::tag_id, "Expected tag id").expect_err("absent");
        assert_eq!(err, Aborted(FailureKind::MissingRequiredElement));
        let events = log.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, LogLevel::Error);
        assert_eq!(events[0].position, Some(SourcePos { line: 1, column: 1 }));
    }

    #[test]
    fn required_at_checks_bounds() {
        let mut diag = Diagnostics::new("test");
        let mut session = Session::new(&mut diag);
        let tag = parse_rule(Rule::tag, "<f 1>").expect("parse ok");
        let literals = session.required_all(&tag, Rule::int_literal, "Expected arguments").expect("one literal");
        assert_eq!(session.required_at(&tag, &literals, 0, "first").map(|n| n.text()), Ok("1"));
        assert!(session.required_at(&tag, &literals, 1, "second").is_err());
    }
}
