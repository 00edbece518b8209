//! Leveled diagnostic events emitted while compiling.
//!
//! Each compiler owns one [`Diagnostics`] channel. Listeners are plain values
//! handed to the channel; nothing is registered globally. The compiler never
//! reads its own events back.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Severity of a diagnostic event, least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Error | LogLevel::Fatal => log::Level::Error,
        }
    }
}

/// 1-based line and column in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourcePos {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single message on a diagnostics channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    pub channel: String,
    pub level: LogLevel,
    pub message: String,
    pub position: Option<SourcePos>,
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.channel, self.level, self.message)?;
        if let Some(pos) = self.position {
            write!(f, " ({pos})")?;
        }
        Ok(())
    }
}

/// Receives every event emitted on a channel it is subscribed to.
pub trait DiagnosticListener: Send {
    fn on_event(&mut self, event: &DiagnosticEvent);
}

impl<F> DiagnosticListener for F
where
    F: FnMut(&DiagnosticEvent) + Send,
{
    fn on_event(&mut self, event: &DiagnosticEvent) {
        self(event);
    }
}

/// Handle returned by [`Diagnostics::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A named event channel with an ordered list of listeners.
pub struct Diagnostics {
    channel: String,
    listeners: Vec<(ListenerId, Box<dyn DiagnosticListener>)>,
    next_id: u64,
}

impl Diagnostics {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn subscribe(&mut self, listener: impl DiagnosticListener + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Detach a listener, handing it back to the caller.
    pub fn unsubscribe(&mut self, id: ListenerId) -> Option<Box<dyn DiagnosticListener>> {
        let idx = self.listeners.iter().position(|(lid, _)| *lid == id)?;
        Some(self.listeners.remove(idx).1)
    }

    pub fn emit(&mut self, level: LogLevel, message: impl Into<String>, position: Option<SourcePos>) {
        if self.listeners.is_empty() {
            return;
        }
        let event = DiagnosticEvent {
            channel: self.channel.clone(),
            level,
            message: message.into(),
            position,
        };
        for (_, listener) in &mut self.listeners {
            listener.on_event(&event);
        }
    }

    pub fn debug(&mut self, message: impl Into<String>, position: Option<SourcePos>) {
        self.emit(LogLevel::Debug, message, position);
    }

    pub fn info(&mut self, message: impl Into<String>, position: Option<SourcePos>) {
        self.emit(LogLevel::Info, message, position);
    }

    pub fn warning(&mut self, message: impl Into<String>, position: Option<SourcePos>) {
        self.emit(LogLevel::Warning, message, position);
    }

    pub fn error(&mut self, message: impl Into<String>, position: Option<SourcePos>) {
        self.emit(LogLevel::Error, message, position);
    }

    pub fn fatal(&mut self, message: impl Into<String>, position: Option<SourcePos>) {
        self.emit(LogLevel::Fatal, message, position);
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("channel", &self.channel)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Forwards events to the `log` facade, using the channel name as target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogListener;

impl DiagnosticListener for LogListener {
    fn on_event(&mut self, event: &DiagnosticEvent) {
        let level: log::Level = event.level.into();
        match event.position {
            Some(pos) => log::log!(target: event.channel.as_str(), level, "{} ({pos})", event.message),
            None => log::log!(target: event.channel.as_str(), level, "{}", event.message),
        }
    }
}

/// Records events in memory. Clones share the same buffer, so one clone can
/// be subscribed while another is inspected.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<DiagnosticEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DiagnosticEvent>> {
        // a poisoned buffer still holds every event pushed before the panic
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.lock().clone()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.lock().iter().filter(|e| e.level == level).count()
    }

    /// Events at or above `level`.
    pub fn at_least(&self, level: LogLevel) -> Vec<DiagnosticEvent> {
        self.lock().iter().filter(|e| e.level >= level).cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl DiagnosticListener for EventLog {
    fn on_event(&mut self, event: &DiagnosticEvent) {
        self.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_reach_every_listener_in_order() {
        let mut diag = Diagnostics::new("test");
        let first = EventLog::new();
        let second = EventLog::new();
        diag.subscribe(first.clone());
        diag.subscribe(second.clone());
        diag.info("one", None);
        diag.warning("two", Some(SourcePos { line: 3, column: 4 }));

        for log in [&first, &second] {
            let events = log.events();
            assert_eq!(events.len(), 2);
            assert_eq!(events[0].message, "one");
            assert_eq!(events[1].level, LogLevel::Warning);
            assert_eq!(events[1].channel, "test");
        }
    }

    #[test]
    fn unsubscribed_listener_stops_receiving() {
        let mut diag = Diagnostics::new("test");
        let log = EventLog::new();
        let id = diag.subscribe(log.clone());
        diag.error("before", None);
        assert!(diag.unsubscribe(id).is_some());
        assert!(diag.unsubscribe(id).is_none());
        diag.error("after", None);
        assert_eq!(log.count(LogLevel::Error), 1);
        assert_eq!(diag.listener_count(), 0);
    }

    #[test]
    fn closures_are_listeners() {
        let seen = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&seen);
        let mut diag = Diagnostics::new("test");
        diag.subscribe(move |_: &DiagnosticEvent| {
            if let Ok(mut n) = counter.lock() {
                *n += 1;
            }
        });
        diag.debug("a", None);
        diag.fatal("b", None);
        assert_eq!(*seen.lock().expect("lock"), 2);
    }

    #[test]
    fn levels_order_by_severity() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warning < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Fatal);
        assert_eq!(log::Level::from(LogLevel::Fatal), log::Level::Error);
    }

    #[test]
    fn event_display_includes_position() {
        let event = DiagnosticEvent {
            channel: "MessageScriptCompiler".into(),
            level: LogLevel::Error,
            message: "Unknown tag with id x".into(),
            position: Some(SourcePos { line: 2, column: 7 }),
        };
        assert_eq!(
            event.to_string(),
            "MessageScriptCompiler error: Unknown tag with id x (2:7)"
        );
    }

    #[test]
    fn at_least_filters_by_severity() {
        let mut diag = Diagnostics::new("test");
        let log = EventLog::new();
        diag.subscribe(log.clone());
        diag.info("i", None);
        diag.warning("w", None);
        diag.error("e", None);
        let serious: Vec<_> = log.at_least(LogLevel::Warning).into_iter().map(|e| e.message).collect();
        assert_eq!(serious, ["w", "e"]);
        log.clear();
        assert!(log.events().is_empty());
    }
}
