// SPDX-License-Identifier: MIT OR Apache-2.0
//! Console log: severity-tagged messages for the host's log area.
//!
//! Editor operations write [`LogEntry`] values directly. Anything logged with
//! `tracing` elsewhere can be mirrored in through [`TracingBridge`].

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::mpsc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Default number of entries kept
pub const DEFAULT_CAPACITY: usize = 500;

/// Severity shown next to a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Neutral information
    Info,
    /// An operation completed
    Success,
    /// Something was refused or degraded
    Warning,
    /// An operation failed
    Error,
}

impl Severity {
    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Self::Error,
            tracing::Level::WARN => Self::Warning,
            _ => Self::Info,
        }
    }
}

/// A log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// How serious
    pub severity: Severity,
    /// Which part of the editor produced it, e.g. `"history"`
    pub source: String,
    /// The message
    pub message: String,
    /// Wall-clock time as HH:MM:SS (UTC)
    pub timestamp: String,
    /// Consecutive identical messages collapsed into this entry
    pub count: u32,
}

/// Bounded log with duplicate collapsing
#[derive(Debug, Clone)]
pub struct ConsoleLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl ConsoleLog {
    /// Create an empty log with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty log keeping at most `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Add a log entry
    pub fn log(&mut self, severity: Severity, source: &str, message: impl Into<String>) {
        let message = message.into();
        let timestamp = clock_time(SystemTime::now());

        if let Some(last) = self.entries.back_mut() {
            if last.severity == severity && last.source == source && last.message == message {
                last.count += 1;
                last.timestamp = timestamp;
                return;
            }
        }

        self.entries.push_back(LogEntry {
            severity,
            source: source.to_string(),
            message,
            timestamp,
            count: 1,
        });

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Log at [`Severity::Info`]
    pub fn info(&mut self, source: &str, message: impl Into<String>) {
        self.log(Severity::Info, source, message);
    }

    /// Log at [`Severity::Success`]
    pub fn success(&mut self, source: &str, message: impl Into<String>) {
        self.log(Severity::Success, source, message);
    }

    /// Log at [`Severity::Warning`]
    pub fn warning(&mut self, source: &str, message: impl Into<String>) {
        self.log(Severity::Warning, source, message);
    }

    /// Log at [`Severity::Error`]
    pub fn error(&mut self, source: &str, message: impl Into<String>) {
        self.log(Severity::Error, source, message);
    }

    /// Entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Most recent entry
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count entries at a severity (collapsed repeats included)
    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|e| e.severity == severity)
            .map(|e| e.count as usize)
            .sum()
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drain pending bridged tracing events into the log
    pub fn poll_tracing_events(&mut self, rx: &mpsc::Receiver<TracingEvent>) {
        while let Ok(event) = rx.try_recv() {
            self.log(event.severity(), event.source(), event.render());
        }
    }
}

impl Default for ConsoleLog {
    fn default() -> Self {
        Self::new()
    }
}

/// A tracing event captured by the [`TracingBridge`] layer.
#[derive(Debug, Clone)]
pub struct TracingEvent {
    /// Original level; `DEBUG` and `TRACE` stay distinguishable here
    pub level: tracing::Level,
    /// Module path that emitted the event
    pub target: String,
    /// The `message` field
    pub message: String,
    /// Remaining fields as `name=value`
    pub fields: Vec<String>,
}

impl TracingEvent {
    /// Console severity for this event
    pub fn severity(&self) -> Severity {
        Severity::from(self.level)
    }

    /// Short source name: the last module segment (`fsm_editor_app::history` -> `history`)
    pub fn source(&self) -> &str {
        self.target.rsplit("::").next().unwrap_or(&self.target)
    }

    /// Message with fields appended, `debug:`-prefixed below `INFO`
    pub fn render(&self) -> String {
        let mut text = match (self.message.is_empty(), self.fields.is_empty()) {
            (true, true) => "(empty)".to_string(),
            (true, false) => self.fields.join(", "),
            (false, true) => self.message.clone(),
            (false, false) => format!("{} [{}]", self.message, self.fields.join(", ")),
        };
        if self.level > tracing::Level::INFO {
            text.insert_str(0, &format!("{}: ", self.level.as_str().to_ascii_lowercase()));
        }
        text
    }
}

/// A `tracing_subscriber::Layer` that forwards events over an `mpsc` channel
/// so a [`ConsoleLog`] can display them.
///
/// Events more verbose than `max_level` are not forwarded; per-frame
/// `TRACE` chatter never reaches the console by default.
pub struct TracingBridge {
    sender: mpsc::Sender<TracingEvent>,
    max_level: tracing::Level,
}

impl TracingBridge {
    /// Bridge forwarding `DEBUG` and above; returns `(layer, receiver)`.
    pub fn new() -> (Self, mpsc::Receiver<TracingEvent>) {
        Self::with_max_level(tracing::Level::DEBUG)
    }

    /// Bridge forwarding events at `max_level` or less verbose
    pub fn with_max_level(max_level: tracing::Level) -> (Self, mpsc::Receiver<TracingEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender, max_level }, receiver)
    }
}

impl<S> tracing_subscriber::Layer<S> for TracingBridge
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let meta = event.metadata();
        if *meta.level() > self.max_level {
            return;
        }

        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        // Receiver gone means nobody is displaying the console any more.
        let _ = self.sender.send(TracingEvent {
            level: *meta.level(),
            target: meta.target().to_string(),
            message: fields.message,
            fields: fields.rest,
        });
    }
}

/// Splits an event into its `message` and the other fields
#[derive(Default)]
struct FieldCollector {
    message: String,
    rest: Vec<String>,
}

impl FieldCollector {
    fn push(&mut self, field: &tracing::field::Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.rest.push(format!("{}={value}", field.name()));
        }
    }
}

impl tracing::field::Visit for FieldCollector {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.push(field, value.to_string());
    }
}

/// Install the global subscriber: env filter, fmt output, and a console bridge.
///
/// Returns the bridge receiver, or `None` if a subscriber was already set.
pub fn init_tracing() -> Option<mpsc::Receiver<TracingEvent>> {
    let (bridge_layer, tracing_rx) = TracingBridge::new();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,fsm_editor_app=debug,fsm_editor_graph=debug")
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(bridge_layer)
        .try_init()
        .ok()
        .map(|()| tracing_rx)
}

/// Wall-clock time of day (UTC) as `HH:MM:SS`
fn clock_time(time: SystemTime) -> String {
    let secs = time.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs()) % 86_400;
    format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}
