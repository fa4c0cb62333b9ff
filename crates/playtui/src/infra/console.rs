//! Console log sink capturing tracing events for the on-screen log pane.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;
use time::OffsetDateTime;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;

/// Records kept before the oldest are dropped.
const CAPACITY: usize = 2000;

static INSTALLED: OnceCell<ConsoleBuffer> = OnceCell::new();

/// One captured log record.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: OffsetDateTime,
    pub level: Level,
    pub target: String,
    pub message: String,
}

/// Clonable handle over the bounded record buffer backing the console pane.
///
/// Records may arrive from any thread; the buffer is the single owner of the
/// log surface.
#[derive(Debug, Clone, Default)]
pub struct ConsoleBuffer {
    inner: Arc<Mutex<VecDeque<LogRecord>>>,
}

impl ConsoleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, record: LogRecord) {
        if let Ok(mut records) = self.inner.lock() {
            if records.len() == CAPACITY {
                records.pop_front();
            }
            records.push_back(record);
        }
    }

    /// Snapshot of the current records, oldest first.
    pub fn records(&self) -> Vec<LogRecord> {
        self.inner
            .lock()
            .map(|records| records.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Installs the console sink as the global tracing subscriber and returns
/// the buffer handle.
///
/// Idempotent: only the first call registers a layer; every later call
/// returns the same buffer, so a record is never captured twice.
pub fn install() -> ConsoleBuffer {
    INSTALLED
        .get_or_init(|| {
            let buffer = ConsoleBuffer::new();
            let layer = ConsoleLayer { buffer: buffer.clone() };
            let subscriber = tracing_subscriber::registry().with(layer);
            if tracing::subscriber::set_global_default(subscriber).is_err() {
                tracing::warn!("global subscriber already set; console capture inactive");
            }
            buffer
        })
        .clone()
}

struct ConsoleLayer {
    buffer: ConsoleBuffer,
}

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() == Level::TRACE {
            return;
        }
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.buffer.push(LogRecord {
            timestamp: OffsetDateTime::now_utc(),
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.into_message(),
        });
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn into_message(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields
        } else {
            format!("{} {}", self.message, self.fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            if !self.fields.is_empty() {
                self.fields.push(' ');
            }
            let _ = write!(self.fields, "{}={:?}", field.name(), value);
        }
    }
}
