//! Logging setup for the drive CLI
//
// Console-only: every event goes to stderr so stdout stays clean for tree,
// search and JSON output. Filtering follows RUST_LOG when set.

use std::fmt::Write as _;
use std::io::IsTerminal;

use tracing::Subscriber;
use tracing_subscriber::fmt::{
    format::{FormatEvent, FormatFields, Writer},
    FmtContext,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

/// Install the global subscriber. `verbose` lowers the default level to debug.
pub fn init(verbose: bool) {
    let env_filter = match std::env::var("RUST_LOG").ok() {
        Some(val) => tracing_subscriber::EnvFilter::new(val),
        None if verbose => tracing_subscriber::EnvFilter::new("debug"),
        None => tracing_subscriber::EnvFilter::new("info"),
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .event_format(ConsoleFormatter {
            color: std::io::stderr().is_terminal(),
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

/// Compact colored line: time, level, target, message.
pub struct ConsoleFormatter {
    color: bool,
}

impl ConsoleFormatter {
    fn paint(&self, writer: &mut Writer<'_>, style: &str, text: &str) -> std::fmt::Result {
        if self.color {
            write!(writer, "{}{}\x1b[0m", style, text)
        } else {
            write!(writer, "{}", text)
        }
    }
}

impl<S, N> FormatEvent<S, N> for ConsoleFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let (level_str, level_color) = match *meta.level() {
            tracing::Level::ERROR => ("ERROR", "\x1b[1;91m"),
            tracing::Level::WARN => ("WARN ", "\x1b[1;93m"),
            tracing::Level::INFO => ("INFO ", "\x1b[1;94m"),
            tracing::Level::DEBUG => ("DEBUG", "\x1b[1;92m"),
            tracing::Level::TRACE => ("TRACE", "\x1b[1;95m"),
        };

        let now = chrono::Local::now().format("%H:%M:%S").to_string();
        self.paint(&mut writer, "\x1b[2;36m", &now)?;
        writer.write_char(' ')?;
        self.paint(&mut writer, level_color, level_str)?;
        writer.write_char(' ')?;
        self.paint(&mut writer, "\x1b[2;33m", meta.target())?;
        writer.write_str(": ")?;

        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        writeln!(writer, "{}", visitor.0.trim())
    }
}

/// Joins every recorded field into one line; `message` comes first because
/// tracing records it first.
struct MessageVisitor(String);

impl tracing_subscriber::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if !self.0.is_empty() {
            self.0.push(' ');
        }
        if field.name() == "message" {
            let _ = write!(self.0, "{:?}", value);
        } else {
            let _ = write!(self.0, "{}={:?}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if !self.0.is_empty() {
            self.0.push(' ');
        }
        if field.name() == "message" {
            self.0.push_str(value);
        } else {
            let _ = write!(self.0, "{}={}", field.name(), value);
        }
    }
}
