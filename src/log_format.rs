//! Planner log line format.
//!
//! `HH:MM:SS.mmm LEVEL target airport{ENGM}:span: message key=value`
//!
//! The wall-clock time comes first so cycle logs from several airports can be
//! lined up, and span fields are kept so each line names its airport.

use std::fmt;

use chrono::Utc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::{FmtContext, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

/// Event formatter: timestamp, level, target, then span context with fields
pub struct PlannerLogFormat {
    ansi: bool,
}

impl PlannerLogFormat {
    pub fn new(ansi: bool) -> Self {
        Self { ansi }
    }

    fn level_color(level: &Level) -> &'static str {
        match *level {
            Level::ERROR => "\x1b[31m",
            Level::WARN => "\x1b[33m",
            Level::INFO => "\x1b[32m",
            Level::DEBUG => "\x1b[34m",
            Level::TRACE => "\x1b[35m",
        }
    }
}

impl<S, N> FormatEvent<S, N> for PlannerLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();

        write!(writer, "{} ", Utc::now().format("%H:%M:%S%.3f"))?;

        let level = metadata.level();
        if self.ansi {
            write!(writer, "{}{:>5}\x1b[0m ", Self::level_color(level), level)?;
        } else {
            write!(writer, "{:>5} ", level)?;
        }

        write!(writer, "{}: ", metadata.target())?;

        if let Some(scope) = ctx.event_scope() {
            let mut wrote_span = false;
            for span in scope.from_root() {
                if wrote_span {
                    write!(writer, ":")?;
                }
                write!(writer, "{}", span.name())?;

                let extensions = span.extensions();
                if let Some(fields) = extensions.get::<FormattedFields<N>>()
                    && !fields.is_empty()
                {
                    write!(writer, "{{{}}}", fields)?;
                }
                wrote_span = true;
            }
            if wrote_span {
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}
