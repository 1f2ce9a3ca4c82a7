use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::level::label;

/// `YYYY-MM-DDTHH:MM:SSZ [LEVEL] message key=value ...`
#[derive(Clone, Copy, Debug)]
pub struct LineFormat {
    clock: fn() -> DateTime<Utc>,
}

impl Default for LineFormat {
    fn default() -> Self {
        Self { clock: Utc::now }
    }
}

impl LineFormat {
    /// A formatter that stamps records with `clock` instead of the wall clock.
    pub fn with_clock(clock: fn() -> DateTime<Utc>) -> Self {
        Self { clock }
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let now = (self.clock)();
        write!(
            writer,
            "{} [{}] ",
            now.format("%Y-%m-%dT%H:%M:%SZ"),
            label(event.metadata().level())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
