//! Logging configuration.

use serde::Deserialize;
use tracing::{Level, Metadata};
use tracing_subscriber::{
    filter::FilterFn, fmt, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
    Layer, Registry,
};

use crate::{error::ErrorKind, Error};

/// Verbosity of emitted events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LoggingLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    Info,
    /// Warn level.
    Warn,
    /// Error level.
    Error,
}

impl From<LoggingLevel> for Level {
    fn from(value: LoggingLevel) -> Self {
        match value {
            LoggingLevel::Trace => Level::TRACE,
            LoggingLevel::Debug => Level::DEBUG,
            LoggingLevel::Info => Level::INFO,
            LoggingLevel::Warn => Level::WARN,
            LoggingLevel::Error => Level::ERROR,
        }
    }
}

/// Span lifecycle events to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SpanEvent {
    /// A span was created.
    New,
    /// A span was closed.
    Close,
    /// A span was entered or exited.
    Active,
}

impl From<SpanEvent> for FmtSpan {
    fn from(value: SpanEvent) -> Self {
        match value {
            SpanEvent::New => FmtSpan::NEW,
            SpanEvent::Close => FmtSpan::CLOSE,
            SpanEvent::Active => FmtSpan::ACTIVE,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Default, Deserialize)]
pub struct LoggingConfig {
    /// Default level, `Info` if not set.
    pub level: Option<LoggingLevel>,
    /// Per crate levels overriding the default.
    pub crate_filters: Option<Vec<CrateLogFilter>>,
    /// Span events to log.
    pub span_events: Option<Vec<SpanEvent>>,
}

/// Level override for a single crate.
#[derive(Debug, Deserialize)]
pub struct CrateLogFilter {
    /// Level of the crate.
    pub level: LoggingLevel,
    /// Name of the crate, matched against the first segment of event targets.
    pub name: String,
}

/// Installs a global `fmt` subscriber.
///
/// # Errors
///
/// Returns a [`Config`](crate::ErrorKind::Config) error if a global
/// subscriber is already set.
pub fn init_logging(config: Option<LoggingConfig>) -> Result<(), Error> {
    let mut config = config.unwrap_or_default();

    let span_events = config
        .span_events
        .take()
        .unwrap_or_default()
        .into_iter()
        .fold(FmtSpan::NONE, |events, event| events | FmtSpan::from(event));

    Registry::default()
        .with(
            fmt::layer()
                .with_span_events(span_events)
                .with_filter(FilterFn::new(filter(config))),
        )
        .try_init()
        .map_err(|err| Error::new(ErrorKind::Config, err))
}

pub(crate) fn filter(config: LoggingConfig) -> impl Fn(&Metadata<'_>) -> bool {
    let default_level: Level = config.level.unwrap_or(LoggingLevel::Info).into();
    let crate_filters = config
        .crate_filters
        .unwrap_or_default()
        .into_iter()
        .map(|filter| (filter.name, Level::from(filter.level)))
        .collect::<Vec<_>>();

    move |meta| {
        let level = meta
            .target()
            .split("::")
            .next()
            .and_then(|crate_name| {
                crate_filters
                    .iter()
                    .find(|(filter_name, _)| crate_name.eq_ignore_ascii_case(filter_name))
                    .map(|(_, filter_level)| filter_level)
            })
            .unwrap_or(&default_level);

        meta.level() <= level
    }
}
