//! Opt-in file tracing with a level that can be changed at runtime
//!
//! Nothing is installed unless the host calls [`init_file_tracing`]. The log
//! file is only created once something is actually logged.

mod lazy_file_writer;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};

use error_stack::Report;
use strum::{AsRefStr, Display, EnumIter, EnumString, FromRepr};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

pub use lazy_file_writer::{LazyFileWriter, LazyWriter};

use crate::error::{Error, Result};

/// Environment variable selecting the initial level
pub const LOG_LEVEL_ENV: &str = "BEVY_INSPECTOR_LOG";

/// Targets whose events never reach the log
const SUPPRESSED_TARGETS: [&str; 5] = ["reqwest::", "hyper", "h2::", "rustls::", "want::"];

static CURRENT_LEVEL: AtomicU8 = AtomicU8::new(TracingLevel::Warn as u8);

/// Verbosity accepted by [`set_tracing_level`]
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    FromRepr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[repr(u8)]
pub enum TracingLevel {
    /// Failures only
    Error = 0,
    /// Failures and recoverable problems such as skipped properties
    #[default]
    Warn = 1,
    /// Imports and published snapshots
    Info = 2,
    /// Every remote call
    Debug = 3,
    /// Everything
    Trace = 4,
}

impl TracingLevel {
    /// The matching `tracing` level
    pub const fn as_level(self) -> Level {
        match self {
            Self::Error => Level::ERROR,
            Self::Warn => Level::WARN,
            Self::Info => Level::INFO,
            Self::Debug => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    fn of(level: Level) -> Self {
        match level {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warn,
            Level::INFO => Self::Info,
            Level::DEBUG => Self::Debug,
            Level::TRACE => Self::Trace,
        }
    }

    /// Level named by [`LOG_LEVEL_ENV`], if set and valid
    pub fn from_env() -> Option<Self> {
        std::env::var(LOG_LEVEL_ENV)
            .ok()
            .and_then(|value| value.trim().parse().ok())
    }
}

/// Layer filtering on the runtime level and dropping HTTP stack noise
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicFilter;

impl DynamicFilter {
    fn allows(target: &str, level: Level) -> bool {
        if SUPPRESSED_TARGETS
            .iter()
            .any(|prefix| target.starts_with(prefix))
        {
            return false;
        }
        TracingLevel::of(level) <= current_tracing_level()
    }
}

impl<S: Subscriber> Layer<S> for DynamicFilter {
    fn enabled(&self, metadata: &tracing::Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        Self::allows(metadata.target(), *metadata.level())
    }
}

/// Install the global subscriber writing to `path`
///
/// The initial level comes from [`LOG_LEVEL_ENV`] and defaults to `warn`.
/// Fails if a global subscriber is already set.
pub fn init_file_tracing(path: impl Into<PathBuf>) -> Result<()> {
    if let Some(level) = TracingLevel::from_env() {
        CURRENT_LEVEL.store(level as u8, Ordering::Relaxed);
    }

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(LazyFileWriter::new(path))
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    Registry::default()
        .with(DynamicFilter)
        .with(file_layer)
        .try_init()
        .map_err(|error| Report::new(Error::failed_to("install tracing subscriber", error)))
}

/// Level currently let through by [`DynamicFilter`]
pub fn current_tracing_level() -> TracingLevel {
    TracingLevel::from_repr(CURRENT_LEVEL.load(Ordering::Relaxed)).unwrap_or_default()
}

/// Change the level at runtime
pub fn set_tracing_level(level: TracingLevel) {
    CURRENT_LEVEL.store(level as u8, Ordering::Relaxed);
    match level {
        TracingLevel::Error => tracing::error!("Tracing level set to {level}"),
        TracingLevel::Warn => tracing::warn!("Tracing level set to {level}"),
        TracingLevel::Info => tracing::info!("Tracing level set to {level}"),
        TracingLevel::Debug => tracing::debug!("Tracing level set to {level}"),
        TracingLevel::Trace => tracing::trace!("Tracing level set to {level}"),
    }
}
