use std::borrow::Cow;

use sentry::integrations::tracing::EventFilter;
use sentry::{ClientInitGuard, ClientOptions};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::prelude::*;

const LOG_ENV: &str = "BIAS_SGD_LOG";
const SENTRY_LOG_ENV: &str = "BIAS_SGD_SENTRY_LOG";

/// Initialises tracing.
///
/// In the debug mode the console shows the per-edge `trace` events, unless
/// overridden with `BIAS_SGD_LOG`.
pub fn init(
    sentry_dsn: Option<String>,
    traces_sample_rate: f32,
    debug: bool,
) -> Result<ClientInitGuard> {
    let guard = sentry::init((
        sentry_dsn,
        ClientOptions {
            release: Some(Cow::Borrowed(env!("CARGO_PKG_VERSION"))),
            traces_sample_rate,
            ..Default::default()
        },
    ));

    // Per-edge events would flood the breadcrumbs.
    let sentry_layer = sentry::integrations::tracing::layer()
        .event_filter(|metadata| match *metadata.level() {
            Level::ERROR | Level::WARN => EventFilter::Event,
            Level::INFO | Level::DEBUG => EventFilter::Breadcrumb,
            Level::TRACE => EventFilter::Ignore,
        })
        .span_filter(|metadata| metadata.level() <= &Level::INFO)
        .with_filter(env_filter(SENTRY_LOG_ENV, Level::DEBUG)?);

    let console_level = if debug { Level::TRACE } else { Level::INFO };
    let format_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(env_filter(LOG_ENV, console_level)?);

    tracing_subscriber::Registry::default()
        .with(sentry_layer)
        .with(format_layer)
        .init();

    Ok(guard)
}

/// Reads the filter from the environment variable, or enables the crate's
/// events up to the default level.
fn env_filter(env: &str, default_level: Level) -> Result<EnvFilter> {
    EnvFilter::try_from_env(env)
        .or_else(|_| EnvFilter::try_new(default_directive(default_level)))
        .with_context(|| format!("invalid `{}`", env))
}

fn default_directive(level: Level) -> String {
    format!("{}={}", env!("CARGO_CRATE_NAME"), level.to_string().to_lowercase())
}

pub fn format_duration(duration: StdDuration) -> String {
    humantime::format_duration(duration).to_string()
}

pub fn format_elapsed(instant: Instant) -> String {
    format_duration(instant.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directive_ok() {
        assert_eq!(default_directive(Level::INFO), "bias_sgd=info");
        assert_eq!(default_directive(Level::TRACE), "bias_sgd=trace");
    }

    #[test]
    fn format_duration_ok() {
        assert_eq!(format_duration(StdDuration::from_millis(61_500)), "1m 1s 500ms");
    }
}
