use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::{
    api::{METRIC_API_REQUEST_MS, METRIC_API_REQUESTS},
    error::InfraError,
    http::METRIC_SESSIONS_ACTIVE,
};

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install the global tracing subscriber and describe the console's metrics.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_API_REQUESTS,
            Unit::Count,
            "Blog API requests by outcome (success, rejected, transport)."
        );
        describe_histogram!(
            METRIC_API_REQUEST_MS,
            Unit::Milliseconds,
            "Blog API round-trip latency in milliseconds."
        );
        describe_gauge!(
            METRIC_SESSIONS_ACTIVE,
            Unit::Count,
            "Console sessions currently held in memory."
        );
    });
}
