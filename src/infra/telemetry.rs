use std::sync::Once;
use std::time::Duration;

use metrics::{Unit, counter, describe_counter, describe_histogram, histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::error::Outcome;
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Transport label attached to request metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Grpc,
}

impl Transport {
    pub fn as_str(self) -> &'static str {
        match self {
            Transport::Http => "http",
            Transport::Grpc => "grpc",
        }
    }
}

/// Install a global tracing subscriber using the provided logging settings.
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

/// Count one finished request and record its latency.
pub fn record_request(transport: Transport, op: &'static str, outcome: Outcome, elapsed: Duration) {
    counter!(
        "seo_svc_requests_total",
        "transport" => transport.as_str(),
        "op" => op,
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!(
        "seo_svc_request_duration_ms",
        "transport" => transport.as_str(),
        "op" => op
    )
    .record(elapsed.as_secs_f64() * 1_000.0);
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "seo_svc_requests_total",
            Unit::Count,
            "Requests handled, labelled by transport, operation and outcome."
        );
        describe_histogram!(
            "seo_svc_request_duration_ms",
            Unit::Milliseconds,
            "Request latency in milliseconds."
        );
        describe_counter!(
            "seo_svc_cache_hit_total",
            Unit::Count,
            "Reads answered from the cache."
        );
        describe_counter!(
            "seo_svc_cache_miss_total",
            Unit::Count,
            "Reads that fell through to the store."
        );
        describe_counter!(
            "seo_svc_cache_error_total",
            Unit::Count,
            "Cache calls that failed or timed out and were skipped."
        );
    });
}
