use std::fmt;
use std::sync::OnceLock;

use common::configuration::{LogFormat, LoggingConfig};
use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace::SdkTracerProvider};
use time::macros::format_description;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{format, time::FormatTime, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

const SERVICE_NAME: &str = "concierge";
const DEFAULT_OTEL_COLLECTOR_URL: &str = "http://localhost:4317";

struct BracketedTime;

impl FormatTime for BracketedTime {
    fn format_time(&self, w: &mut format::Writer<'_>) -> fmt::Result {
        let now = time::OffsetDateTime::now_utc();
        let stamp = now
            .format(&format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
            ))
            .map_err(|_| fmt::Error)?;
        write!(w, "[{stamp}]")
    }
}

/// `[2025-01-01 12:00:00.000][info] message key=value`
struct BracketedFormatter;

impl<S, N> FormatEvent<S, N> for BracketedFormatter
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        BracketedTime.format_time(&mut writer)?;

        write!(
            writer,
            "[{}] ",
            event.metadata().level().to_string().to_lowercase()
        )?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}: ", span.name())?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn otel_tracing_enabled() -> bool {
    std::env::var("OTEL_TRACING_ENABLED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(false)
}

fn otlp_provider() -> Result<SdkTracerProvider, opentelemetry_otlp::ExporterBuildError> {
    let otel_endpoint = std::env::var("OTEL_COLLECTOR_URL")
        .unwrap_or_else(|_| DEFAULT_OTEL_COLLECTOR_URL.to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&otel_endpoint)
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build())
}

static INIT_LOGGER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Install the global subscriber once. `RUST_LOG` wins over the configured
/// level. Spans are exported over OTLP when `OTEL_TRACING_ENABLED=true`.
pub fn init_tracer(config: &LoggingConfig) -> &'static SdkTracerProvider {
    INIT_LOGGER.get_or_init(|| {
        global::set_text_map_propagator(TraceContextPropagator::new());

        let exporting = if otel_tracing_enabled() {
            match otlp_provider() {
                Ok(provider) => Some(provider),
                Err(e) => {
                    eprintln!("failed to create OTLP span exporter, spans will not be exported: {e}");
                    None
                }
            }
        } else {
            None
        };

        let telemetry_layer = exporting
            .as_ref()
            .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer(SERVICE_NAME)));

        let provider = exporting.unwrap_or_else(|| SdkTracerProvider::builder().build());
        global::set_tracer_provider(provider.clone());

        let (console_layer, json_layer) = match config.format {
            LogFormat::Console => (
                Some(tracing_subscriber::fmt::layer().event_format(BracketedFormatter)),
                None,
            ),
            LogFormat::Json => (
                None,
                Some(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_span_list(false),
                ),
            ),
        };

        let subscriber = tracing_subscriber::registry()
            .with(telemetry_layer)
            .with(env_filter(&config.level))
            .with(console_layer)
            .with(json_layer);

        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("tracing subscriber already installed: {e}");
        }

        provider
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Console,
        };
        let first = init_tracer(&config) as *const SdkTracerProvider;
        let second = init_tracer(&LoggingConfig::default()) as *const SdkTracerProvider;
        assert_eq!(first, second);
    }
}
