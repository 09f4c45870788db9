//! Tracing initialization: console logging plus optional OpenTelemetry export.
//!
//! Log verbosity follows `RUST_LOG`, defaulting to `info`. Spans are exported over OTLP/HTTP only
//! when the `enable_otel_export` flag is set. The exporter then reads the standard OpenTelemetry
//! environment variables:
//!
//! | Variable | Default |
//! |---|---|
//! | `OTEL_SERVICE_NAME` | `printquote` |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | `http://localhost:4318` |
//! | `OTEL_EXPORTER_OTLP_PROTOCOL` | `http/protobuf` (`http/json` also accepted) |
//! | `OTEL_EXPORTER_OTLP_HEADERS` | none; `key=value` pairs separated by commas, `%20` decodes to a space |
//!
//! ```bash
//! export PRINTQUOTE_ENABLE_OTEL_EXPORT=true
//! export OTEL_EXPORTER_OTLP_ENDPOINT="https://otlp-gateway.example.com/otlp"
//! export OTEL_EXPORTER_OTLP_HEADERS="Authorization=Basic%20<token>"
//! ```

use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{Protocol, WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Kept for shutdown: `tracing-opentelemetry` holds only the tracer, so pending spans are flushed
/// through the provider.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

const DEFAULT_SERVICE_NAME: &str = "printquote";
const DEFAULT_ENDPOINT: &str = "http://localhost:4318";

/// OTLP exporter settings.
struct OtlpSettings {
    service_name: String,
    endpoint: String,
    protocol: Protocol,
    headers: HashMap<String, String>,
}

impl OtlpSettings {
    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            service_name: lookup("OTEL_SERVICE_NAME").unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            protocol: otlp_protocol(lookup("OTEL_EXPORTER_OTLP_PROTOCOL").as_deref()),
            headers: lookup("OTEL_EXPORTER_OTLP_HEADERS")
                .map(|raw| parse_otlp_headers(&raw))
                .unwrap_or_default(),
        }
    }

    fn tracer_provider(&self) -> anyhow::Result<SdkTracerProvider> {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_endpoint(&self.endpoint)
            .with_protocol(self.protocol)
            .with_headers(self.headers.clone())
            .build()?;

        let resource = opentelemetry_sdk::Resource::builder()
            .with_attribute(KeyValue::new("service.name", self.service_name.clone()))
            .build();

        Ok(SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(resource)
            .build())
    }
}

/// Install the global subscriber.
///
/// A failing OTLP setup does not stop the service: the error is logged and the console layer is
/// installed on its own.
pub fn init_telemetry(enable_otel_export: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let settings = enable_otel_export.then(OtlpSettings::from_env);
    let provider = settings.as_ref().map(OtlpSettings::tracer_provider).transpose();

    let (otel_layer, otel_error) = match provider {
        Ok(Some(provider)) => {
            let tracer = provider.tracer(DEFAULT_SERVICE_NAME);
            let _ = TRACER_PROVIDER.set(provider);
            (Some(tracing_opentelemetry::layer().with_tracer(tracer)), None)
        }
        Ok(None) => (None, None),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .try_init()?;

    match (&settings, otel_error) {
        (Some(settings), None) => info!(
            service_name = %settings.service_name,
            endpoint = %settings.endpoint,
            headers = settings.headers.len(),
            "Telemetry initialized with OTLP export"
        ),
        (Some(_), Some(e)) => warn!("Telemetry initialized without OTLP export: {e:#}"),
        (None, _) => info!("Telemetry initialized (OTLP export disabled)"),
    }

    Ok(())
}

/// Parse `OTEL_EXPORTER_OTLP_HEADERS` style `key=value,key=value` pairs.
fn parse_otlp_headers(raw: &str) -> HashMap<String, String> {
    raw.replace("%20", " ")
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

fn otlp_protocol(raw: Option<&str>) -> Protocol {
    match raw {
        Some("http/json") => Protocol::HttpJson,
        _ => Protocol::HttpBinary,
    }
}

/// Flush pending spans and stop the exporter. A no-op when export was never enabled.
pub fn shutdown_telemetry() {
    if let Some(provider) = TRACER_PROVIDER.get()
        && let Err(e) = provider.shutdown()
    {
        tracing::error!("Failed to shutdown tracer provider: {}", e);
    }
}
