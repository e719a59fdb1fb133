use std::sync::OnceLock;

use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::SpanExporter;
use opentelemetry_sdk::{trace::SdkTracerProvider, Resource};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::Layer;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

const DEFAULT_FILTER: &str = "info,pagefeed=debug,tower_http=info";
const OTLP_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

fn get_resource() -> Resource {
    static RESOURCE: OnceLock<Resource> = OnceLock::new();
    RESOURCE
        .get_or_init(|| Resource::builder().with_service_name("pagefeed").build())
        .clone()
}

fn init_traces() -> anyhow::Result<SdkTracerProvider> {
    let exporter = SpanExporter::builder().with_http().build()?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(get_resource())
        .build())
}

fn console_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the console subscriber, plus OTLP trace export when an endpoint is configured
pub fn init_tracing_subscriber() -> OtelGuard {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(console_filter());

    let tracer_provider = if std::env::var_os(OTLP_ENDPOINT_VAR).is_some() {
        match init_traces() {
            Ok(provider) => Some(provider),
            Err(err) => {
                eprintln!("Failed to create trace exporter: {err:?}");
                None
            }
        }
    } else {
        None
    };

    // reqwest and hyper spans from the exporter itself would feed back into OTel
    let otel_layer = tracer_provider.as_ref().map(|provider| {
        OpenTelemetryLayer::new(provider.tracer("pagefeed"))
            .with_filter(EnvFilter::new("info,hyper=off,reqwest=off,opentelemetry=off"))
    });

    tracing_subscriber::registry()
        .with(console_layer)
        .with(otel_layer)
        .init();

    OtelGuard { tracer_provider }
}

pub struct OtelGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(err) = provider.shutdown() {
                eprintln!("{err:?}");
            }
        }
    }
}
