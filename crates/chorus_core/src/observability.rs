//! Tracing subscriber and OpenTelemetry metrics initialization.

use chorus_error::ConfigError;
#[cfg(feature = "metrics")]
use opentelemetry::{KeyValue, global};
#[cfg(feature = "metrics")]
use opentelemetry_otlp::{MetricExporter as OtlpExporter, WithExportConfig};
#[cfg(feature = "metrics")]
use opentelemetry_sdk::{
    Resource,
    metrics::{PeriodicReader, SdkMeterProvider},
};
#[cfg(feature = "metrics")]
use opentelemetry_stdout::MetricExporter as StdoutExporter;
#[cfg(feature = "metrics")]
use std::time::Duration;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber and, with the `metrics` feature,
/// a global OpenTelemetry meter provider.
///
/// The log filter comes from `RUST_LOG` (default `info`). The metrics
/// exporter is selected by `OTEL_EXPORTER`:
/// - "otlp" -> OTLP over HTTP to `OTEL_EXPORTER_OTLP_ENDPOINT` (default: http://localhost:4318)
/// - "stdout" or unset -> stdout exporter
pub fn init_observability(
    service_name: &'static str,
    export_interval_secs: u64,
) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to install tracing subscriber: {}", e)))?;

    #[cfg(not(feature = "metrics"))]
    {
        let _ = export_interval_secs;
        info!(service_name, "Metrics feature disabled - tracing only");
        Ok(())
    }

    #[cfg(feature = "metrics")]
    {
        install_meter_provider(service_name, export_interval_secs)
    }
}

#[cfg(feature = "metrics")]
#[instrument]
fn install_meter_provider(
    service_name: &'static str,
    export_interval_secs: u64,
) -> Result<(), ConfigError> {
    let resource = Resource::builder_empty()
        .with_attributes([KeyValue::new("service.name", service_name)])
        .build();
    let interval = Duration::from_secs(export_interval_secs);

    let exporter_type = std::env::var("OTEL_EXPORTER").unwrap_or_else(|_| "stdout".to_string());
    info!(exporter_type = %exporter_type, "Selecting metrics exporter");

    let builder = SdkMeterProvider::builder().with_resource(resource);
    let meter_provider = match exporter_type.as_str() {
        "otlp" => {
            let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4318".to_string());
            let exporter = OtlpExporter::builder()
                .with_http()
                .with_endpoint(&endpoint)
                .with_timeout(Duration::from_secs(10))
                .build()
                .map_err(|e| ConfigError::new(format!("Failed to create OTLP exporter: {}", e)))?;
            debug!(endpoint = %endpoint, "OTLP metric exporter created");
            builder
                .with_reader(PeriodicReader::builder(exporter).with_interval(interval).build())
                .build()
        }
        _ => builder
            .with_reader(
                PeriodicReader::builder(StdoutExporter::default())
                    .with_interval(interval)
                    .build(),
            )
            .build(),
    };

    global::set_meter_provider(meter_provider);
    info!(service_name, "Meter provider registered globally");
    Ok(())
}

/// Flush point for observability at process exit.
#[instrument]
pub fn shutdown_observability() {
    // The meter provider flushes on drop.
    debug!("Observability shutdown complete");
}
