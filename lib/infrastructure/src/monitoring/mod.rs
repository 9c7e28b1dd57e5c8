pub mod meter;

use anyhow::Context as _;
use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{ExporterBuildError, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

//Without an `otlp` section only the console fmt layer is installed. Metrics recorded through
//`meter` are then no-ops because no global meter provider is registered.

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default)]
    pub logs: EnvFilterConfig,
    #[serde(default)]
    pub traces: EnvFilterConfig,
    pub otlp: Option<OtlpConfig>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct EnvFilterConfig {
    pub default_level: String,
    #[serde(default)]
    pub filters: Vec<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct OtlpConfig {
    pub url: Option<String>,
    #[serde(default = "default_metrics_interval_secs")]
    pub metrics_interval_secs: u64,
}

fn default_service_name() -> String {
    "heat-selector".to_string()
}

fn default_metrics_interval_secs() -> u64 {
    60
}

impl Default for EnvFilterConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            filters: vec![],
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            logs: EnvFilterConfig::default(),
            traces: EnvFilterConfig::default(),
            otlp: None,
        }
    }
}

impl TryInto<EnvFilter> for EnvFilterConfig {
    type Error = tracing_subscriber::filter::ParseError;

    fn try_into(self) -> Result<EnvFilter, Self::Error> {
        EnvFilter::builder()
            .with_default_directive(self.default_level.parse()?)
            .parse(self.filters.join(","))
    }
}

impl MonitoringConfig {
    pub fn init(&self) -> anyhow::Result<()> {
        let logging_filter: EnvFilter = self
            .logs
            .clone()
            .try_into()
            .context("Invalid log filter configuration")?;

        let Some(otlp_config) = &self.otlp else {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer())
                .with(logging_filter)
                .init();
            return Ok(());
        };

        let resource = Resource::builder()
            .with_attribute(KeyValue::new("service.name", self.service_name.clone()))
            .build();

        opentelemetry::global::set_text_map_propagator(TraceContextPropagator::default());

        let fmt_layer = tracing_subscriber::fmt::layer().with_filter(logging_filter);

        let logger_provider = init_logs(resource.clone(), otlp_config.url.clone())?;
        let otel_log_filter: EnvFilter = self.logs.clone().try_into()?;
        let otel_log_layer = OpenTelemetryTracingBridge::new(&logger_provider).with_filter(otel_log_filter);

        let tracer_provider = init_traces(resource.clone(), otlp_config.url.clone())?;
        let tracer = tracer_provider.tracer(self.service_name.clone());
        let tracing_filter: EnvFilter = self
            .traces
            .clone()
            .try_into()
            .context("Invalid trace filter configuration")?;
        let tracing_layer = OpenTelemetryLayer::new(tracer).with_filter(tracing_filter);

        let meter_provider = init_metrics(resource, otlp_config)?;
        opentelemetry::global::set_meter_provider(meter_provider);

        tracing_subscriber::registry()
            .with(tracing_layer)
            .with(otel_log_layer)
            .with(fmt_layer)
            .init();

        Ok(())
    }
}

fn init_traces(resource: Resource, url: Option<String>) -> Result<SdkTracerProvider, ExporterBuildError> {
    match url {
        Some(url) => {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(url)
                .build()?;
            Ok(SdkTracerProvider::builder()
                .with_resource(resource)
                .with_batch_exporter(exporter)
                .build())
        }
        None => Ok(SdkTracerProvider::builder()
            .with_resource(resource)
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build()),
    }
}

fn init_metrics(resource: Resource, config: &OtlpConfig) -> Result<SdkMeterProvider, ExporterBuildError> {
    let interval = std::time::Duration::from_secs(config.metrics_interval_secs);

    let builder = SdkMeterProvider::builder();
    let builder = match &config.url {
        Some(url) => {
            let exporter = opentelemetry_otlp::MetricExporter::builder()
                .with_tonic()
                .with_endpoint(url.clone())
                .build()?;
            builder.with_reader(PeriodicReader::builder(exporter).with_interval(interval).build())
        }
        None => builder.with_reader(
            PeriodicReader::builder(opentelemetry_stdout::MetricExporter::default())
                .with_interval(interval)
                .build(),
        ),
    };

    Ok(builder.with_resource(resource).build())
}

fn init_logs(resource: Resource, url: Option<String>) -> Result<SdkLoggerProvider, ExporterBuildError> {
    match url {
        Some(url) => {
            let exporter = opentelemetry_otlp::LogExporter::builder()
                .with_tonic()
                .with_endpoint(url)
                .build()?;

            Ok(SdkLoggerProvider::builder()
                .with_resource(resource)
                .with_batch_exporter(exporter)
                .build())
        }
        None => Ok(SdkLoggerProvider::builder()
            .with_resource(resource)
            .with_simple_exporter(opentelemetry_stdout::LogExporter::default())
            .build()),
    }
}
