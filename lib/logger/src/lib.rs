use std::time::Duration;

use anyhow::Context;
use opentelemetry::{KeyValue, global, trace::TracerProvider};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{Sampler, Tracer};
use opentelemetry_semantic_conventions::resource::{
  SERVICE_NAMESPACE, SERVICE_VERSION,
};
use tracing::level_filters::LevelFilter;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{
  Layer, Registry,
  layer::{Layered, SubscriberExt},
  util::SubscriberInitExt,
};
use warden_client::entities::logger::{LogConfig, StdioLogMode};

type BaseRegistry = Layered<LevelFilter, Registry>;

/// Wire up tracing for Warden Core from its [LogConfig]: a stdio
/// layer in one of three modes, plus OTLP span export whenever a
/// collector endpoint is configured. With stdio off and no endpoint,
/// logging stays uninitialized.
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
  let registry = Registry::default()
    .with(LevelFilter::from(tracing::Level::from(config.level)));

  let stdio: Option<Box<dyn Layer<BaseRegistry> + Send + Sync>> =
    match (config.stdio, config.pretty) {
      (StdioLogMode::Standard, true) => Some(
        tracing_subscriber::fmt::layer()
          .pretty()
          .with_file(false)
          .with_line_number(false)
          .boxed(),
      ),
      (StdioLogMode::Standard, false) => Some(
        tracing_subscriber::fmt::layer()
          .with_file(false)
          .with_line_number(false)
          .boxed(),
      ),
      (StdioLogMode::Json, _) => {
        Some(tracing_subscriber::fmt::layer().json().boxed())
      }
      (StdioLogMode::None, _) => None,
    };

  let result = if config.otlp_endpoint.is_empty() {
    if stdio.is_none() {
      return Ok(());
    }
    registry.with(stdio).try_init()
  } else {
    let tracer = otlp_tracer(config)
      .context("failed to build otlp span exporter")?;
    registry
      .with(stdio)
      .with(OpenTelemetryLayer::new(tracer))
      .try_init()
  };
  result.context("failed to init logger")
}

/// Span exporter against the configured collector. Spans identify
/// this process by the configured service name, under the `warden`
/// namespace, stamped with the build version.
fn otlp_tracer(config: &LogConfig) -> anyhow::Result<Tracer> {
  let service_name = config.opentelemetry_service_name.clone();
  let resource = opentelemetry_sdk::Resource::builder()
    .with_service_name(service_name.clone())
    .with_attribute(KeyValue::new(SERVICE_NAMESPACE, "warden"))
    .with_attribute(KeyValue::new(
      SERVICE_VERSION,
      env!("CARGO_PKG_VERSION"),
    ))
    .build();
  let exporter = opentelemetry_otlp::SpanExporter::builder()
    .with_http()
    .with_endpoint(config.otlp_endpoint.as_str())
    .with_timeout(Duration::from_secs(3))
    .build()
    .context("invalid otlp exporter configuration")?;
  let provider =
    opentelemetry_sdk::trace::TracerProviderBuilder::default()
      .with_resource(resource)
      .with_sampler(Sampler::AlwaysOn)
      .with_batch_exporter(exporter)
      .build();
  global::set_tracer_provider(provider.clone());
  Ok(provider.tracer(service_name))
}
