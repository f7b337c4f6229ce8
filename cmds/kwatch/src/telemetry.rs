//! Logging and trace export.
//!
//! Logs go to stderr so that stdout only carries command output. Traces are
//! additionally exported over OTLP when one of the standard endpoint variables
//! is set.

use std::io::IsTerminal;

use anyhow::{Context, Result};
use clap::ValueEnum;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::{trace::SdkTracerProvider, Resource};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const SERVICE_NAME: &str = "kwatch";

/// Not exported by opentelemetry_sdk.
const OTEL_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";

/// Verbosity selected with `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
	Error,
	Warn,
	Info,
	Debug,
	Trace,
}

impl From<LogLevel> for Level {
	fn from(level: LogLevel) -> Self {
		match level {
			LogLevel::Error => Level::ERROR,
			LogLevel::Warn => Level::WARN,
			LogLevel::Info => Level::INFO,
			LogLevel::Debug => Level::DEBUG,
			LogLevel::Trace => Level::TRACE,
		}
	}
}

/// Log line format selected with `--log-format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
	/// Pretty when stderr is a terminal, JSON otherwise.
	#[default]
	Auto,
	Pretty,
	Json,
}

impl LogFormat {
	fn is_pretty(self) -> bool {
		match self {
			LogFormat::Auto => std::io::stderr().is_terminal(),
			LogFormat::Pretty => true,
			LogFormat::Json => false,
		}
	}
}

/// Keeps the tracer provider alive; flushes pending spans on drop.
pub struct TelemetryGuard {
	tracer_provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
	fn drop(&mut self) {
		if let Some(provider) = self.tracer_provider.take() {
			if let Err(e) = provider.shutdown() {
				eprintln!("Failed to shutdown tracer provider: {e}");
			}
		}
	}
}

/// Build the level filter.
///
/// An explicit level wins over `RUST_LOG`, which wins over `info`.
fn filter(level: Option<LogLevel>) -> EnvFilter {
	match level {
		Some(level) => EnvFilter::new(Level::from(level).as_str()),
		None => EnvFilter::builder()
			.with_default_directive(Level::INFO.into())
			.from_env_lossy(),
	}
}

fn otlp_configured() -> bool {
	[
		opentelemetry_otlp::OTEL_EXPORTER_OTLP_ENDPOINT,
		opentelemetry_otlp::OTEL_EXPORTER_OTLP_TRACES_ENDPOINT,
	]
	.iter()
	.any(|var| std::env::var_os(var).is_some())
}

/// Install the global subscriber.
pub fn init(level: Option<LogLevel>, format: LogFormat) -> Result<TelemetryGuard> {
	let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
	let fmt_layer = if format.is_pretty() {
		fmt_layer.pretty().boxed()
	} else {
		fmt_layer.json().boxed()
	};

	let registry = tracing_subscriber::registry()
		.with(filter(level))
		.with(fmt_layer);

	if !otlp_configured() {
		registry.init();
		return Ok(TelemetryGuard {
			tracer_provider: None,
		});
	}

	let tracer_provider = otlp_tracer_provider()?;
	let otel_layer = tracing_opentelemetry::layer()
		.with_error_records_to_exceptions(true)
		.with_tracer(tracer_provider.tracer(SERVICE_NAME));
	opentelemetry::global::set_tracer_provider(tracer_provider.clone());

	registry.with(otel_layer).init();

	Ok(TelemetryGuard {
		tracer_provider: Some(tracer_provider),
	})
}

/// Tracer provider exporting over OTLP.
///
/// The transport follows `OTEL_EXPORTER_OTLP_PROTOCOL`: `grpc` selects tonic,
/// anything else HTTP. Resource attributes come from the standard variables,
/// with `service.name` defaulting to `kwatch`.
fn otlp_tracer_provider() -> Result<SdkTracerProvider> {
	let mut resource = Resource::builder();
	if std::env::var_os(OTEL_SERVICE_NAME).is_none() {
		resource = resource.with_service_name(SERVICE_NAME);
	}

	let protocol = std::env::var(opentelemetry_otlp::OTEL_EXPORTER_OTLP_PROTOCOL)
		.unwrap_or_else(|_| opentelemetry_otlp::OTEL_EXPORTER_OTLP_PROTOCOL_DEFAULT.to_string());
	let exporter = if protocol == "grpc" {
		opentelemetry_otlp::SpanExporter::builder()
			.with_tonic()
			.build()
	} else {
		opentelemetry_otlp::SpanExporter::builder()
			.with_http()
			.build()
	}
	.context("building OTLP span exporter")?;

	Ok(SdkTracerProvider::builder()
		.with_resource(resource.build())
		.with_batch_exporter(exporter)
		.build())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_log_level_maps_to_tracing_level() {
		assert_eq!(Level::from(LogLevel::Warn), Level::WARN);
		assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
	}

	#[test]
	fn test_explicit_level_filter() {
		assert_eq!(filter(Some(LogLevel::Debug)).to_string(), "debug");
	}

	#[test]
	fn test_forced_formats() {
		assert!(LogFormat::Pretty.is_pretty());
		assert!(!LogFormat::Json.is_pretty());
	}
}
