//! Logging and OpenTelemetry setup for processes hosting a dispatcher
//!
//! The dispatcher itself only emits `tracing` spans and events and records
//! metrics through the global `opentelemetry` meter. Nothing is exported
//! until the hosting process installs a subscriber and providers, which is
//! what [`init_observability`] does.
//!
//! # Pipeline
//!
//! 1. **Log output**: a `tracing-subscriber` fmt layer writing to stderr,
//!    as JSON or in compact human-readable form
//! 2. **Filtering**: `RUST_LOG` when set, the configured level otherwise
//! 3. **Traces** (optional): spans exported over OTLP/gRPC
//! 4. **Metrics** (optional): instruments exported over OTLP/gRPC every 30s
//!
//! Logs go to stderr so that stdout stays free for transports that speak
//! JSON-RPC over standard streams.
//!
//! # Usage
//!
//! ```rust,no_run
//! use jsonrpc11_core::{LogFormat, ObservabilityConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ObservabilityConfig::new("inventory-rpc")
//!         .with_endpoint("http://localhost:4317")
//!         .with_log_format(LogFormat::Compact)
//!         .with_log_level("debug");
//!
//!     jsonrpc11_core::init_observability(config).expect("Failed to init observability");
//!
//!     // ... serve requests ...
//!
//!     jsonrpc11_core::shutdown_observability();
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: collector endpoint
//! - `RUST_LOG`: log filter directives (e.g. `info,jsonrpc11_server=debug`)

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type InitResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

// Handles to the providers installed globally, kept so shutdown can flush them
static TRACER_PROVIDER: Mutex<Option<SdkTracerProvider>> = Mutex::new(None);
static METER_PROVIDER: Mutex<Option<SdkMeterProvider>> = Mutex::new(None);

/// How log events are rendered on stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event, for log shippers
    #[default]
    Json,
    /// Single-line human-readable output
    Compact,
}

/// Observability configuration
///
/// # Defaults
///
/// - Service name: "jsonrpc11"
/// - Service version: the crate version
/// - OTLP endpoint: `$OTEL_EXPORTER_OTLP_ENDPOINT` or "http://localhost:4317"
/// - Traces and metrics export enabled
/// - Log format: JSON
/// - Log level: `$RUST_LOG` or "info"
///
/// # Examples
///
/// ```rust
/// use jsonrpc11_core::{LogFormat, ObservabilityConfig};
///
/// // Local logging only, nothing exported
/// let config = ObservabilityConfig::new("calc-service")
///     .with_traces(false)
///     .with_metrics(false)
///     .with_log_format(LogFormat::Compact);
/// assert!(!config.exports_anything());
/// ```
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Identifies the service in all exported telemetry
    pub service_name: String,

    /// Reported as `service.version`
    pub service_version: String,

    /// gRPC endpoint of the OpenTelemetry collector
    pub otlp_endpoint: String,

    /// Export spans over OTLP
    pub enable_traces: bool,

    /// Export metrics over OTLP
    pub enable_metrics: bool,

    /// Rendering of local log output
    pub log_format: LogFormat,

    /// Filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "jsonrpc11".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
            enable_traces: true,
            enable_metrics: true,
            log_format: LogFormat::default(),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl ObservabilityConfig {
    /// Create a configuration for the named service with default settings
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Set the OTLP collector endpoint (e.g. "http://collector:4317")
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    /// Set the fallback log filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    pub fn with_traces(mut self, enable: bool) -> Self {
        self.enable_traces = enable;
        self
    }

    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Whether any OTLP exporter will be started
    pub fn exports_anything(&self) -> bool {
        self.enable_traces || self.enable_metrics
    }

    fn resource(&self) -> Resource {
        Resource::builder_empty()
            .with_attributes(vec![
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                    self.service_name.clone(),
                ),
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                    self.service_version.clone(),
                ),
            ])
            .build()
    }
}

/// Install the tracing subscriber and, if enabled, the OTLP providers
///
/// Call once at startup. The OTLP exporters need a running tokio runtime.
///
/// # Errors
///
/// Fails if an exporter cannot be built, the log filter does not parse, or a
/// global subscriber is already installed.
pub fn init_observability(config: ObservabilityConfig) -> InitResult<()> {
    let tracer = if config.enable_traces {
        Some(init_tracer(&config)?)
    } else {
        None
    };

    if config.enable_metrics {
        init_metrics(&config)?;
    }

    init_tracing_subscriber(&config, tracer)?;

    tracing::info!(
        service_name = %config.service_name,
        otlp_endpoint = %config.otlp_endpoint,
        traces = config.enable_traces,
        metrics = config.enable_metrics,
        log_format = ?config.log_format,
        "Observability initialized"
    );

    Ok(())
}

fn init_tracer(config: &ObservabilityConfig) -> InitResult<opentelemetry_sdk::trace::Tracer> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(config.resource())
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .build();

    // The subscriber layer needs the tracer before the provider goes global
    let tracer = provider.tracer(config.service_name.clone());
    global::set_tracer_provider(provider.clone());
    keep(&TRACER_PROVIDER, provider);

    Ok(tracer)
}

fn init_metrics(config: &ObservabilityConfig) -> InitResult<()> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter)
        .with_interval(Duration::from_secs(30))
        .build();

    let provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(config.resource())
        .build();

    global::set_meter_provider(provider.clone());
    keep(&METER_PROVIDER, provider);
    Ok(())
}

fn keep<T>(slot: &Mutex<Option<T>>, provider: T) {
    if let Ok(mut slot) = slot.lock() {
        *slot = Some(provider);
    }
}

fn take<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    slot.lock().ok().and_then(|mut slot| slot.take())
}

fn init_tracing_subscriber(
    config: &ObservabilityConfig,
    tracer: Option<opentelemetry_sdk::trace::Tracer>,
) -> InitResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let telemetry_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    let json_layer = (config.log_format == LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .json()
    });

    let compact_layer = (config.log_format == LogFormat::Compact).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact()
    });

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter)
        .with(json_layer)
        .with(compact_layer)
        .try_init()?;

    Ok(())
}

/// Flush and stop telemetry before exit
///
/// Exports pending spans and a final round of metrics, then stops the
/// providers installed by [`init_observability`]. Calling it without a prior
/// init, or twice, does nothing beyond logging.
pub fn shutdown_observability() {
    tracing::info!("Shutting down observability");

    if let Some(provider) = take(&TRACER_PROVIDER) {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "Tracer provider shutdown failed");
        }
    }

    if let Some(provider) = take(&METER_PROVIDER) {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "Meter provider shutdown failed");
        }
    }
}
