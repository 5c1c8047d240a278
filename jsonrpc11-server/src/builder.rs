//! Builder for configuring a dispatcher
//!
//! The builder collects everything a [`Dispatcher`] needs:
//! - Methods (with or without schemas)
//! - A schema directory to fill in missing schemas
//! - The schema validator
//! - Batch mode and size limit
//! - Notification fault policy
//! - Middleware
//! - Observability and metrics
//!
//! # Examples
//!
//! ```rust,no_run
//! use jsonrpc11_core::{LogFormat, ObservabilityConfig};
//! use jsonrpc11_server::{from_typed_fn, BatchMode, Dispatcher, NotificationFaultPolicy};
//!
//! # fn example() -> jsonrpc11_core::Result<()> {
//! let dispatcher = Dispatcher::builder()
//!     .handler("ping", from_typed_fn(|_: ()| async { Ok("pong") }))
//!     .schema_dir("./schemas")
//!     .batch_mode(BatchMode::Parallel)
//!     .max_batch_size(100)
//!     .notification_faults(NotificationFaultPolicy::LogOnly)
//!     .with_observability(
//!         ObservabilityConfig::new("ping-service")
//!             .with_traces(false)
//!             .with_log_format(LogFormat::Compact),
//!     )
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::{
    BatchMode, BatchProcessor, DispatchMetrics, Dispatcher, Handler, JsonSchemaValidator,
    MethodRegistry, MethodSpec, Middleware, MiddlewareChain, NamedHandler,
    NotificationFaultPolicy, SchemaCatalog, SchemaValidator, SyncMiddleware,
};
use crate::dispatcher::DispatcherInner;
use crate::schema::{check_declared, Schema};
use jsonrpc11_core::{Error, ObservabilityConfig, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// Builder for [`Dispatcher`]
pub struct DispatcherBuilder {
    methods: Vec<MethodSpec>,
    registry: Option<MethodRegistry>,
    schema_dir: Option<PathBuf>,
    validator: Option<Arc<dyn SchemaValidator>>,
    batch_mode: BatchMode,
    max_batch_size: Option<usize>,
    fault_policy: NotificationFaultPolicy,
    middleware_chain: MiddlewareChain,
    observability_config: Option<ObservabilityConfig>,
    metrics: Option<Arc<DispatchMetrics>>,
    service_name: Option<String>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            methods: Vec::new(),
            registry: None,
            schema_dir: None,
            validator: None,
            batch_mode: BatchMode::default(),
            max_batch_size: None,
            fault_policy: NotificationFaultPolicy::default(),
            middleware_chain: MiddlewareChain::new(),
            observability_config: None,
            metrics: None,
            service_name: None,
        }
    }

    /// Register a method with its declarations
    pub fn method(mut self, spec: MethodSpec) -> Self {
        self.methods.push(spec);
        self
    }

    /// Register a handler under a name, without schemas
    pub fn handler(self, name: impl Into<String>, handler: Box<dyn Handler>) -> Self {
        self.method(MethodSpec::new(name, handler))
    }

    /// Register a handler under its own name
    pub fn named(self, handler: NamedHandler) -> Self {
        self.method(MethodSpec::named(handler))
    }

    /// Start from an existing registry
    ///
    /// Methods added through the builder are registered on top of it.
    pub fn registry(mut self, registry: MethodRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Load `<method>.params.json` / `<method>.result.json` schemas from a directory
    pub fn schema_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schema_dir = Some(dir.into());
        self
    }

    /// Replace the default `jsonschema`-backed validator
    pub fn validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn batch_mode(mut self, mode: BatchMode) -> Self {
        self.batch_mode = mode;
        self
    }

    pub fn max_batch_size(mut self, max_size: usize) -> Self {
        self.max_batch_size = Some(max_size);
        self
    }

    pub fn notification_faults(mut self, policy: NotificationFaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }

    pub fn use_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware_chain.add(middleware);
        self
    }

    pub fn use_sync_middleware<T: SyncMiddleware + 'static>(mut self, middleware: T) -> Self {
        self.middleware_chain.add_sync(middleware);
        self
    }

    /// Initialize logging and OpenTelemetry in `build`, and record metrics
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Record metrics on the given instruments
    ///
    /// Use this when observability is initialized elsewhere.
    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Override the service name used for observability
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Build the dispatcher
    ///
    /// # Errors
    ///
    /// - `Error::DuplicateMethod` if two methods share a name
    /// - `Error::Io` / `Error::Schema` if the schema directory cannot be loaded
    /// - `Error::Schema` if the validator rejects a declared schema document
    /// - `Error::Internal` if observability fails to initialize
    pub fn build(self) -> Result<Dispatcher> {
        let mut metrics = self.metrics;
        if let Some(mut config) = self.observability_config {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }

            jsonrpc11_core::init_observability(config.clone()).map_err(|e| {
                Error::Internal(format!("Failed to initialize observability: {e}"))
            })?;

            if metrics.is_none() {
                metrics = Some(Arc::new(DispatchMetrics::new(config.service_name)));
            }
        }

        let mut registry = self.registry.unwrap_or_default();
        for spec in self.methods {
            registry.register(spec)?;
        }

        if let Some(dir) = &self.schema_dir {
            let catalog = SchemaCatalog::load(dir)?;
            registry.attach_schemas(&catalog);
        }

        let validator = self
            .validator
            .unwrap_or_else(|| Arc::new(JsonSchemaValidator::new()));
        check_schemas(&registry, validator.as_ref())?;

        tracing::info!(
            methods = registry.len(),
            batch_mode = self.batch_mode.as_str(),
            max_batch_size = ?self.max_batch_size,
            fault_policy = ?self.fault_policy,
            middleware = self.middleware_chain.len(),
            "Dispatcher built"
        );

        Ok(Dispatcher::from_inner(DispatcherInner {
            registry,
            validator,
            middleware: self.middleware_chain,
            batch: BatchProcessor::with_limit(self.batch_mode, self.max_batch_size),
            fault_policy: self.fault_policy,
            metrics,
        }))
    }
}

/// Reject declared schema documents the validator cannot use
fn check_schemas(registry: &MethodRegistry, validator: &dyn SchemaValidator) -> Result<()> {
    for name in registry.methods() {
        let Some(spec) = registry.get(&name) else {
            continue;
        };
        for (role, declared) in [("params", spec.declared_params()), ("result", spec.declared_result())] {
            if let Some(Schema::Document(schema)) = declared {
                check_declared(validator, &name, role, schema)?;
            }
        }
    }
    Ok(())
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
