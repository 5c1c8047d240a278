//! Transport-agnostic JSON-RPC 1.1 method registry and dispatcher
//!
//! This crate turns decoded JSON-RPC 1.1 requests into responses:
//!
//! - **Handlers**: async functions behind the [`Handler`] trait
//! - **Registry**: method names mapped to handlers, parameter shapes and
//!   optional JSON Schemas ([`MethodRegistry`], [`MethodSpec`])
//! - **Schemas**: pluggable validation ([`SchemaValidator`]) with a
//!   `jsonschema`-backed default and schema directories ([`SchemaCatalog`])
//! - **Dispatcher**: single calls, notifications and batches ([`Dispatcher`])
//! - **Middleware**: hooks around handler invocation
//! - **Call context**: caller-supplied values handed to middleware and
//!   handlers ([`CallContext`])
//! - **Metrics**: OpenTelemetry instruments for dispatch outcomes
//!
//! Bytes never pass through here. A transport decodes its input (see
//! `jsonrpc11_core::codec`), hands the value to [`Dispatcher::dispatch`] and
//! encodes whatever reply comes back, or uses [`Dispatcher::call`] to do all
//! three with text.
//!
//! # Quick Start
//!
//! ```rust
//! use jsonrpc11_core::{ApiError, ParamShape};
//! use jsonrpc11_server::{from_typed_fn, Dispatcher, MethodSpec};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> jsonrpc11_core::Result<()> {
//! let dispatcher = Dispatcher::builder()
//!     .method(
//!         MethodSpec::new("divide", from_typed_fn(|(a, b): (f64, f64)| async move {
//!             if b == 0.0 {
//!                 return Err(ApiError::new(10, "Division by zero").into());
//!             }
//!             Ok(a / b)
//!         }))
//!         .accepts(ParamShape::Positional)
//!         .params_schema(json!({"type": "array", "items": {"type": "number"}, "minItems": 2})),
//!     )
//!     .build()?;
//!
//! let reply = dispatcher
//!     .call(r#"{"version":"1.1","method":"divide","params":[1,0],"id":1}"#)
//!     .await
//!     .unwrap();
//! assert!(reply.contains(r#""code":10"#));
//! # Ok(())
//! # }
//! ```

mod batch;
mod builder;
mod context;
mod dispatcher;
mod handler;
mod metrics;
mod middleware;
mod registry;
mod schema;

pub use batch::{BatchMode, BatchProcessor};
pub use builder::DispatcherBuilder;
pub use context::CallContext;
pub use dispatcher::{Dispatched, Dispatcher, NotificationFault, NotificationFaultPolicy};
pub use handler::{
    from_context_fn, from_fn, from_typed_fn, AsyncHandler, ContextHandler, Handler, HandlerResult,
    NamedHandler,
};
pub use metrics::{DispatchMetrics, UNKNOWN_METHOD};
pub use middleware::{
    Middleware, MiddlewareAction, MiddlewareChain, MiddlewareContext, SyncMiddleware,
    TracingMiddleware,
};
pub use registry::{MethodRegistry, MethodSpec};
pub use schema::{AcceptAll, JsonSchemaValidator, Schema, SchemaCatalog, SchemaValidator};
