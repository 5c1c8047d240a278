//! The JSON-RPC 1.1 dispatcher
//!
//! A [`Dispatcher`] takes a decoded request (or batch of requests), runs each
//! one against its method registry and returns what should be sent back. It
//! never touches a transport: callers decode bytes into a
//! [`serde_json::Value`] first and encode the returned [`Reply`] afterwards.
//! [`Dispatcher::call`] does both for text-based transports.
//!
//! # Per-request pipeline
//!
//! 1. **Envelope validation**: object, `"version": "1.1"`, non-empty `method`,
//!    array/object `params` (`-32600` on failure)
//! 2. **Method lookup** (`-32601`)
//! 3. **Parameter checks**: declared shape and params schema (`-32602`)
//! 4. **Invocation** through the middleware chain; parameters rewritten by
//!    middleware are checked again
//! 5. **Result validation** against the result schema (`-32603`)
//! 6. **Response assembly** through the error mapper
//! 7. **Notification suppression**: requests without an id get no response
//!
//! A panic anywhere in steps 2 to 5 (handler, middleware hook or schema
//! validator) fails only its own request, with `-32603`.
//!
//! # Call context
//!
//! [`Dispatcher::dispatch_with`] and [`Dispatcher::call_with`] take a
//! [`CallContext`] that every entry of the dispatch sees, in middleware and
//! in handlers built with [`from_context_fn`](crate::from_context_fn).
//!
//! # Notifications
//!
//! A notification never produces a response, but a failing one is not
//! silently lost: it is logged at `warn` and, under the default
//! [`NotificationFaultPolicy::Report`], returned in [`Dispatched::faults`].
//!
//! # Batches
//!
//! Each entry is processed independently; one failing entry never affects
//! its siblings. Responses come back in request order, with notifications
//! contributing nothing. A batch made only of notifications yields no reply.
//!
//! # Examples
//!
//! ```rust
//! use jsonrpc11_server::{from_typed_fn, Dispatcher};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> jsonrpc11_core::Result<()> {
//! let dispatcher = Dispatcher::builder()
//!     .handler("add", from_typed_fn(|(a, b): (i64, i64)| async move { Ok(a + b) }))
//!     .build()?;
//!
//! let reply = dispatcher
//!     .call(r#"{"version": "1.1", "method": "add", "params": [2, 3], "id": 1}"#)
//!     .await;
//! assert_eq!(reply.as_deref(), Some(r#"{"version":"1.1","result":5,"id":1}"#));
//!
//! // Notifications get nothing back
//! let reply = dispatcher
//!     .call(r#"{"version": "1.1", "method": "add", "params": [2, 3]}"#)
//!     .await;
//! assert!(reply.is_none());
//! # Ok(())
//! # }
//! ```

use crate::batch::BatchProcessor;
use crate::builder::DispatcherBuilder;
use crate::context::CallContext;
use crate::handler::Handler;
use crate::metrics::{DispatchMetrics, UNKNOWN_METHOD};
use crate::middleware::{MiddlewareChain, MiddlewareContext};
use crate::registry::{MethodRegistry, MethodSpec};
use crate::schema::{check_declared, Schema, SchemaValidator};
use futures::FutureExt;
use jsonrpc11_core::{
    code_of, codec, json_type, map_failure, Error, ErrorObject, ParamShape, Params, Reply,
    Request, Response, Result, SchemaViolation,
};
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// Reply sent when a reply cannot be encoded
const ENCODE_FAILURE_REPLY: &str = r#"{"version":"1.1","error":{"name":"JSONRPCError","code":-32603,"message":"Internal error"}}"#;

/// What happens to failures of notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationFaultPolicy {
    /// Log the failure and return it in [`Dispatched::faults`]
    #[default]
    Report,
    /// Log the failure and drop it
    LogOnly,
}

/// A failure that occurred while handling a notification
#[derive(Debug, Clone)]
pub struct NotificationFault {
    /// The method named by the notification, when it named one
    pub method: Option<String>,
    /// What went wrong
    pub error: Error,
}

impl NotificationFault {
    /// The error object the failure would have produced for a call
    pub fn error_object(&self) -> ErrorObject {
        map_failure(self.error.clone())
    }
}

impl std::fmt::Display for NotificationFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.method {
            Some(method) => write!(f, "notification '{method}' failed: {}", self.error),
            None => write!(f, "notification failed: {}", self.error),
        }
    }
}

/// Result of one dispatch
#[derive(Debug, Default)]
pub struct Dispatched {
    /// What to send back, if anything
    pub reply: Option<Reply>,
    /// Failures of notifications, which have no response to carry them
    pub faults: Vec<NotificationFault>,
}

impl Dispatched {
    fn single(response: Response) -> Self {
        Self {
            reply: Some(Reply::Single(response)),
            faults: Vec::new(),
        }
    }

    /// Whether there is nothing to send back
    pub fn is_silent(&self) -> bool {
        self.reply.is_none()
    }

    pub fn into_reply(self) -> Option<Reply> {
        self.reply
    }
}

/// How one entry of a dispatch ended
#[derive(Debug)]
pub(crate) enum EntryOutcome {
    Respond(Response),
    Suppressed(Option<NotificationFault>),
}

pub(crate) struct DispatcherInner {
    pub(crate) registry: MethodRegistry,
    pub(crate) validator: Arc<dyn SchemaValidator>,
    pub(crate) middleware: MiddlewareChain,
    pub(crate) batch: BatchProcessor,
    pub(crate) fault_policy: NotificationFaultPolicy,
    pub(crate) metrics: Option<Arc<DispatchMetrics>>,
}

/// Transport-agnostic JSON-RPC 1.1 dispatcher
///
/// Cheap to clone: clones share the registry and configuration. Build one
/// with [`Dispatcher::builder`].
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub(crate) fn from_inner(inner: DispatcherInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.inner.registry
    }

    /// Registered method names, sorted
    pub fn methods(&self) -> Vec<String> {
        self.inner.registry.methods()
    }

    pub fn notification_fault_policy(&self) -> NotificationFaultPolicy {
        self.inner.fault_policy
    }

    /// Dispatch decoded input
    ///
    /// An object is a single request, an array a batch. Anything else, and an
    /// empty array, is answered with an `Invalid Request` response without id.
    pub async fn dispatch(&self, input: Value) -> Dispatched {
        self.dispatch_with(input, CallContext::default()).await
    }

    /// Dispatch decoded input, handing `ctx` to every entry
    pub async fn dispatch_with(&self, input: Value, ctx: CallContext) -> Dispatched {
        match input {
            Value::Array(entries) => self.dispatch_batch(entries, &ctx).await,
            Value::Object(_) => match self.process_entry(input, &ctx).await {
                EntryOutcome::Respond(response) => Dispatched::single(response),
                EntryOutcome::Suppressed(fault) => Dispatched {
                    reply: None,
                    faults: fault.into_iter().collect(),
                },
            },
            other => {
                tracing::debug!(input_type = json_type(&other), "Rejected top-level input");
                Dispatched::single(Response::failure(
                    Error::InvalidRequest(format!(
                        "expected a request object or a batch array, got {}",
                        json_type(&other)
                    )),
                    None,
                ))
            }
        }
    }

    /// Decode text, dispatch it and encode the reply
    ///
    /// Undecodable text is answered with a `Parse error` response. `None`
    /// means nothing should be sent back. Notification faults are logged but
    /// otherwise not visible through this method; use [`Dispatcher::dispatch`]
    /// to receive them.
    pub async fn call(&self, text: &str) -> Option<String> {
        self.call_with(text, CallContext::default()).await
    }

    /// Like [`Dispatcher::call`], handing `ctx` to every entry
    pub async fn call_with(&self, text: &str, ctx: CallContext) -> Option<String> {
        let dispatched = match codec::decode(text) {
            Ok(input) => self.dispatch_with(input, ctx).await,
            Err(e) => {
                tracing::debug!(error = %e, "Undecodable input");
                Dispatched::single(codec::parse_error_response(&e))
            }
        };

        let reply = dispatched.reply?;
        match codec::encode_reply(&reply) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode reply");
                Some(ENCODE_FAILURE_REPLY.to_string())
            }
        }
    }

    /// Run a request through lookup, checks and invocation
    ///
    /// This is steps 2 to 5 of the pipeline, without response assembly or
    /// notification suppression. The request's version and method name are
    /// checked first, since its fields may have been set by hand.
    ///
    /// Panics are not caught here, except those of the handler itself.
    pub async fn execute(&self, request: Request) -> Result<Value> {
        self.execute_with(request, &CallContext::default()).await
    }

    /// Like [`Dispatcher::execute`], handing `ctx` to middleware and handler
    pub async fn execute_with(&self, request: Request, ctx: &CallContext) -> Result<Value> {
        request.validate()?;

        let spec = self.inner.registry.resolve(&request.method)?;
        tracing::debug!(method = %request.method, "Method resolved");

        check_shape(spec, request.params.as_ref())?;
        self.check_params(spec, request.params.as_ref())?;

        let handler = Arc::clone(spec.handler());
        let outcome = if self.inner.middleware.is_empty() {
            invoke(handler, request.params, ctx.clone()).await
        } else {
            let checked = request.params.clone();
            let call = MiddlewareContext::new(request.method, request.params, request.id)
                .with_context(ctx.clone());
            self.inner
                .middleware
                .execute(call, move |call| async move {
                    if call.params != checked {
                        tracing::debug!(method = %spec.name(), "Params rewritten by middleware");
                        check_shape(spec, call.params.as_ref())?;
                        self.check_params(spec, call.params.as_ref())?;
                    }
                    invoke(handler, call.params, call.context).await
                })
                .await
        };
        let result = outcome?;

        self.check_result(spec, &result)?;
        Ok(result)
    }

    async fn dispatch_batch(&self, entries: Vec<Value>, ctx: &CallContext) -> Dispatched {
        if entries.is_empty() {
            tracing::debug!("Rejected empty batch");
            return Dispatched::single(Response::failure(
                Error::InvalidRequest("batch must not be empty".into()),
                None,
            ));
        }

        if let Err(e) = self.inner.batch.check_size(entries.len()) {
            tracing::warn!(error = %e, "Rejected batch");
            return Dispatched::single(Response::failure(e, None));
        }

        if let Some(metrics) = &self.inner.metrics {
            metrics.record_batch(entries.len() as u64, self.inner.batch.mode().as_str());
        }

        let mut dispatched = Dispatched::default();
        let mut responses = Vec::new();
        for outcome in self.inner.batch.process_batch(entries, self, ctx).await {
            match outcome {
                EntryOutcome::Respond(response) => responses.push(response),
                EntryOutcome::Suppressed(Some(fault)) => dispatched.faults.push(fault),
                EntryOutcome::Suppressed(None) => {}
            }
        }

        if !responses.is_empty() {
            dispatched.reply = Some(Reply::Batch(responses));
        }
        dispatched
    }

    /// Handle one request envelope (top-level or batch entry)
    ///
    /// Panics raised while the request runs end here, as `Error::Panic`.
    pub(crate) async fn process_entry(&self, raw: Value, ctx: &CallContext) -> EntryOutcome {
        let started = Instant::now();
        let is_envelope = raw.is_object();
        let id = Request::id_of(&raw);
        let method = raw.get("method").and_then(Value::as_str).map(str::to_string);

        let result = match Request::from_value(raw) {
            Ok(request) => {
                tracing::debug!(method = %request.method, id = ?request.id, "Envelope validated");
                AssertUnwindSafe(self.execute_with(request, ctx))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| {
                        let message = panic_message(payload.as_ref());
                        tracing::error!(method = ?method, panic = %message, "Call panicked");
                        Err(Error::Panic(message))
                    })
            }
            Err(e) => Err(e),
        };

        self.record(method.as_deref(), id.is_none(), &result, started);
        self.settle(id, is_envelope, method, result)
    }

    /// Turn the outcome of an entry into a response or a suppressed notification
    pub(crate) fn settle(
        &self,
        id: Option<Value>,
        is_envelope: bool,
        method: Option<String>,
        result: Result<Value>,
    ) -> EntryOutcome {
        match (id, result) {
            (Some(id), Ok(value)) => EntryOutcome::Respond(Response::success(value, Some(id))),
            (Some(id), Err(e)) => EntryOutcome::Respond(Response::failure(e, Some(id))),
            // Not even an object, so not a notification either
            (None, Err(e)) if !is_envelope => EntryOutcome::Respond(Response::failure(e, None)),
            (None, Ok(_)) => EntryOutcome::Suppressed(None),
            (None, Err(error)) => {
                let fault = NotificationFault { method, error };
                tracing::warn!(
                    method = ?fault.method,
                    code = code_of(&fault.error),
                    error = %fault.error,
                    "Notification failed"
                );
                match self.inner.fault_policy {
                    NotificationFaultPolicy::Report => EntryOutcome::Suppressed(Some(fault)),
                    NotificationFaultPolicy::LogOnly => EntryOutcome::Suppressed(None),
                }
            }
        }
    }

    fn check_params(&self, spec: &MethodSpec, params: Option<&Params>) -> Result<()> {
        match (spec.declared_params(), params) {
            (None, _) | (Some(Schema::Absent), None) => Ok(()),
            (Some(Schema::Absent), Some(_)) => Err(Error::InvalidParams(
                "Method declares no parameters, but some were provided".into(),
            )),
            (Some(Schema::Document(_)), None) => Err(Error::InvalidParams(
                "Method declares parameters, but none were provided".into(),
            )),
            (Some(Schema::Document(schema)), Some(params)) => {
                check_declared(self.inner.validator.as_ref(), spec.name(), "params", schema)?;
                let value = params.to_value();
                self.inner
                    .validator
                    .validate(schema, &value)
                    .map_err(Error::ParamsViolation)?;
                tracing::debug!(method = %spec.name(), "Params validated");
                Ok(())
            }
        }
    }

    fn check_result(&self, spec: &MethodSpec, result: &Value) -> Result<()> {
        match spec.declared_result() {
            None => Ok(()),
            Some(Schema::Absent) if result.is_null() => Ok(()),
            Some(Schema::Absent) => Err(Error::ResultViolation(
                SchemaViolation::new("Method declares no result, but returned a value")
                    .with_value(result.clone()),
            )),
            Some(Schema::Document(schema)) => {
                check_declared(self.inner.validator.as_ref(), spec.name(), "result", schema)?;
                self.inner
                    .validator
                    .validate(schema, result)
                    .map_err(Error::ResultViolation)?;
                tracing::debug!(method = %spec.name(), "Result validated");
                Ok(())
            }
        }
    }

    fn record(&self, method: Option<&str>, notification: bool, result: &Result<Value>, started: Instant) {
        let Some(metrics) = &self.inner.metrics else {
            return;
        };

        let resolved = method.filter(|name| self.inner.registry.contains(name));
        metrics.record_request(
            resolved.unwrap_or(UNKNOWN_METHOD),
            notification,
            result.as_ref().err().map(code_of),
            started.elapsed().as_secs_f64(),
        );
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("methods", &self.inner.registry.methods())
            .field("batch", &self.inner.batch)
            .field("fault_policy", &self.inner.fault_policy)
            .field("middleware", &self.inner.middleware.len())
            .finish()
    }
}

fn check_shape(spec: &MethodSpec, params: Option<&Params>) -> Result<()> {
    let Some(params) = params else {
        return Ok(());
    };
    match spec.accepted_shape() {
        ParamShape::Any => Ok(()),
        accepted if accepted == params.shape() => Ok(()),
        accepted => Err(Error::InvalidParams(format!(
            "method '{}' accepts {accepted} parameters, got {}",
            spec.name(),
            params.shape()
        ))),
    }
}

/// Call a handler, turning panics into `Error::Panic`
async fn invoke(handler: Arc<dyn Handler>, params: Option<Params>, ctx: CallContext) -> Result<Value> {
    let future = std::panic::catch_unwind(AssertUnwindSafe(|| {
        handler.handle_with_context(params, &ctx)
    }))
    .map_err(|payload| Error::Panic(panic_message(payload.as_ref())))?;

    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(Error::Panic(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panicked with a non-string payload".to_string()
    }
}
