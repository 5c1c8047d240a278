//! Handler traits and types for JSON-RPC methods
//!
//! A handler is the code behind one method name. It receives the request's
//! parameter set (or `None` when the request carried none) and resolves to a
//! JSON result or a failure.
//!
//! # Handler Trait
//!
//! [`Handler`] is:
//!
//! - **Async**: it returns a pinned, boxed future
//! - **Thread-safe**: `Send + Sync`, so one dispatcher can serve many tasks
//! - **Type-erased**: it works on [`Params`] and [`serde_json::Value`]
//!
//! # Creating Handlers
//!
//! 1. **from_fn**: wrap an async closure over the raw parameter set
//! 2. **from_typed_fn**: wrap an async closure over a deserialized type;
//!    parameters that do not deserialize are reported as `Invalid params`
//! 3. **from_context_fn**: like `from_fn`, but the closure also receives the
//!    dispatch's [`CallContext`]
//! 4. **#[method]**: annotate an async fn (via jsonrpc11-macros) to get a
//!    [`NamedHandler`] factory
//!
//! # Failing
//!
//! A handler fails by returning an [`Error`]. Return `Error::Api` (or
//! `ApiError`) to give the caller an application error code in `0..=999`.
//! Any other error, and any panic, is reported as an internal error.
//!
//! # Examples
//!
//! ```rust
//! use jsonrpc11_server::{from_fn, from_typed_fn};
//! use serde::Deserialize;
//!
//! // Raw parameter set
//! let status = from_fn(|_params| async move {
//!     Ok(serde_json::json!({"status": "ok"}))
//! });
//!
//! // Named parameters deserialized into a struct
//! #[derive(Deserialize)]
//! struct AddParams { a: i64, b: i64 }
//!
//! let add = from_typed_fn(|p: AddParams| async move { Ok(p.a + p.b) });
//!
//! // Positional parameters deserialized into a tuple
//! let sub = from_typed_fn(|(a, b): (i64, i64)| async move { Ok(a - b) });
//! ```

use crate::context::CallContext;
use jsonrpc11_core::{Error, Params, Result};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by every handler
pub type HandlerResult = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// Trait for JSON-RPC method handlers
///
/// Implementations must be thread-safe; the dispatcher shares them across
/// concurrent calls behind an `Arc`.
///
/// # Examples
///
/// ```rust
/// use jsonrpc11_core::Params;
/// use jsonrpc11_server::{Handler, HandlerResult};
///
/// struct Echo;
///
/// impl Handler for Echo {
///     fn handle(&self, params: Option<Params>) -> HandlerResult {
///         Box::pin(async move {
///             Ok(params.map(Params::into_value).unwrap_or_default())
///         })
///     }
/// }
/// ```
pub trait Handler: Send + Sync {
    /// Invoke the method with the request's parameter set
    fn handle(&self, params: Option<Params>) -> HandlerResult;

    /// Invoke the method with the parameter set and the caller's context
    ///
    /// The dispatcher always calls this. The default ignores the context.
    fn handle_with_context(&self, params: Option<Params>, ctx: &CallContext) -> HandlerResult {
        let _ = ctx;
        self.handle(params)
    }
}

/// Handler wrapping an async closure over the raw parameter set
pub struct AsyncHandler<F, Fut>
where
    F: Fn(Option<Params>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    func: F,
}

impl<F, Fut> AsyncHandler<F, Fut>
where
    F: Fn(Option<Params>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, Fut> Handler for AsyncHandler<F, Fut>
where
    F: Fn(Option<Params>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn handle(&self, params: Option<Params>) -> HandlerResult {
        Box::pin((self.func)(params))
    }
}

/// Create a handler from an async closure over the raw parameter set
pub fn from_fn<F, Fut>(func: F) -> Box<dyn Handler>
where
    F: Fn(Option<Params>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Box::new(AsyncHandler::new(func))
}

/// Handler wrapping an async closure over the parameter set and call context
pub struct ContextHandler<F, Fut>
where
    F: Fn(Option<Params>, CallContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    func: F,
}

impl<F, Fut> Handler for ContextHandler<F, Fut>
where
    F: Fn(Option<Params>, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn handle(&self, params: Option<Params>) -> HandlerResult {
        Box::pin((self.func)(params, CallContext::default()))
    }

    fn handle_with_context(&self, params: Option<Params>, ctx: &CallContext) -> HandlerResult {
        Box::pin((self.func)(params, ctx.clone()))
    }
}

/// Create a handler that also sees the dispatch's [`CallContext`]
///
/// Called outside a dispatch (through [`Handler::handle`]) the context is
/// empty.
///
/// # Examples
///
/// ```rust
/// use jsonrpc11_core::Error;
/// use jsonrpc11_server::from_context_fn;
///
/// let whoami = from_context_fn(|_params, ctx| async move {
///     ctx.get("user")
///         .cloned()
///         .ok_or_else(|| Error::api(401, "Not signed in"))
/// });
/// ```
pub fn from_context_fn<F, Fut>(func: F) -> Box<dyn Handler>
where
    F: Fn(Option<Params>, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Box::new(ContextHandler { func })
}

/// Create a handler from an async closure over typed parameters
///
/// Positional parameters are deserialized from a JSON array (use a tuple or
/// a `Vec`), named parameters from a JSON object (use a struct or a map).
/// Missing parameters deserialize from `null`, so `()` and `Option<T>`
/// accept a call without params.
///
/// # Errors
///
/// The handler fails with `Error::InvalidParams` when deserialization fails,
/// and with `Error::Serialization` when the result cannot become JSON.
pub fn from_typed_fn<P, R, F, Fut>(func: F) -> Box<dyn Handler>
where
    P: serde::de::DeserializeOwned + Send + 'static,
    R: serde::Serialize + Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let func = Arc::new(func);

    from_fn(move |params: Option<Params>| {
        let func = Arc::clone(&func);
        async move {
            let raw = params.map(Params::into_value).unwrap_or(Value::Null);
            let params: P =
                serde_json::from_value(raw).map_err(|e| Error::InvalidParams(e.to_string()))?;

            let result = func(params).await?;

            serde_json::to_value(result).map_err(|e| Error::Serialization(e.to_string()))
        }
    })
}

/// A handler that carries its own method name
///
/// Produced by the `#[method]` attribute and accepted by
/// `MethodRegistry::add`, which registers it under its own name.
pub struct NamedHandler {
    name: String,
    handler: Box<dyn Handler>,
}

impl NamedHandler {
    pub fn new(name: impl Into<String>, handler: Box<dyn Handler>) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Split into the name and the bare handler
    pub fn into_parts(self) -> (String, Box<dyn Handler>) {
        (self.name, self.handler)
    }
}

impl std::fmt::Debug for NamedHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedHandler").field("name", &self.name).finish()
    }
}
