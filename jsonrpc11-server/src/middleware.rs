//! Middleware around handler invocation
//!
//! Middleware intercepts a call after the dispatcher has resolved the method
//! and validated its parameters, and before the result is validated and
//! wrapped in a response. Typical uses:
//! - Tracing and logging
//! - Authorization checks
//! - Caching or stubbing results
//!
//! # Middleware Chain
//!
//! Middleware runs in registration order. Each one can:
//! - Inspect the method, parameters, request id and call context
//! - Add values to the call context for the handler
//! - Short-circuit with a ready result, skipping the handler
//! - Fail the call by returning an error (an `ApiError` reaches the caller
//!   with its own code)
//! - Leave metadata for middleware further down the chain
//!
//! `post_handle` runs in reverse order once the handler (or short-circuit)
//! has produced its outcome. Errors from `post_handle` are ignored.
//!
//! Parameters rewritten by `pre_handle` are checked again against the
//! method's declared shape and params schema before the handler runs.
//!
//! A panic in a hook fails only the call it happened in; the dispatcher
//! reports it as an internal error.
//!
//! # Built-in Middleware
//!
//! - **TracingMiddleware**: logs the start and outcome of every call
//!
//! # Examples
//!
//! ```rust
//! use jsonrpc11_server::{MiddlewareChain, TracingMiddleware};
//! use std::sync::Arc;
//!
//! let mut chain = MiddlewareChain::new();
//! chain.add(Arc::new(TracingMiddleware::new()));
//! assert_eq!(chain.len(), 1);
//! ```

use crate::context::CallContext;
use async_trait::async_trait;
use jsonrpc11_core::{kind_of, Params, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// What the chain does after a middleware's `pre_handle`
#[derive(Debug, Clone)]
pub enum MiddlewareAction {
    /// Run the next middleware, then the handler
    Continue,
    /// Skip the rest of the chain and the handler, using this as the result
    ShortCircuit(Value),
}

/// Call information passed through the chain
#[derive(Debug, Clone)]
pub struct MiddlewareContext {
    /// Resolved method name
    pub method: String,
    /// Parameter set, already validated against the method's declarations
    ///
    /// A `pre_handle` may replace it. The dispatcher validates the
    /// replacement again before the handler sees it, so a rewrite that breaks
    /// the params schema fails the call with `Invalid params`.
    pub params: Option<Params>,
    /// Request id; `None` for notifications
    pub request_id: Option<Value>,
    /// Values the caller supplied for this dispatch
    pub context: CallContext,
    /// Free-form values shared between middleware
    pub metadata: HashMap<String, Value>,
}

impl MiddlewareContext {
    pub fn new(method: impl Into<String>, params: Option<Params>, request_id: Option<Value>) -> Self {
        Self {
            method: method.into(),
            params,
            request_id,
            context: CallContext::default(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_context(mut self, context: CallContext) -> Self {
        self.context = context;
        self
    }

    pub fn is_notification(&self) -> bool {
        self.request_id.is_none()
    }

    pub fn insert_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

/// Async middleware
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Called before the handler
    async fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction>;

    /// Called after the handler with its outcome
    async fn post_handle(&self, ctx: &mut MiddlewareContext, result: &Result<Value>) -> Result<()>;
}

/// Middleware that never awaits
pub trait SyncMiddleware: Send + Sync {
    fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction>;

    fn post_handle(&self, ctx: &mut MiddlewareContext, result: &Result<Value>) -> Result<()>;
}

struct SyncMiddlewareAdapter<T: SyncMiddleware> {
    inner: T,
}

#[async_trait]
impl<T: SyncMiddleware + 'static> Middleware for SyncMiddlewareAdapter<T> {
    async fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction> {
        self.inner.pre_handle(ctx)
    }

    async fn post_handle(&self, ctx: &mut MiddlewareContext, result: &Result<Value>) -> Result<()> {
        self.inner.post_handle(ctx, result)
    }
}

/// Ordered list of middleware
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    pub fn add_sync<T: SyncMiddleware + 'static>(&mut self, middleware: T) {
        self.middlewares.push(Arc::new(SyncMiddlewareAdapter {
            inner: middleware,
        }));
    }

    /// Run the chain around `handler`
    ///
    /// A failing `pre_handle` ends the call with that error; the handler and
    /// the `post_handle` hooks do not run.
    pub async fn execute<F, Fut>(&self, mut ctx: MiddlewareContext, handler: F) -> Result<Value>
    where
        F: FnOnce(MiddlewareContext) -> Fut + Send,
        Fut: std::future::Future<Output = Result<Value>> + Send,
    {
        let mut short_circuit = None;
        for middleware in &self.middlewares {
            match middleware.pre_handle(&mut ctx).await? {
                MiddlewareAction::Continue => continue,
                MiddlewareAction::ShortCircuit(value) => {
                    short_circuit = Some(value);
                    break;
                }
            }
        }

        let result = match short_circuit {
            Some(value) => Ok(value),
            None => handler(ctx.clone()).await,
        };

        for middleware in self.middlewares.iter().rev() {
            let _ = middleware.post_handle(&mut ctx, &result).await;
        }

        result
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

/// Logs each call's start at debug level and its outcome at info/warn
pub struct TracingMiddleware;

impl TracingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for TracingMiddleware {
    async fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction> {
        tracing::debug!(
            method = %ctx.method,
            request_id = ?ctx.request_id,
            notification = ctx.is_notification(),
            "Call started"
        );
        Ok(MiddlewareAction::Continue)
    }

    async fn post_handle(&self, ctx: &mut MiddlewareContext, result: &Result<Value>) -> Result<()> {
        match result {
            Ok(_) => tracing::info!(
                method = %ctx.method,
                request_id = ?ctx.request_id,
                "Call completed"
            ),
            Err(e) => tracing::warn!(
                method = %ctx.method,
                request_id = ?ctx.request_id,
                kind = ?kind_of(e),
                error = %e,
                "Call failed"
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpc11_core::Error;
    use serde_json::json;

    struct TestMiddleware {
        name: String,
    }

    impl TestMiddleware {
        fn new(name: impl Into<String>) -> Self {
            Self { name: name.into() }
        }
    }

    impl SyncMiddleware for TestMiddleware {
        fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction> {
            ctx.insert_metadata(format!("{}_pre", self.name), Value::Bool(true));
            Ok(MiddlewareAction::Continue)
        }

        fn post_handle(&self, ctx: &mut MiddlewareContext, _result: &Result<Value>) -> Result<()> {
            ctx.insert_metadata(format!("{}_post", self.name), Value::Bool(true));
            Ok(())
        }
    }

    struct ShortCircuitMiddleware;

    impl SyncMiddleware for ShortCircuitMiddleware {
        fn pre_handle(&self, _ctx: &mut MiddlewareContext) -> Result<MiddlewareAction> {
            Ok(MiddlewareAction::ShortCircuit(json!("short-circuited")))
        }

        fn post_handle(&self, _ctx: &mut MiddlewareContext, _result: &Result<Value>) -> Result<()> {
            Ok(())
        }
    }

    struct DenyNotifications;

    impl SyncMiddleware for DenyNotifications {
        fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction> {
            if ctx.is_notification() {
                return Err(Error::api(403, "Notifications are not accepted"));
            }
            Ok(MiddlewareAction::Continue)
        }

        fn post_handle(&self, _ctx: &mut MiddlewareContext, _result: &Result<Value>) -> Result<()> {
            Ok(())
        }
    }

    fn context(request_id: Option<Value>) -> MiddlewareContext {
        MiddlewareContext::new("test_method", None, request_id)
    }

    #[tokio::test]
    async fn test_middleware_execution_order() {
        let mut chain = MiddlewareChain::new();
        chain.add_sync(TestMiddleware::new("first"));
        chain.add_sync(TestMiddleware::new("second"));

        let result = chain
            .execute(context(Some(json!(1))), |ctx| async move {
                assert!(ctx.get_metadata("first_pre").is_some());
                assert!(ctx.get_metadata("second_pre").is_some());
                Ok(json!("handler result"))
            })
            .await;

        assert_eq!(result.unwrap(), json!("handler result"));
    }

    #[tokio::test]
    async fn test_middleware_short_circuit() {
        let mut chain = MiddlewareChain::new();
        chain.add_sync(TestMiddleware::new("first"));
        chain.add_sync(ShortCircuitMiddleware);
        chain.add_sync(TestMiddleware::new("third"));

        let result = chain
            .execute(context(Some(json!(1))), |_ctx| async move {
                panic!("Handler should not be called");
            })
            .await;

        assert_eq!(result.unwrap(), json!("short-circuited"));
    }

    #[tokio::test]
    async fn test_middleware_rejects_call() {
        let mut chain = MiddlewareChain::new();
        chain.add_sync(DenyNotifications);

        let result = chain
            .execute(context(None), |_ctx| async move {
                panic!("Handler should not be called");
            })
            .await;

        match result {
            Err(Error::Api(api)) => assert_eq!(api.code, 403),
            other => panic!("Expected Api error, got {other:?}"),
        }

        let result = chain
            .execute(context(Some(json!("a"))), |_ctx| async move { Ok(Value::Null) })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_middleware_error_passes_through() {
        let mut chain = MiddlewareChain::new();
        chain.add_sync(TestMiddleware::new("test"));

        let result = chain
            .execute(context(Some(json!(1))), |_ctx| async move {
                Err(Error::internal("test error"))
            })
            .await;

        assert!(matches!(result, Err(Error::Internal(_))));
    }

    struct Impersonate;

    impl SyncMiddleware for Impersonate {
        fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction> {
            ctx.context.insert("user", json!("admin"));
            Ok(MiddlewareAction::Continue)
        }

        fn post_handle(&self, _ctx: &mut MiddlewareContext, _result: &Result<Value>) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_middleware_extends_context() {
        let mut chain = MiddlewareChain::new();
        chain.add_sync(Impersonate);

        let ctx = context(Some(json!(1))).with_context(CallContext::new().with("peer", json!("local")));
        let result = chain
            .execute(ctx, |ctx| async move { Ok(ctx.context.to_value()) })
            .await;

        assert_eq!(result.unwrap(), json!({"peer": "local", "user": "admin"}));
    }

    #[tokio::test]
    async fn test_tracing_middleware() {
        let middleware = TracingMiddleware::new();
        let mut ctx = context(Some(json!(7)));

        let action = middleware.pre_handle(&mut ctx).await.unwrap();
        assert!(matches!(action, MiddlewareAction::Continue));

        middleware.post_handle(&mut ctx, &Ok(json!("success"))).await.unwrap();
        middleware
            .post_handle(&mut ctx, &Err(Error::api(1, "failed")))
            .await
            .unwrap();
    }
}
