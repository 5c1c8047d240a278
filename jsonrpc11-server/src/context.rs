//! Per-call context supplied by the caller of a dispatch
//!
//! A transport often knows things about a call that are not part of the
//! request: the authenticated user, the peer address, a connection id. It
//! hands them to [`Dispatcher::dispatch_with`](crate::Dispatcher::dispatch_with)
//! or [`Dispatcher::call_with`](crate::Dispatcher::call_with) as a
//! [`CallContext`], and every entry of that dispatch sees the same values:
//! middleware through [`MiddlewareContext::context`](crate::MiddlewareContext),
//! handlers through [`Handler::handle_with_context`](crate::Handler).
//!
//! The dispatcher never interprets the values.
//!
//! # Examples
//!
//! ```rust
//! use jsonrpc11_server::CallContext;
//! use serde_json::json;
//!
//! let ctx = CallContext::new()
//!     .with("user", json!("alice"))
//!     .with("peer", json!("10.0.0.7:5120"));
//!
//! assert_eq!(ctx.get("user"), Some(&json!("alice")));
//! assert!(ctx.get("token").is_none());
//! ```

use serde_json::{Map, Value};
use std::sync::Arc;

/// Values shared by every entry of one dispatch
///
/// Cheap to clone; the values are copied only when a clone is modified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallContext {
    values: Arc<Map<String, Value>>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        Arc::make_mut(&mut self.values).insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The values as a JSON object
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.as_ref().clone())
    }
}

impl From<Map<String, Value>> for CallContext {
    fn from(values: Map<String, Value>) -> Self {
        Self {
            values: Arc::new(values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clones_do_not_share_writes() {
        let base = CallContext::new().with("user", json!("alice"));
        let mut copy = base.clone();
        copy.insert("role", json!("admin"));

        assert!(base.get("role").is_none());
        assert_eq!(copy.get("user"), Some(&json!("alice")));
        assert_eq!(copy.to_value(), json!({"user": "alice", "role": "admin"}));
    }

    #[test]
    fn test_from_map() {
        let mut values = Map::new();
        values.insert("peer".into(), json!("local"));

        let ctx = CallContext::from(values);
        assert!(!ctx.is_empty());
        assert!(CallContext::new().is_empty());
    }
}
