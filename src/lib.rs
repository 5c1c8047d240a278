//! jsonrpc11 - a transport-agnostic JSON-RPC 1.1 dispatcher
//!
//! This is the convenience crate that re-exports the jsonrpc11 sub-crates.
//!
//! # Architecture
//!
//! - **jsonrpc11-core**: envelopes, error taxonomy and mapping, codec, observability
//! - **jsonrpc11-server**: handlers, method registry, schemas, dispatcher
//! - **jsonrpc11-macros**: the `#[method]` attribute
//!
//! No transport is included. Feed decoded requests to a [`Dispatcher`] and
//! send back what it returns; `demos/database.rs` shows a line-based
//! stdin/stdout transport.
//!
//! # Quick Start
//!
//! ```rust
//! use jsonrpc11::server::from_typed_fn;
//! use jsonrpc11::Dispatcher;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct AddParams { a: i32, b: i32 }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = Dispatcher::builder()
//!     .handler("add", from_typed_fn(|p: AddParams| async move { Ok(p.a + p.b) }))
//!     .build()?;
//!
//! let reply = dispatcher
//!     .call(r#"{"version": "1.1", "method": "add", "params": {"a": 5, "b": 3}, "id": 1}"#)
//!     .await;
//! assert_eq!(reply.as_deref(), Some(r#"{"version":"1.1","result":8,"id":1}"#));
//! # Ok(())
//! # }
//! ```

pub use jsonrpc11_core as core;
pub use jsonrpc11_macros as macros;
pub use jsonrpc11_server as server;

pub use jsonrpc11_core::{ApiError, Error, Request, Response, Result, ServerError};
pub use jsonrpc11_macros::method;
pub use jsonrpc11_server::{CallContext, Dispatcher, MethodSpec};
