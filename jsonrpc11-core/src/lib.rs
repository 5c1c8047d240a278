//! Core JSON-RPC 1.1 types, error taxonomy and codec for jsonrpc11
//!
//! This crate holds everything about JSON-RPC 1.1 that does not involve
//! running handlers:
//!
//! - **Types**: request and response envelopes, parameter sets, replies
//! - **Errors**: the failure conditions handlers and the dispatcher raise,
//!   and the wire-format error object
//! - **Mapper**: the translation from failures to error codes
//! - **Codec**: text decoding and encoding for transports
//! - **Observability**: tracing subscriber and OpenTelemetry setup
//!
//! # Protocol
//!
//! JSON-RPC 1.1 envelopes carry `"version": "1.1"`. A request without an
//! `id` is a notification and never receives a response. Error codes follow
//! the JSON-RPC 2.0 allocation, with `0..=999` reserved for application
//! errors.
//!
//! The crate is transport-agnostic: `jsonrpc11-server` builds the method
//! registry and dispatcher on top of it, and whatever carries the bytes
//! (HTTP, a socket, standard streams) lives outside both.
//!
//! # Example
//!
//! ```rust
//! use jsonrpc11_core::{codec, Request, Response};
//! use serde_json::json;
//!
//! let request = codec::decode_request(r#"{"version":"1.1","method":"add","params":[5,3],"id":1}"#).unwrap();
//! assert_eq!(request.method, "add");
//!
//! let response = Response::success(json!(8), request.id);
//! let text = codec::encode_response(&response).unwrap();
//! assert_eq!(text, r#"{"version":"1.1","result":8,"id":1}"#);
//! ```

pub mod codec;
pub mod error;
pub mod mapper;
pub mod observability;
pub mod types;

pub use error::{
    ApiError, Error, ErrorObject, Result, SchemaViolation, ServerError, API_ERROR_NAME,
    APPLICATION_CODES, JSONRPC_ERROR_NAME, SERVER_ERROR_CODES,
};
pub use mapper::{code_of, kind_of, map_failure, ErrorKind};
pub use observability::{init_observability, shutdown_observability, LogFormat, ObservabilityConfig};
pub use types::{json_type, Outcome, ParamShape, Params, Reply, Request, Response, VERSION};
