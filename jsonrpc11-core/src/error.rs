//! Error types for jsonrpc11
//!
//! This module holds both sides of the error story:
//!
//! - **Error**: the internal failure condition raised while handling a call
//!   (uses thiserror). Handlers return it, the dispatcher synthesizes it.
//! - **ErrorObject**: the wire-format error placed in a response envelope.
//!
//! `Error` values become `ErrorObject`s through the error mapper in
//! [`crate::mapper`], which assigns the JSON-RPC 2.0 derived codes.
//!
//! # Application and server errors
//!
//! Handler code has two explicit ways to fail with a caller-visible code:
//!
//! - [`ApiError`]: an application error with a code in the `0..=999` band
//! - [`ServerError`]: a server-side fault in the reserved `-32099..=-32000` band
//!
//! Anything else a handler returns is reported as an internal error.
//!
//! # Examples
//!
//! ```rust
//! use jsonrpc11_core::{ApiError, Error};
//! use serde_json::json;
//!
//! let err: Error = ApiError::new(100, "Entry not found")
//!     .with_data(json!({"id": 5}))
//!     .into();
//! assert!(matches!(err, Error::Api(_)));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

/// Result type for jsonrpc11 operations
pub type Result<T> = std::result::Result<T, Error>;

/// Codes an application error may legally carry
pub const APPLICATION_CODES: RangeInclusive<i32> = 0..=999;

/// Reserved band for implementation-defined server errors
pub const SERVER_ERROR_CODES: RangeInclusive<i32> = -32099..=-32000;

/// `name` member for protocol and server faults
pub const JSONRPC_ERROR_NAME: &str = "JSONRPCError";

/// `name` member for application errors
pub const API_ERROR_NAME: &str = "APIError";

/// Failure conditions raised while handling a JSON-RPC 1.1 call
///
/// Every variant maps onto exactly one entry of the error taxonomy; see
/// [`crate::mapper::map_failure`] for the mapping.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Input could not be decoded into JSON at all
    #[error("Parse error: {0}")]
    Parse(String),

    /// The envelope is structurally invalid (wrong version, bad method, ...)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No method with this name is registered
    #[error("Method not found: {method}")]
    MethodNotFound {
        /// The requested method name
        method: String,
        /// Names registered at the time of the lookup
        available: Vec<String>,
    },

    /// Parameters were rejected without a schema diagnostic
    /// (shape mismatch, failed deserialization, missing params)
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Parameters failed the method's params schema
    #[error("Params failed validation: {0}")]
    ParamsViolation(SchemaViolation),

    /// The handler's return value failed the method's result schema
    #[error("Result failed validation: {0}")]
    ResultViolation(SchemaViolation),

    /// Application error explicitly raised by a handler
    #[error("Application error: {0}")]
    Api(#[from] ApiError),

    /// Server fault explicitly raised by a handler
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// Unexpected failure inside a handler
    #[error("Internal error: {0}")]
    Internal(String),

    /// Running the call panicked, in the handler or around it
    #[error("Call panicked: {0}")]
    Panic(String),

    /// Conversion between Rust types and JSON failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A method name was registered twice
    #[error("Method already registered: {0}")]
    DuplicateMethod(String),

    /// A schema document could not be loaded or compiled
    #[error("Invalid schema: {0}")]
    Schema(String),

    /// Filesystem failure (schema directories)
    #[error("IO error: {0}")]
    Io(String),

    /// The batch holds more entries than the configured limit
    #[error("Batch size limit exceeded: limit={limit}, actual={actual}")]
    BatchSizeExceeded {
        /// The maximum allowed batch size
        limit: usize,
        /// The size of the rejected batch
        actual: usize,
    },
}

impl Error {
    /// Shorthand for raising an application error
    pub fn api(code: i32, message: impl Into<String>) -> Self {
        Error::Api(ApiError::new(code, message))
    }

    /// Shorthand for raising a server error in the reserved band
    pub fn server(code: i32, message: impl Into<String>) -> Self {
        Error::Server(ServerError::new(code, message))
    }

    /// Shorthand for an unexpected handler failure
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

/// Application error raised by handler code
///
/// The code must lie in [`APPLICATION_CODES`]; an out-of-range code is a
/// contract violation and is reported to the caller as an internal error.
///
/// # Examples
///
/// ```rust
/// use jsonrpc11_core::ApiError;
/// use serde_json::json;
///
/// let err = ApiError::new(100, "Notification not found with id 5")
///     .with_data(json!({"id": 5}));
/// assert!(err.is_in_range());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Caller-meaningful code in `0..=999`
    pub code: i32,
    /// Short human-readable message
    pub message: String,
    /// Optional structured payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach a structured payload
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Whether the code lies in the application band
    pub fn is_in_range(&self) -> bool {
        APPLICATION_CODES.contains(&self.code)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Server-side fault raised explicitly by handler code
///
/// Unlike [`ApiError`], this signals a problem with the service rather than
/// with the caller's request. The code must lie in [`SERVER_ERROR_CODES`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerError {
    /// Code in `-32099..=-32000`
    pub code: i32,
    /// Short human-readable message
    pub message: String,
    /// Optional structured payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ServerError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// A server error with the generic `-32000` code
    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(*SERVER_ERROR_CODES.end(), message)
    }

    /// Attach a structured payload
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Whether the code lies in the reserved server band
    pub fn is_in_range(&self) -> bool {
        SERVER_ERROR_CODES.contains(&self.code)
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ServerError {}

/// Diagnostic produced by a schema validator
///
/// Carried verbatim in the `data` member of an `Invalid params` error so the
/// caller can see which part of their input was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaViolation {
    /// What the validator complained about
    pub message: String,
    /// Location of the offending value inside the validated document
    pub path: String,
    /// Location of the failing keyword inside the schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_path: Option<String>,
    /// The offending value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl SchemaViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: String::new(),
            schema_path: None,
            value: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_schema_path(mut self, schema_path: impl Into<String>) -> Self {
        self.schema_path = Some(schema_path.into());
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Render the violation as a JSON object for the `data` member
    pub fn to_value(&self) -> Value {
        let mut data = Map::new();
        data.insert("message".into(), Value::String(self.message.clone()));
        data.insert("path".into(), Value::String(self.path.clone()));
        if let Some(schema_path) = &self.schema_path {
            data.insert("schema_path".into(), Value::String(schema_path.clone()));
        }
        if let Some(value) = &self.value {
            data.insert("value".into(), value.clone());
        }
        Value::Object(data)
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} (at {})", self.message, self.path)
        }
    }
}

/// JSON-RPC 1.1 error object as placed in a response envelope
///
/// # Wire format
///
/// ```json
/// {"name": "JSONRPCError", "code": -32601, "message": "Method not found",
///  "data": {"method": "nope", "available_methods": ["add"]}}
/// ```
///
/// `name` is `"JSONRPCError"` for protocol and server faults and `"APIError"`
/// for errors raised by application code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Error object name required by JSON-RPC 1.1
    pub name: String,

    /// Numeric error code from the taxonomy
    pub code: i32,

    /// Short human-readable message
    pub message: String,

    /// Optional structured detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    /// Create a protocol-level error object
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            name: JSONRPC_ERROR_NAME.to_string(),
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create a protocol-level error object with detail
    pub fn with_data(code: i32, message: impl Into<String>, data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::new(code, message)
        }
    }

    /// Whether this object reports an application error
    pub fn is_application(&self) -> bool {
        self.name == API_ERROR_NAME
    }
}

impl fmt::Display for ErrorObject {
    /// Formats as "[code] message", e.g. "[-32601] Method not found"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorObject {}
