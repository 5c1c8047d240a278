//! Error mapper: failure conditions to wire error objects
//!
//! JSON-RPC 1.1 leaves error codes undefined, so this crate borrows the
//! JSON-RPC 2.0 allocation:
//!
//! | Kind             | Code              | Default message    |
//! |------------------|-------------------|--------------------|
//! | ParseError       | -32700            | Parse error        |
//! | InvalidRequest   | -32600            | Invalid Request    |
//! | MethodNotFound   | -32601            | Method not found   |
//! | InvalidParams    | -32602            | Invalid params     |
//! | InternalError    | -32603            | Internal error     |
//! | ServerError      | -32099 ..= -32000 | Server error       |
//! | ApplicationError | 0 ..= 999         | API error          |
//!
//! Protocol kinds always use the fixed default message; the specifics of the
//! failure go into `data`. Application and server errors keep the message the
//! handler supplied, provided their code lies in the legal band.

use crate::error::{
    Error, ErrorObject, API_ERROR_NAME, APPLICATION_CODES, SERVER_ERROR_CODES,
};
use serde_json::{json, Value};

/// Kinds of failure in the error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ServerError,
    ApplicationError,
}

impl ErrorKind {
    /// The code used when this kind is synthesized by the dispatcher
    pub const fn default_code(self) -> i32 {
        match self {
            ErrorKind::ParseError => -32700,
            ErrorKind::InvalidRequest => -32600,
            ErrorKind::MethodNotFound => -32601,
            ErrorKind::InvalidParams => -32602,
            ErrorKind::InternalError => -32603,
            ErrorKind::ServerError => -32000,
            ErrorKind::ApplicationError => 1,
        }
    }

    pub const fn default_message(self) -> &'static str {
        match self {
            ErrorKind::ParseError => "Parse error",
            ErrorKind::InvalidRequest => "Invalid Request",
            ErrorKind::MethodNotFound => "Method not found",
            ErrorKind::InvalidParams => "Invalid params",
            ErrorKind::InternalError => "Internal error",
            ErrorKind::ServerError => "Server error",
            ErrorKind::ApplicationError => "API error",
        }
    }

    /// Classify a wire code, `None` for codes outside every band
    pub fn of(code: i32) -> Option<Self> {
        match code {
            -32700 => Some(ErrorKind::ParseError),
            -32600 => Some(ErrorKind::InvalidRequest),
            -32601 => Some(ErrorKind::MethodNotFound),
            -32602 => Some(ErrorKind::InvalidParams),
            -32603 => Some(ErrorKind::InternalError),
            c if SERVER_ERROR_CODES.contains(&c) => Some(ErrorKind::ServerError),
            c if APPLICATION_CODES.contains(&c) => Some(ErrorKind::ApplicationError),
            _ => None,
        }
    }

    /// Build the standard error object for this kind
    pub fn object(self) -> ErrorObject {
        ErrorObject::new(self.default_code(), self.default_message())
    }

    /// Build the standard error object for this kind with detail
    pub fn object_with(self, data: Value) -> ErrorObject {
        ErrorObject::with_data(self.default_code(), self.default_message(), data)
    }
}

/// Kind a failure is reported as, before range checks on explicit codes
pub fn kind_of(failure: &Error) -> ErrorKind {
    match failure {
        Error::Parse(_) => ErrorKind::ParseError,
        Error::InvalidRequest(_) | Error::BatchSizeExceeded { .. } => ErrorKind::InvalidRequest,
        Error::MethodNotFound { .. } => ErrorKind::MethodNotFound,
        Error::InvalidParams(_) | Error::ParamsViolation(_) => ErrorKind::InvalidParams,
        Error::Api(api) if api.is_in_range() => ErrorKind::ApplicationError,
        Error::Server(server) if server.is_in_range() => ErrorKind::ServerError,
        _ => ErrorKind::InternalError,
    }
}

/// Translate a failure into the error object placed in a response
///
/// # Examples
///
/// ```rust
/// use jsonrpc11_core::{map_failure, ApiError, Error};
///
/// let obj = map_failure(ApiError::new(100, "Entry not found").into());
/// assert_eq!(obj.code, 100);
/// assert_eq!(obj.name, "APIError");
///
/// // Out-of-band application codes are a contract violation
/// let obj = map_failure(Error::api(5000, "too big"));
/// assert_eq!(obj.code, -32603);
/// ```
pub fn map_failure(failure: Error) -> ErrorObject {
    match failure {
        Error::Parse(message) => ErrorKind::ParseError.object_with(json!({ "message": message })),
        Error::InvalidRequest(message) => {
            ErrorKind::InvalidRequest.object_with(json!({ "message": message }))
        }
        Error::BatchSizeExceeded { limit, actual } => ErrorKind::InvalidRequest.object_with(json!({
            "message": "Batch size limit exceeded",
            "limit": limit,
            "actual": actual,
        })),
        Error::MethodNotFound { method, mut available } => {
            available.sort();
            ErrorKind::MethodNotFound.object_with(json!({
                "method": method,
                "available_methods": available,
            }))
        }
        Error::InvalidParams(message) => {
            ErrorKind::InvalidParams.object_with(json!({ "message": message }))
        }
        Error::ParamsViolation(violation) => ErrorKind::InvalidParams.object_with(violation.to_value()),
        Error::ResultViolation(violation) => ErrorKind::InternalError.object_with(json!({
            "message": "Result failed validation",
            "violation": violation.to_value(),
        })),
        Error::Api(api) if api.is_in_range() => ErrorObject {
            name: API_ERROR_NAME.to_string(),
            code: api.code,
            message: api.message,
            data: api.data,
        },
        Error::Api(api) => out_of_band(api.code, "application", &APPLICATION_CODES),
        Error::Server(server) if server.is_in_range() => ErrorObject {
            data: server.data,
            ..ErrorObject::new(server.code, server.message)
        },
        Error::Server(server) => out_of_band(server.code, "server", &SERVER_ERROR_CODES),
        other => ErrorKind::InternalError.object_with(json!({ "message": other.to_string() })),
    }
}

/// Wire code a failure will be reported with
///
/// Always the code [`map_failure`] puts in the error object.
pub fn code_of(failure: &Error) -> i32 {
    map_failure(failure.clone()).code
}

fn out_of_band(code: i32, band: &str, legal: &std::ops::RangeInclusive<i32>) -> ErrorObject {
    ErrorKind::InternalError.object_with(json!({
        "message": format!(
            "{band} error code {code} is outside the legal range {}..={}",
            legal.start(),
            legal.end()
        ),
        "bad_code": code,
    }))
}

impl From<Error> for ErrorObject {
    fn from(failure: Error) -> Self {
        map_failure(failure)
    }
}
