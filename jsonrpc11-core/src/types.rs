//! JSON-RPC 1.1 envelope types
//!
//! This module implements the request and response envelopes of JSON-RPC 1.1,
//! the dialect that marks every envelope with `"version": "1.1"` instead of
//! the 2.0 `"jsonrpc"` member.
//!
//! # Message Types
//!
//! 1. **Request**: a call (has an `id`) or a notification (no `id`)
//! 2. **Response**: the answer to a call, carrying either `result` or `error`
//! 3. **Reply**: what a dispatch hands back to the transport, a single
//!    response or the responses of a batch
//!
//! # Request IDs
//!
//! The `id` is opaque: any JSON value is accepted and echoed back unchanged.
//! An explicit `null` id is the same as an absent one, which makes the
//! request a notification.

use crate::error::{Error, ErrorObject, Result};
use crate::mapper::map_failure;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Protocol version marker carried by every envelope
pub const VERSION: &str = "1.1";

/// Shape of a parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamShape {
    /// Either shape is accepted
    Any,
    /// An ordered sequence of values
    Positional,
    /// A mapping of names to values
    Named,
}

impl std::fmt::Display for ParamShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamShape::Any => write!(f, "any"),
            ParamShape::Positional => write!(f, "positional"),
            ParamShape::Named => write!(f, "named"),
        }
    }
}

/// Parameter set of a request
///
/// Serialized untagged: positional parameters are a JSON array, named
/// parameters a JSON object.
///
/// # Examples
///
/// ```rust
/// use jsonrpc11_core::{Params, ParamShape};
/// use serde_json::json;
///
/// let params: Params = serde_json::from_value(json!([1, 2])).unwrap();
/// assert_eq!(params.shape(), ParamShape::Positional);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

impl Params {
    /// Interpret a raw `params` member
    ///
    /// `null` means no parameters. Anything other than an array or an object
    /// is an invalid request.
    pub fn from_value(value: Value) -> Result<Option<Params>> {
        match value {
            Value::Null => Ok(None),
            Value::Array(items) => Ok(Some(Params::Positional(items))),
            Value::Object(map) => Ok(Some(Params::Named(map))),
            other => Err(Error::InvalidRequest(format!(
                "'params' must be an array or an object, got {}",
                json_type(&other)
            ))),
        }
    }

    pub fn shape(&self) -> ParamShape {
        match self {
            Params::Positional(_) => ParamShape::Positional,
            Params::Named(_) => ParamShape::Named,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Params::Positional(items) => items.is_empty(),
            Params::Named(map) => map.is_empty(),
        }
    }

    /// Positional values, if this is a positional set
    pub fn positional(&self) -> Option<&[Value]> {
        match self {
            Params::Positional(items) => Some(items),
            Params::Named(_) => None,
        }
    }

    /// Named values, if this is a named set
    pub fn named(&self) -> Option<&Map<String, Value>> {
        match self {
            Params::Named(map) => Some(map),
            Params::Positional(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Params::Positional(items) => Value::Array(items.clone()),
            Params::Named(map) => Value::Object(map.clone()),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Params::Positional(items) => Value::Array(items),
            Params::Named(map) => Value::Object(map),
        }
    }
}

impl From<Vec<Value>> for Params {
    fn from(items: Vec<Value>) -> Self {
        Params::Positional(items)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params::Named(map)
    }
}

/// JSON-RPC 1.1 request envelope
///
/// A request with an `id` is a *call* and gets exactly one response. A
/// request without one is a *notification* and never gets a response.
///
/// Build outgoing requests with [`Request::call`] or
/// [`Request::notification`]; validate incoming ones with
/// [`Request::from_value`].
///
/// # Examples
///
/// ```rust
/// use jsonrpc11_core::{Params, Request};
/// use serde_json::json;
///
/// let call = Request::call("add", Some(Params::from(vec![json!(1), json!(2)])), json!(7));
/// assert!(!call.is_notification());
///
/// let notif = Request::notification("ping", None);
/// assert!(notif.is_notification());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Always "1.1"
    pub version: String,
    /// Name of the remote method
    pub method: String,
    /// Parameter set; `None` when absent or empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    /// Opaque request identifier; `None` marks a notification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl Request {
    /// Create a call (a request expecting a response)
    ///
    /// A `null` id produces a notification, matching how the id is read on
    /// the way in.
    pub fn call(method: impl Into<String>, params: Option<Params>, id: impl Into<Value>) -> Self {
        let id = id.into();
        Self {
            version: VERSION.to_string(),
            method: method.into(),
            params,
            id: (!id.is_null()).then_some(id),
        }
    }

    /// Create a notification (no id, no response)
    pub fn notification(method: impl Into<String>, params: Option<Params>) -> Self {
        Self {
            version: VERSION.to_string(),
            method: method.into(),
            params,
            id: None,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Best-effort extraction of the id from a raw, possibly malformed envelope
    ///
    /// Used to address error responses for envelopes that fail validation.
    pub fn id_of(raw: &Value) -> Option<Value> {
        raw.get("id").filter(|id| !id.is_null()).cloned()
    }

    /// Check the envelope rules on an already built request
    ///
    /// Requests built by [`Request::from_value`] always pass; this guards
    /// values assembled by hand through the public fields.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRequest` for a version other than `"1.1"` or an
    /// empty method name.
    pub fn validate(&self) -> Result<()> {
        if self.version != VERSION {
            return Err(Error::InvalidRequest(format!(
                "unsupported version \"{}\", expected \"{VERSION}\"",
                self.version
            )));
        }
        if self.method.is_empty() {
            return Err(Error::InvalidRequest("'method' must not be empty".into()));
        }
        Ok(())
    }

    /// Validate a decoded envelope and build a request from it
    ///
    /// # Validation
    ///
    /// - the envelope must be a JSON object
    /// - `version` must be the string `"1.1"`
    /// - `method` must be a non-empty string
    /// - `params`, if present and not null, must be an array or an object;
    ///   an empty one is treated as no parameters
    ///
    /// Unknown members are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRequest` describing the first violation found.
    pub fn from_value(raw: Value) -> Result<Self> {
        let mut envelope = match raw {
            Value::Object(map) => map,
            other => {
                return Err(Error::InvalidRequest(format!(
                    "request must be a JSON object, got {}",
                    json_type(&other)
                )))
            }
        };

        match envelope.remove("version") {
            Some(Value::String(version)) if version == VERSION => {}
            Some(Value::String(version)) => {
                return Err(Error::InvalidRequest(format!(
                    "unsupported version \"{version}\", expected \"{VERSION}\""
                )))
            }
            Some(other) => {
                return Err(Error::InvalidRequest(format!(
                    "'version' must be a string, got {}",
                    json_type(&other)
                )))
            }
            None => return Err(Error::InvalidRequest("missing 'version' member".into())),
        }

        let method = match envelope.remove("method") {
            Some(Value::String(method)) if !method.is_empty() => method,
            Some(Value::String(_)) => {
                return Err(Error::InvalidRequest("'method' must not be empty".into()))
            }
            Some(other) => {
                return Err(Error::InvalidRequest(format!(
                    "'method' must be a string, got {}",
                    json_type(&other)
                )))
            }
            None => return Err(Error::InvalidRequest("missing 'method' member".into())),
        };

        let params = match envelope.remove("params") {
            Some(raw_params) => Params::from_value(raw_params)?.filter(|p| !p.is_empty()),
            None => None,
        };

        let id = envelope.remove("id").filter(|id| !id.is_null());

        Ok(Self {
            version: VERSION.to_string(),
            method,
            params,
            id,
        })
    }
}

/// Either the result or the error of a response, never both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(ErrorObject),
}

/// JSON-RPC 1.1 response envelope
///
/// The `outcome` is flattened into the envelope, so the wire form carries
/// exactly one of `result` or `error`:
///
/// ```json
/// {"version": "1.1", "result": 3, "id": 1}
/// {"version": "1.1", "error": {"name": "JSONRPCError", "code": -32601, "message": "Method not found"}, "id": 2}
/// ```
///
/// `id` is omitted when the request's id could not be determined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Always "1.1"
    pub version: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    /// The id of the originating request, echoed verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl Response {
    /// Create a success response
    pub fn success(result: Value, id: Option<Value>) -> Self {
        Self {
            version: VERSION.to_string(),
            outcome: Outcome::Result(result),
            id,
        }
    }

    /// Create an error response from a ready error object
    pub fn error(error: ErrorObject, id: Option<Value>) -> Self {
        Self {
            version: VERSION.to_string(),
            outcome: Outcome::Error(error),
            id,
        }
    }

    /// Create an error response from a failure, via the error mapper
    pub fn failure(failure: Error, id: Option<Value>) -> Self {
        Self::error(map_failure(failure), id)
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Result(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&ErrorObject> {
        match &self.outcome {
            Outcome::Error(error) => Some(error),
            Outcome::Result(_) => None,
        }
    }
}

/// Output of a dispatch that produced something to send back
///
/// Serialized untagged: a single response is an object, a batch an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Batch(Vec<Response>),
    Single(Response),
}

impl Reply {
    pub fn is_batch(&self) -> bool {
        matches!(self, Reply::Batch(_))
    }

    /// All responses, in order
    pub fn responses(&self) -> &[Response] {
        match self {
            Reply::Batch(responses) => responses,
            Reply::Single(response) => std::slice::from_ref(response),
        }
    }

    pub fn into_responses(self) -> Vec<Response> {
        match self {
            Reply::Batch(responses) => responses,
            Reply::Single(response) => vec![response],
        }
    }

    /// The response of a single (non-batch) dispatch
    pub fn as_single(&self) -> Option<&Response> {
        match self {
            Reply::Single(response) => Some(response),
            Reply::Batch(_) => None,
        }
    }
}

/// JSON type name used in diagnostics
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invalid_request_message(raw: Value) -> String {
        match Request::from_value(raw) {
            Err(Error::InvalidRequest(message)) => message,
            other => panic!("Expected InvalidRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_hand_built_request() {
        assert!(Request::call("add", None, 1).validate().is_ok());

        let mut request = Request::call("add", None, 1);
        request.version = "2.0".into();
        assert!(matches!(request.validate(), Err(Error::InvalidRequest(m)) if m.contains("2.0")));

        let request = Request::notification("", None);
        assert!(matches!(request.validate(), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_request_serialization() {
        let req = Request::call("test", None, 1);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, json!({"version": "1.1", "method": "test", "id": 1}));
    }

    #[test]
    fn test_notification_serialization() {
        let notif = Request::notification("notify", None);
        let json = serde_json::to_string(&notif).unwrap();
        assert!(json.contains("\"version\":\"1.1\""));
        assert!(!json.contains("\"id\""));
    }

    #[test]
    fn test_null_id_call_is_notification() {
        assert!(Request::call("x", None, Value::Null).is_notification());
    }

    #[test]
    fn test_from_value_accepts_call() {
        let req = Request::from_value(json!({
            "version": "1.1",
            "method": "add",
            "params": [1, 2],
            "id": "abc"
        }))
        .unwrap();

        assert_eq!(req.method, "add");
        assert_eq!(req.params, Some(Params::Positional(vec![json!(1), json!(2)])));
        assert_eq!(req.id, Some(json!("abc")));
    }

    #[test]
    fn test_from_value_opaque_id_kept_verbatim() {
        let id = json!({"session": 3, "seq": [1, 2]});
        let req = Request::from_value(json!({"version": "1.1", "method": "m", "id": id.clone()}))
            .unwrap();
        assert_eq!(req.id, Some(id));
    }

    #[test]
    fn test_from_value_null_id_is_notification() {
        let req = Request::from_value(json!({"version": "1.1", "method": "m", "id": null})).unwrap();
        assert!(req.is_notification());
    }

    #[test]
    fn test_from_value_empty_params_are_absent() {
        let req = Request::from_value(json!({"version": "1.1", "method": "m", "params": []})).unwrap();
        assert!(req.params.is_none());

        let req = Request::from_value(json!({"version": "1.1", "method": "m", "params": {}})).unwrap();
        assert!(req.params.is_none());

        let req =
            Request::from_value(json!({"version": "1.1", "method": "m", "params": null})).unwrap();
        assert!(req.params.is_none());
    }

    #[test]
    fn test_from_value_rejects_wrong_version() {
        let message = invalid_request_message(json!({"version": "2.0", "method": "m", "id": 1}));
        assert!(message.contains("2.0"));

        let message = invalid_request_message(json!({"jsonrpc": "2.0", "method": "m", "id": 1}));
        assert!(message.contains("version"));

        let message = invalid_request_message(json!({"version": 1.1, "method": "m", "id": 1}));
        assert!(message.contains("must be a string"));
    }

    #[test]
    fn test_from_value_rejects_bad_method() {
        assert!(invalid_request_message(json!({"version": "1.1", "id": 1})).contains("method"));
        assert!(invalid_request_message(json!({"version": "1.1", "method": "", "id": 1}))
            .contains("empty"));
        assert!(invalid_request_message(json!({"version": "1.1", "method": 5, "id": 1}))
            .contains("number"));
    }

    #[test]
    fn test_from_value_rejects_scalar_params() {
        let message =
            invalid_request_message(json!({"version": "1.1", "method": "m", "params": "x"}));
        assert!(message.contains("params"));
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        assert!(invalid_request_message(json!(42)).contains("number"));
        assert!(invalid_request_message(json!([1])).contains("array"));
    }

    #[test]
    fn test_id_of_malformed_envelope() {
        assert_eq!(Request::id_of(&json!({"id": 9, "version": "0"})), Some(json!(9)));
        assert_eq!(Request::id_of(&json!({"id": null})), None);
        assert_eq!(Request::id_of(&json!("not an object")), None);
    }

    #[test]
    fn test_response_success_wire_form() {
        let resp = Response::success(json!({"status": "ok"}), Some(json!(1)));
        assert!(resp.is_success());
        assert!(!resp.is_error());
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"version": "1.1", "result": {"status": "ok"}, "id": 1})
        );
    }

    #[test]
    fn test_response_null_result_is_still_a_result() {
        let resp = Response::success(Value::Null, Some(json!(1)));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, json!({"version": "1.1", "result": null, "id": 1}));
    }

    #[test]
    fn test_response_error_wire_form() {
        let resp = Response::failure(Error::InvalidRequest("bad".into()), None);
        assert!(resp.is_error());

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["error"]["code"], -32600);
        assert!(json.get("result").is_none());
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_reply_serialization() {
        let single = Reply::Single(Response::success(json!(1), Some(json!(1))));
        assert!(serde_json::to_string(&single).unwrap().starts_with('{'));

        let batch = Reply::Batch(vec![
            Response::success(json!(1), Some(json!(1))),
            Response::success(json!(2), Some(json!(2))),
        ]);
        assert!(serde_json::to_string(&batch).unwrap().starts_with('['));
        assert_eq!(batch.responses().len(), 2);
        assert!(batch.as_single().is_none());
    }
}
