//! Codec for JSON-RPC 1.1 message text
//!
//! The dispatcher works on already-decoded JSON values, which keeps it
//! independent of any particular transport. This module holds the small
//! amount of glue a transport needs on either side of it:
//!
//! - **Decoding**: text to [`serde_json::Value`], with failures reported as
//!   [`Error::Parse`] so they map to `-32700`
//! - **Encoding**: replies and envelopes back to text
//! - **Parse error responses**: the id-less `-32700` response returned for
//!   input that never became JSON
//!
//! # Examples
//!
//! ```rust
//! use jsonrpc11_core::codec;
//!
//! let value = codec::decode(r#"{"version": "1.1", "method": "ping"}"#).unwrap();
//! assert_eq!(value["method"], "ping");
//!
//! let err = codec::decode("{not json").unwrap_err();
//! let response = codec::parse_error_response(&err);
//! assert_eq!(response.error_object().unwrap().code, -32700);
//! assert!(response.id.is_none());
//! ```

use crate::error::{Error, Result};
use crate::types::{Reply, Request, Response};
use serde::Serialize;
use serde_json::Value;

/// Encode any serializable message to a JSON string
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode message text into a JSON value
///
/// No envelope validation happens here; that is the dispatcher's job, since
/// a structurally bad envelope still deserves a response addressed to its id.
///
/// # Errors
///
/// Returns `Error::Parse` if the text is not valid JSON.
pub fn decode(data: &str) -> Result<Value> {
    serde_json::from_str(data).map_err(|e| Error::Parse(e.to_string()))
}

/// Decode and validate a single request envelope
pub fn decode_request(data: &str) -> Result<Request> {
    Request::from_value(decode(data)?)
}

/// Encode a single response
pub fn encode_response(resp: &Response) -> Result<String> {
    encode(resp)
}

/// Encode a dispatch reply (an object for a single call, an array for a batch)
pub fn encode_reply(reply: &Reply) -> Result<String> {
    encode(reply)
}

/// Build the `-32700` response for input that could not be decoded
///
/// The response carries no id, since none could be read.
pub fn parse_error_response(err: &Error) -> Response {
    let detail = match err {
        Error::Parse(message) => message.clone(),
        other => other.to_string(),
    };
    Response::failure(Error::Parse(detail), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Params;
    use serde_json::json;

    #[test]
    fn test_decode_invalid_json_is_parse_error() {
        match decode(r#"{"version": "1.1", "method""#) {
            Err(Error::Parse(msg)) => assert!(!msg.is_empty()),
            other => panic!("Expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_accepts_any_json() {
        assert_eq!(decode("42").unwrap(), json!(42));
        assert_eq!(decode("[]").unwrap(), json!([]));
    }

    #[test]
    fn test_decode_request() {
        let req = decode_request(r#"{"version":"1.1","method":"sum","params":[1,2],"id":1}"#)
            .unwrap();
        assert_eq!(req.method, "sum");
        assert_eq!(req.params, Some(Params::Positional(vec![json!(1), json!(2)])));

        assert!(matches!(
            decode_request(r#"{"method":"sum"}"#),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_encode_reply_batch() {
        let reply = Reply::Batch(vec![
            Response::success(json!(3), Some(json!(1))),
            Response::failure(Error::internal("boom"), Some(json!(2))),
        ]);

        let text = encode_reply(&reply).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["result"], 3);
        assert_eq!(value[1]["error"]["code"], -32603);
    }

    #[test]
    fn test_parse_error_response_shape() {
        let response = parse_error_response(&Error::Parse("expected value".into()));
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["version"], "1.1");
        assert_eq!(value["error"]["code"], -32700);
        assert_eq!(value["error"]["message"], "Parse error");
        assert_eq!(value["error"]["data"]["message"], "expected value");
        assert!(value.get("id").is_none());
    }
}
