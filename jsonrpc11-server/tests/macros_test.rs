//! `#[method]` attribute tests

use jsonrpc11_core::{ApiError, Result};
use jsonrpc11_macros::method;
use jsonrpc11_server::{Dispatcher, MethodRegistry, MethodSpec};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Deserialize)]
struct LookupParams {
    id: u64,
}

#[derive(Serialize)]
struct Entry {
    id: u64,
    value: String,
}

#[method]
async fn ping() -> Result<&'static str> {
    Ok("pong")
}

#[method(name = "entry.get")]
async fn get_entry(params: LookupParams) -> Result<Entry> {
    if params.id == 1 {
        return Ok(Entry {
            id: 1,
            value: "first".into(),
        });
    }
    Err(ApiError::new(100, "Entry not found")
        .with_data(json!({"id": params.id}))
        .into())
}

#[method]
async fn add((a, b): (i64, i64)) -> Result<i64> {
    Ok(a + b)
}

async fn call(dispatcher: &Dispatcher, request: Value) -> Value {
    let reply = dispatcher.call(&request.to_string()).await.unwrap();
    serde_json::from_str(&reply).unwrap()
}

fn dispatcher() -> Dispatcher {
    Dispatcher::builder()
        .named(ping())
        .named(get_entry())
        .named(add())
        .build()
        .unwrap()
}

#[test]
fn test_generated_names() {
    assert_eq!(ping().name(), "ping");
    assert_eq!(get_entry().name(), "entry.get");
    assert_eq!(dispatcher().methods(), vec!["add", "entry.get", "ping"]);
}

#[tokio::test]
async fn test_method_without_params() {
    let reply = call(&dispatcher(), json!({"version": "1.1", "method": "ping", "id": 1})).await;
    assert_eq!(reply["result"], "pong");
}

#[tokio::test]
async fn test_named_params_method() {
    let dispatcher = dispatcher();

    let reply = call(
        &dispatcher,
        json!({"version": "1.1", "method": "entry.get", "params": {"id": 1}, "id": 1}),
    )
    .await;
    assert_eq!(reply["result"], json!({"id": 1, "value": "first"}));

    let reply = call(
        &dispatcher,
        json!({"version": "1.1", "method": "entry.get", "params": {"id": 9}, "id": 2}),
    )
    .await;
    assert_eq!(reply["error"]["code"], 100);
    assert_eq!(reply["error"]["data"], json!({"id": 9}));
}

#[tokio::test]
async fn test_positional_params_method() {
    let reply = call(
        &dispatcher(),
        json!({"version": "1.1", "method": "add", "params": [40, 2], "id": 1}),
    )
    .await;
    assert_eq!(reply["result"], 42);
}

#[tokio::test]
async fn test_wrong_params_are_invalid() {
    let reply = call(
        &dispatcher(),
        json!({"version": "1.1", "method": "add", "params": ["a", "b"], "id": 1}),
    )
    .await;
    assert_eq!(reply["error"]["code"], -32602);
}

#[test]
fn test_registry_add_and_spec() {
    let mut registry = MethodRegistry::new();
    registry.add(ping()).unwrap();
    assert!(registry.add(ping()).is_err());

    let spec = MethodSpec::named(add()).params_schema(json!({"type": "array"}));
    registry.register(spec).unwrap();

    assert_eq!(registry.methods(), vec!["add", "ping"]);
}
