//! Schema validation tests

use jsonrpc11_core::{Error, ParamShape, SchemaViolation};
use jsonrpc11_server::{
    from_fn, from_typed_fn, AcceptAll, BatchMode, Dispatcher, MethodSpec, Schema, SchemaValidator,
};
use serde_json::{json, Value};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Validator backed by a remote schema store that can go away
#[derive(Default)]
struct RemoteStore {
    offline: AtomicBool,
}

impl SchemaValidator for RemoteStore {
    fn validate(&self, _schema: &Value, _value: &Value) -> Result<(), SchemaViolation> {
        Ok(())
    }

    fn check_schema(&self, _schema: &Value) -> Result<(), String> {
        if self.offline.load(Ordering::SeqCst) {
            return Err("schema store unreachable".into());
        }
        Ok(())
    }
}

/// Validator that panics on values containing `"explode"`
struct Fragile;

impl SchemaValidator for Fragile {
    fn validate(&self, _schema: &Value, value: &Value) -> Result<(), SchemaViolation> {
        if value.to_string().contains("explode") {
            panic!("validator exploded");
        }
        Ok(())
    }
}

fn positional_numbers() -> Value {
    json!({
        "type": "array",
        "items": {"type": "number"},
        "minItems": 2,
        "maxItems": 2
    })
}

fn dispatcher() -> Dispatcher {
    Dispatcher::builder()
        .method(
            MethodSpec::new("add", from_typed_fn(|(a, b): (f64, f64)| async move { Ok(a + b) }))
                .accepts(ParamShape::Positional)
                .params_schema(positional_numbers())
                .result_schema(json!({"type": "number"})),
        )
        .method(
            MethodSpec::new("lies", from_fn(|_| async { Ok(json!("not a number")) }))
                .result_schema(json!({"type": "number"})),
        )
        .method(
            MethodSpec::new("ping", from_fn(|_| async { Ok(json!("pong")) }))
                .params_schema(Schema::Absent),
        )
        .method(
            MethodSpec::new("fire", from_fn(|_| async { Ok(Value::Null) }))
                .result_schema(Schema::Absent),
        )
        .method(
            MethodSpec::new("chatty", from_fn(|_| async { Ok(json!({"said": "hello"})) }))
                .result_schema(Schema::Absent),
        )
        .method(
            MethodSpec::new("greet", from_fn(|_| async { Ok(json!("hi")) }))
                .accepts(ParamShape::Named)
                .params_schema(json!({
                    "type": "object",
                    "properties": {"name": {"type": "string"}},
                    "required": ["name"]
                })),
        )
        .build()
        .unwrap()
}

async fn call(dispatcher: &Dispatcher, request: Value) -> Value {
    let reply = dispatcher.call(&request.to_string()).await.unwrap();
    serde_json::from_str(&reply).unwrap()
}

#[tokio::test]
async fn test_valid_params_and_result() {
    let reply = call(
        &dispatcher(),
        json!({"version": "1.1", "method": "add", "params": [1.5, 2], "id": 1}),
    )
    .await;
    assert_eq!(reply["result"], 3.5);
}

#[tokio::test]
async fn test_params_violation() {
    let reply = call(
        &dispatcher(),
        json!({"version": "1.1", "method": "add", "params": [1, "two"], "id": 1}),
    )
    .await;

    let error = &reply["error"];
    assert_eq!(error["code"], -32602);
    assert_eq!(error["message"], "Invalid params");
    assert_eq!(error["data"]["path"], "/1");
    assert_eq!(error["data"]["value"], "two");
    assert!(error["data"]["message"].as_str().unwrap().contains("number"));
}

#[tokio::test]
async fn test_params_violation_on_count() {
    let reply = call(
        &dispatcher(),
        json!({"version": "1.1", "method": "add", "params": [1, 2, 3], "id": 1}),
    )
    .await;
    assert_eq!(reply["error"]["code"], -32602);
}

#[tokio::test]
async fn test_missing_params_for_declared_schema() {
    let reply = call(&dispatcher(), json!({"version": "1.1", "method": "add", "id": 1})).await;

    assert_eq!(reply["error"]["code"], -32602);
    assert_eq!(
        reply["error"]["data"]["message"],
        "Method declares parameters, but none were provided"
    );
}

#[tokio::test]
async fn test_params_for_absent_schema() {
    let dispatcher = dispatcher();

    let reply = call(&dispatcher, json!({"version": "1.1", "method": "ping", "id": 1})).await;
    assert_eq!(reply["result"], "pong");

    // Empty params count as none
    let reply = call(
        &dispatcher,
        json!({"version": "1.1", "method": "ping", "params": {}, "id": 2}),
    )
    .await;
    assert_eq!(reply["result"], "pong");

    let reply = call(
        &dispatcher,
        json!({"version": "1.1", "method": "ping", "params": [1], "id": 3}),
    )
    .await;
    assert_eq!(reply["error"]["code"], -32602);
    assert_eq!(
        reply["error"]["data"]["message"],
        "Method declares no parameters, but some were provided"
    );
}

#[tokio::test]
async fn test_result_violation_is_internal_error() {
    let reply = call(&dispatcher(), json!({"version": "1.1", "method": "lies", "id": 1})).await;

    assert_eq!(reply["error"]["code"], -32603);
    assert_eq!(reply["error"]["data"]["violation"]["value"], "not a number");
    assert!(reply.get("result").is_none());
}

#[tokio::test]
async fn test_absent_result_schema() {
    let dispatcher = dispatcher();

    let reply = call(&dispatcher, json!({"version": "1.1", "method": "fire", "id": 1})).await;
    assert_eq!(reply["result"], Value::Null);

    let reply = call(&dispatcher, json!({"version": "1.1", "method": "chatty", "id": 2})).await;
    assert_eq!(reply["error"]["code"], -32603);
    assert_eq!(
        reply["error"]["data"]["violation"]["message"],
        "Method declares no result, but returned a value"
    );
}

#[tokio::test]
async fn test_shape_mismatch() {
    let dispatcher = dispatcher();

    let reply = call(
        &dispatcher,
        json!({"version": "1.1", "method": "add", "params": {"a": 1, "b": 2}, "id": 1}),
    )
    .await;
    assert_eq!(reply["error"]["code"], -32602);
    assert_eq!(
        reply["error"]["data"]["message"],
        "method 'add' accepts positional parameters, got named"
    );

    let reply = call(
        &dispatcher,
        json!({"version": "1.1", "method": "greet", "params": ["bob"], "id": 2}),
    )
    .await;
    assert_eq!(reply["error"]["code"], -32602);

    let reply = call(
        &dispatcher,
        json!({"version": "1.1", "method": "greet", "params": {"name": "bob"}, "id": 3}),
    )
    .await;
    assert_eq!(reply["result"], "hi");
}

#[test]
fn test_schema_that_does_not_compile_fails_build() {
    let result = Dispatcher::builder()
        .method(
            MethodSpec::new("odd", from_fn(|_| async { Ok(json!(1)) }))
                .params_schema(json!({"type": "not-a-type"})),
        )
        .build();

    match result {
        Err(Error::Schema(message)) => {
            assert!(message.starts_with("params schema of method 'odd'"));
            assert!(message.contains("schema does not compile"));
        }
        other => panic!("Expected Schema error, got {other:?}"),
    }
}

#[test]
fn test_uncompilable_schema_file_fails_build() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("odd.result.json"), r#"{"minimum": "zero"}"#).unwrap();

    let result = Dispatcher::builder()
        .handler("odd", from_fn(|_| async { Ok(json!(1)) }))
        .schema_dir(dir.path())
        .build();

    assert!(matches!(
        result,
        Err(Error::Schema(message)) if message.contains("result schema of method 'odd'")
    ));
}

#[tokio::test]
async fn test_schema_unusable_at_dispatch_is_internal_error() {
    let store = Arc::new(RemoteStore::default());
    let dispatcher = Dispatcher::builder()
        .method(
            MethodSpec::new("echo", from_fn(|_| async { Ok(json!("ok")) }))
                .params_schema(json!({"type": "array"})),
        )
        .validator(store.clone())
        .build()
        .unwrap();
    let request = json!({"version": "1.1", "method": "echo", "params": [1], "id": 1});

    let reply = call(&dispatcher, request.clone()).await;
    assert_eq!(reply["result"], "ok");

    store.offline.store(true, Ordering::SeqCst);
    let reply = call(&dispatcher, request).await;
    assert_eq!(reply["error"]["code"], -32603);
    assert!(reply["error"]["data"]["message"]
        .as_str()
        .unwrap()
        .contains("schema store unreachable"));
}

#[test]
fn test_custom_validator_rejecting_schema_fails_build() {
    let store = RemoteStore::default();
    store.offline.store(true, Ordering::SeqCst);

    let result = Dispatcher::builder()
        .method(
            MethodSpec::new("echo", from_fn(|_| async { Ok(json!("ok")) }))
                .result_schema(json!({"type": "string"})),
        )
        .validator(Arc::new(store))
        .build();
    assert!(matches!(result, Err(Error::Schema(_))));
}

#[tokio::test]
async fn test_validator_panic_fails_only_its_entry() {
    let dispatcher = Dispatcher::builder()
        .method(
            MethodSpec::new("echo", from_typed_fn(|(value,): (Value,)| async move { Ok(value) }))
                .params_schema(json!({"type": "array"})),
        )
        .validator(Arc::new(Fragile))
        .batch_mode(BatchMode::Sequential)
        .build()
        .unwrap();

    let batch = json!([
        {"version": "1.1", "method": "echo", "params": ["calm"], "id": 1},
        {"version": "1.1", "method": "echo", "params": ["explode"], "id": 2},
        {"version": "1.1", "method": "echo", "params": ["calm"], "id": 3}
    ]);
    let reply = call(&dispatcher, batch).await;
    let responses = reply.as_array().unwrap();

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["result"], "calm");
    assert_eq!(responses[1]["error"]["code"], -32603);
    assert_eq!(responses[1]["id"], 2);
    assert_eq!(responses[2]["result"], "calm");
}

#[tokio::test]
async fn test_accept_all_validator() {
    let dispatcher = Dispatcher::builder()
        .method(
            MethodSpec::new("add", from_typed_fn(|(a, b): (f64, f64)| async move { Ok(a + b) }))
                .params_schema(json!({"type": "array", "maxItems": 0})),
        )
        .validator(Arc::new(AcceptAll))
        .build()
        .unwrap();

    let reply = call(
        &dispatcher,
        json!({"version": "1.1", "method": "add", "params": [1, 2], "id": 1}),
    )
    .await;
    assert_eq!(reply["result"], 3.0);
}

#[tokio::test]
async fn test_schema_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("add.params.json"),
        positional_numbers().to_string(),
    )
    .unwrap();
    fs::write(dir.path().join("add.result.json"), r#"{"type": "integer"}"#).unwrap();
    fs::write(dir.path().join("ping.params.json"), "  \n").unwrap();
    fs::write(dir.path().join("README.md"), "not a schema").unwrap();

    let dispatcher = Dispatcher::builder()
        .handler("add", from_typed_fn(|(a, b): (f64, f64)| async move { Ok(a + b) }))
        .handler("ping", from_fn(|_| async { Ok(json!("pong")) }))
        .schema_dir(dir.path())
        .build()
        .unwrap();

    let spec = dispatcher.registry().get("add").unwrap();
    assert!(spec.declared_params().is_some());
    assert!(dispatcher.registry().get("ping").unwrap().declared_params().unwrap().is_absent());

    let reply = call(
        &dispatcher,
        json!({"version": "1.1", "method": "add", "params": [1, "x"], "id": 1}),
    )
    .await;
    assert_eq!(reply["error"]["code"], -32602);

    // 1.5 + 1 is not an integer
    let reply = call(
        &dispatcher,
        json!({"version": "1.1", "method": "add", "params": [1.5, 1], "id": 2}),
    )
    .await;
    assert_eq!(reply["error"]["code"], -32603);

    let reply = call(
        &dispatcher,
        json!({"version": "1.1", "method": "ping", "params": [1], "id": 3}),
    )
    .await;
    assert_eq!(reply["error"]["code"], -32602);
}

#[tokio::test]
async fn test_explicit_schema_wins_over_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("echo.params.json"), r#"{"type": "object"}"#).unwrap();

    let dispatcher = Dispatcher::builder()
        .method(
            MethodSpec::new("echo", from_fn(|_| async { Ok(json!("ok")) }))
                .params_schema(json!({"type": "array"})),
        )
        .schema_dir(dir.path())
        .build()
        .unwrap();

    let reply = call(
        &dispatcher,
        json!({"version": "1.1", "method": "echo", "params": [1], "id": 1}),
    )
    .await;
    assert_eq!(reply["result"], "ok");
}

#[test]
fn test_invalid_schema_file_fails_build() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.params.json"), "{ nope").unwrap();

    let result = Dispatcher::builder().schema_dir(dir.path()).build();
    assert!(matches!(result, Err(Error::Schema(_))));
}
