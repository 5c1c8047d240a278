//! In-memory database served over stdin/stdout
//!
//! Each line read from stdin is one JSON-RPC 1.1 request (or batch); each
//! reply is written to stdout on its own line. Notifications produce no
//! output. Logs go to stderr. Every call sees the transport name and its
//! input line number as call context; `origin` returns them.
//!
//! ```text
//! $ cargo run --example database
//! {"version":"1.1","method":"new","params":["apples"],"id":1}
//! {"version":"1.1","result":1,"id":1}
//! {"version":"1.1","method":"get","params":[7],"id":2}
//! {"version":"1.1","error":{"name":"APIError","code":100,"message":"Entry not found","data":{"id":7}},"id":2}
//! {"version":"1.1","method":"origin","id":3}
//! {"version":"1.1","result":{"line":3,"transport":"stdio"},"id":3}
//! ```

use jsonrpc11::core::{shutdown_observability, LogFormat, ObservabilityConfig, ParamShape};
use jsonrpc11::server::{from_context_fn, from_typed_fn, Schema, TracingMiddleware};
use jsonrpc11::{ApiError, CallContext, Dispatcher, Error, MethodSpec, Result};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

#[derive(Default)]
struct Database {
    entries: BTreeMap<u64, String>,
    last_id: u64,
}

impl Database {
    fn insert(&mut self, entry: String) -> u64 {
        self.last_id += 1;
        self.entries.insert(self.last_id, entry);
        self.last_id
    }
}

fn entry_not_found(id: u64) -> ApiError {
    ApiError::new(100, "Entry not found").with_data(json!({ "id": id }))
}

#[jsonrpc11::method(name = "version")]
async fn database_version() -> Result<&'static str> {
    Ok(env!("CARGO_PKG_VERSION"))
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(Mutex::new(Database::default()));

    // Registered below under the name "new"
    let add = {
        let db = Arc::clone(&db);
        from_typed_fn(move |(entry,): (String,)| {
            let db = Arc::clone(&db);
            async move { Ok(db.lock().await.insert(entry)) }
        })
    };

    let get = {
        let db = Arc::clone(&db);
        from_typed_fn(move |(id,): (u64,)| {
            let db = Arc::clone(&db);
            async move {
                let db = db.lock().await;
                match db.entries.get(&id) {
                    Some(entry) => Ok(entry.clone()),
                    None => Err(Error::from(entry_not_found(id))),
                }
            }
        })
    };

    let search = {
        let db = Arc::clone(&db);
        from_typed_fn(move |(query,): (String,)| {
            let db = Arc::clone(&db);
            async move {
                let db = db.lock().await;
                let hits: Vec<(u64, String)> = db
                    .entries
                    .iter()
                    .filter(|(_, value)| value.contains(&query))
                    .map(|(key, value)| (*key, value.clone()))
                    .collect();
                Ok(hits)
            }
        })
    };

    let origin = from_context_fn(|_, ctx| async move { Ok(ctx.to_value()) });

    let one_string = json!({
        "type": "array",
        "items": {"type": "string"},
        "minItems": 1,
        "maxItems": 1
    });

    let dispatcher = Dispatcher::builder()
        .method(
            MethodSpec::new("new", add)
                .accepts(ParamShape::Positional)
                .params_schema(one_string.clone())
                .result_schema(json!({"type": "integer", "minimum": 1})),
        )
        .method(
            MethodSpec::new("get", get)
                .accepts(ParamShape::Positional)
                .params_schema(json!({
                    "type": "array",
                    "items": {"type": "integer", "minimum": 0},
                    "minItems": 1,
                    "maxItems": 1
                })),
        )
        .method(
            MethodSpec::new("search", search)
                .accepts(ParamShape::Positional)
                .params_schema(one_string),
        )
        .method(MethodSpec::new("origin", origin).params_schema(Schema::Absent))
        .named(database_version())
        .use_middleware(Arc::new(TracingMiddleware::new()))
        .with_observability(
            ObservabilityConfig::new("database-demo")
                .with_traces(false)
                .with_metrics(false)
                .with_log_format(LogFormat::Compact),
        )
        .build()?;

    tracing::info!(methods = ?dispatcher.methods(), "Database demo reading requests from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    let mut line_number: u64 = 0;
    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }

        let ctx = CallContext::new()
            .with("transport", json!("stdio"))
            .with("line", json!(line_number));
        if let Some(reply) = dispatcher.call_with(&line, ctx).await {
            stdout.write_all(reply.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    shutdown_observability();
    Ok(())
}
