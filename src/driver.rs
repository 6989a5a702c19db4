//! tabweave driver: feeds coordinator commands over stdin/stdout.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"tabs.activate", "params":{"tab_id":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! UI events are pushed unprompted as {"event":"ui", "payload":{...}}.
//!
//! The coordinator runs against the in-memory backend and the headless host,
//! seeded from `TABWEAVE_SEED_URLS` (comma separated) when set.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use tabweave::app::App;
use tabweave::command::parse_command;
use tabweave::gateway::memory::InMemoryGateway;
use tabweave::host::headless::HeadlessHost;
use tabweave::runtime::CoordinatorHandle;

fn seed_gateway() -> InMemoryGateway {
    match std::env::var("TABWEAVE_SEED_URLS") {
        Ok(list) => {
            let urls: Vec<&str> = list
                .split(',')
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .collect();
            InMemoryGateway::with_tabs(&urls)
        }
        Err(_) => InMemoryGateway::new(),
    }
}

fn emit(line: Value) {
    println!("{}", line);
}

async fn handle_line(handle: &CoordinatorHandle, line: &str) -> Value {
    let req: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return json!({"id": null, "error": format!("parse error: {}", e)}),
    };

    let id = req.get("id").cloned().unwrap_or(Value::Null);
    let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
    let params = req.get("params").cloned().unwrap_or(json!({}));

    let command = match parse_command(method, &params) {
        Ok(command) => command,
        Err(e) => return json!({"id": id, "error": e}),
    };
    tracing::debug!(method = %method, command = command.name(), "driver request");

    match handle.send(command).await {
        Ok(outcome) => json!({"id": id, "result": outcome}),
        Err(e) => json!({"id": id, "error": e.to_string(), "class": e.class()}),
    }
}

#[tokio::main]
async fn main() {
    tabweave::init_logging();

    let mut app = match App::new(None) {
        Ok(app) => app,
        Err(e) => {
            tracing::warn!(error = %e, "settings unreadable, using defaults");
            App::with_settings(Default::default())
        }
    };
    let handle = app.startup(Arc::new(seed_gateway()), Arc::new(HeadlessHost::new()));

    let mut events = handle.subscribe();
    let forwarder = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => emit(json!({"event": "ui", "payload": event})),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "driver fell behind on ui events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    emit(json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        emit(handle_line(&handle, &line).await);
    }

    app.shutdown().await;
    forwarder.abort();
}
