//! Surface B: stdio tool protocol
//!
//! Reads newline-delimited JSON-RPC 2.0 requests from stdin and writes one
//! JSON-RPC 2.0 response per request to stdout. Exposes three named tools:
//! `evaluate_action`, `get_recent_decisions`, `get_risk_profile`. No streaming.

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, warn};

use sentinel_core::ProposedAction;

use crate::state::AppState;

#[derive(Deserialize)]
struct ToolCall {
    jsonrpc: String,
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

/// Runs the stdio tool loop until stdin closes.
pub async fn run(state: AppState) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ToolCall>(&line) {
            Ok(call) => dispatch(&state, call).await,
            Err(err) => {
                warn!(%err, "malformed tool call on stdin");
                json!({
                    "jsonrpc": "2.0",
                    "id": Value::Null,
                    "error": { "code": -32700, "message": format!("parse error: {err}") },
                })
            }
        };

        let mut payload = serde_json::to_vec(&response)?;
        payload.push(b'\n');
        if let Err(err) = stdout.write_all(&payload).await {
            error!(%err, "failed writing tool response to stdout");
            break;
        }
        stdout.flush().await?;
    }

    Ok(())
}

async fn dispatch(state: &AppState, call: ToolCall) -> Value {
    if call.jsonrpc != "2.0" {
        return error_response(call.id, -32600, "jsonrpc must be \"2.0\"");
    }

    match call.method.as_str() {
        "evaluate_action" => evaluate_action(state, call.id, call.params).await,
        "get_recent_decisions" => get_recent_decisions(state, call.id, call.params),
        "get_risk_profile" => get_risk_profile(state, call.id, call.params),
        other => error_response(call.id, -32601, &format!("unknown tool: {other}")),
    }
}

async fn evaluate_action(state: &AppState, id: Value, params: Value) -> Value {
    let action: ProposedAction = match serde_json::from_value(params) {
        Ok(action) => action,
        Err(err) => return error_response(id, -32602, &format!("invalid proposed action: {err}")),
    };

    match state.facade.evaluate_action(&action).await {
        Ok(verdict) => ok_response(id, json!(verdict)),
        Err(err) => error_response(id, -32000, &err.to_string()),
    }
}

#[derive(Deserialize)]
struct RecentParams {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    20
}

fn get_recent_decisions(state: &AppState, id: Value, params: Value) -> Value {
    let parsed: RecentParams = if params.is_null() {
        RecentParams { limit: default_limit() }
    } else {
        match serde_json::from_value(params) {
            Ok(p) => p,
            Err(err) => return error_response(id, -32602, &format!("invalid params: {err}")),
        }
    };

    let limit = parsed.limit.clamp(1, 100);
    ok_response(id, json!(state.facade.get_recent_decisions(limit)))
}

#[derive(Deserialize)]
struct RiskProfileParams {
    agent_name: String,
}

fn get_risk_profile(state: &AppState, id: Value, params: Value) -> Value {
    let parsed: RiskProfileParams = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(err) => return error_response(id, -32602, &format!("invalid params: {err}")),
    };

    match state.facade.get_risk_profile(&parsed.agent_name) {
        Some(record) => ok_response(id, json!(record)),
        None => error_response(id, -32001, "unknown agent"),
    }
}

fn ok_response(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}
