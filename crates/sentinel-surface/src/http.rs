//! Surface A: streaming HTTP
//!
//! Publishes the capability card and accepts JSON-RPC 2.0 task submissions
//! whose message text is a JSON-encoded `ProposedAction`, returning either a
//! single JSON-RPC response (`tasks/sendMessage`) or a server-sent event
//! stream (`tasks/sendSubscribe`) that narrates the four evaluators before
//! the final verdict artifact.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use sentinel_core::{Error as CoreError, ProposedAction};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/.well-known/agent-card.json", get(agent_card))
        .route("/.well-known/agent.json", get(agent_card))
        .route("/", post(handle_task))
}

#[derive(Serialize)]
struct AgentCard {
    name: &'static str,
    description: &'static str,
    version: &'static str,
    url: String,
    capabilities: Capabilities,
    skills: Vec<Skill>,
}

#[derive(Serialize)]
struct Capabilities {
    streaming: bool,
}

#[derive(Serialize)]
struct Skill {
    id: &'static str,
    name: &'static str,
    description: &'static str,
}

async fn agent_card(State(state): State<AppState>) -> Json<AgentCard> {
    Json(AgentCard {
        name: "sentinel-governance",
        description: "Scores proposed infrastructure actions against blast radius, policy, historical precedent, and cost, then approves, escalates, or denies them",
        version: env!("CARGO_PKG_VERSION"),
        url: state.config.core.server_url.clone(),
        capabilities: Capabilities { streaming: true },
        skills: vec![
            Skill {
                id: "evaluate_action",
                name: "Evaluate Action",
                description: "Scores a proposed infrastructure action and returns a governance verdict",
            },
            Skill {
                id: "query_decision_history",
                name: "Query Decision History",
                description: "Returns recent governance verdicts",
            },
            Skill {
                id: "get_resource_risk_profile",
                name: "Get Resource Risk Profile",
                description: "Returns an agent's cumulative decision history",
            },
        ],
    })
}

#[derive(Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Value,
    method: String,
    params: Value,
}

#[derive(Deserialize)]
struct TaskParams {
    message: TaskMessage,
}

#[derive(Deserialize)]
struct TaskMessage {
    parts: Vec<MessagePart>,
}

#[derive(Deserialize)]
struct MessagePart {
    text: String,
}

fn extract_action(params: Value) -> Result<ProposedAction, AppError> {
    let task_params: TaskParams = serde_json::from_value(params)
        .map_err(|e| AppError::InvalidRequest(format!("malformed task params: {e}")))?;

    let part = task_params
        .message
        .parts
        .first()
        .ok_or_else(|| AppError::InvalidRequest("message has no parts".to_string()))?;

    serde_json::from_str(&part.text)
        .map_err(|e| AppError::InvalidRequest(format!("message text is not a valid proposed action: {e}")))
}

/// The first four of the five ordered progress updates; the fifth carries
/// the composite score and decision and is emitted once the verdict is known.
const PROGRESS_UPDATES: [&str; 4] = [
    "evaluating blast radius",
    "checking policy compliance",
    "querying historical incidents",
    "calculating financial impact",
];

async fn handle_task(State(state): State<AppState>, Json(req): Json<JsonRpcRequest>) -> Result<Response, AppError> {
    match req.method.as_str() {
        "tasks/sendMessage" => {
            let permit = state
                .admission
                .try_acquire()
                .map_err(|_| AppError::RateLimited)?;

            let action = extract_action(req.params)?;
            let verdict = state.facade.evaluate_action(&action).await?;
            drop(permit);

            Ok(Json(json!({
                "jsonrpc": "2.0",
                "id": req.id,
                "result": {
                    "status": "completed",
                    "artifacts": [verdict],
                }
            }))
            .into_response())
        }
        "tasks/sendSubscribe" => {
            let permit = state
                .admission
                .try_acquire_owned()
                .map_err(|_| AppError::RateLimited)?;

            let action = extract_action(req.params)?;
            let facade = state.facade.clone();

            let progress = stream::iter(PROGRESS_UPDATES).map(|update| {
                Ok::<Event, Infallible>(Event::default().event("status").data(update))
            });

            let verdict_events = stream::once(async move {
                let _permit = permit;
                let events: Vec<Event> = match facade.evaluate_action(&action).await {
                    Ok(verdict) => {
                        info!(action_id = %verdict.action_id, decision = ?verdict.decision, "task evaluated");
                        let composite_update = format!(
                            "SRI Composite: {:.1} → {:?}",
                            verdict.sri.composite, verdict.decision
                        );
                        let artifact = Event::default()
                            .event("artifact")
                            .json_data(&verdict)
                            .unwrap_or_else(|_| Event::default().event("artifact").data("{}"));
                        vec![Event::default().event("status").data(composite_update), artifact]
                    }
                    Err(err) => {
                        warn!(%err, "task evaluation failed");
                        vec![Event::default().event("error").data(err.to_string())]
                    }
                };
                stream::iter(events.into_iter().map(Ok::<Event, Infallible>))
            })
            .flatten();

            let done_stream = stream::once(async { Ok::<Event, Infallible>(Event::default().event("task-complete").data("{}")) });

            let combined: std::pin::Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>> =
                Box::pin(progress.chain(verdict_events).chain(done_stream));

            Ok(Sse::new(combined)
                .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
                .into_response())
        }
        other => Err(AppError::InvalidRequest(format!("unknown method: {other}"))),
    }
}

/// Error handling for Surface A, rendered as JSON-RPC 2.0 error objects.
#[derive(Debug)]
pub enum AppError {
    InvalidRequest(String),
    RateLimited,
    Internal(String),
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(msg) => AppError::InvalidRequest(msg),
            CoreError::DeadlineExceeded => AppError::Internal("evaluation deadline exceeded".to_string()),
            CoreError::RateLimited => AppError::RateLimited,
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            AppError::InvalidRequest(msg) => (-32602, msg),
            AppError::RateLimited => (-32000, "too many concurrent evaluations in flight".to_string()),
            AppError::Internal(msg) => (-32603, msg),
        };

        Json(json!({
            "jsonrpc": "2.0",
            "id": Value::Null,
            "error": { "code": code, "message": message },
        }))
        .into_response()
    }
}
