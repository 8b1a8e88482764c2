//! Dashboard REST surface: read-only collateral queries over the Audit Log
//! and Agent Registry.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/evaluations", get(list_evaluations))
        .route("/api/evaluations/aggregate", get(evaluations_aggregate))
        .route("/api/evaluations/:id", get(get_evaluation))
        .route("/api/metrics", get(metrics))
        .route("/api/resources/:id/risk", get(resource_risk))
        .route("/api/agents", get(list_agents))
        .route("/api/agents/:name/history", get(agent_history))
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(20).clamp(1, 100)
}

async fn list_evaluations(State(state): State<AppState>, Query(q): Query<LimitQuery>) -> impl IntoResponse {
    let limit = clamp_limit(q.limit);
    Json(state.facade.get_recent_decisions(limit))
}

async fn get_evaluation(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.facade.get_decision(&id) {
        Some(verdict) => Json(verdict).into_response(),
        None => not_found("evaluation"),
    }
}

/// Decision counts, composite min/avg/max, per-dimension averages, top
/// violations, and most-evaluated resources across the Audit Log.
async fn evaluations_aggregate(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.facade.aggregate())
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics_handle.render()
}

async fn resource_risk(State(state): State<AppState>, Path(id): Path<String>, Query(q): Query<LimitQuery>) -> impl IntoResponse {
    let limit = clamp_limit(q.limit);
    Json(state.facade.get_resource_history(&id, limit))
}

async fn list_agents(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.facade.list_agents())
}

async fn agent_history(State(state): State<AppState>, Path(name): Path<String>, Query(q): Query<LimitQuery>) -> Response {
    match state.facade.get_risk_profile(&name) {
        Some(_) => {
            let limit = clamp_limit(q.limit);
            Json(state.facade.get_agent_history(&name, limit)).into_response()
        }
        None => not_found("agent"),
    }
}

fn not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": format!("{what} not found") }))).into_response()
}
