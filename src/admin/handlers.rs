use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::config::validation::{validate_handler, ValidationError};
use crate::config::HandlerConfig;
use crate::handlers::ResponseHandler;
use crate::http::server::AppState;
use crate::routing::{HandlerId, Outcome};

/// Errors returned by the admin API.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("handler {0} is not registered")]
    NotFound(HandlerId),

    #[error("no active handler named '{0}'")]
    NameNotFound(String),

    #[error("invalid handler: {}", join(.0))]
    Invalid(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = match self {
            AdminError::NotFound(_) | AdminError::NameNotFound(_) => StatusCode::NOT_FOUND,
            AdminError::Invalid(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct PatternStatus {
    pub pattern: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub code: i32,
}

#[derive(Debug, Serialize)]
pub struct HandlerStatus {
    pub id: HandlerId,
    pub name: Option<String>,
    pub rank: i32,
    pub patterns: Vec<PatternStatus>,
}

#[derive(Debug, Serialize)]
pub struct RouteEntry {
    pub pattern: String,
    pub handler_id: HandlerId,
    /// Waiting handlers in failover order.
    pub shadowed: Vec<HandlerId>,
}

fn handler_status(state: &AppState, id: HandlerId) -> Option<HandlerStatus> {
    let record = state.registry.status_of(id)?;
    let handler = state.registry.handler(id)?;
    let config = handler.config();
    Some(HandlerStatus {
        id,
        name: config.name.clone(),
        rank: config.rank,
        patterns: record
            .iter()
            .map(|(pattern, outcome)| PatternStatus {
                pattern: pattern.to_string(),
                outcome,
                code: outcome.code(),
            })
            .collect(),
    })
}

pub async fn get_status(State(state): State<AppState>) -> Json<Vec<HandlerStatus>> {
    let statuses = state
        .registry
        .status()
        .into_keys()
        .filter_map(|id| handler_status(&state, id))
        .collect();
    Json(statuses)
}

pub async fn get_routes(State(state): State<AppState>) -> Json<Vec<RouteEntry>> {
    let mut shadowed = state.registry.shadowed();
    let routes = state
        .registry
        .mappings()
        .into_iter()
        .map(|(pattern, handler_id)| RouteEntry {
            shadowed: shadowed.remove(&pattern).unwrap_or_default(),
            pattern,
            handler_id,
        })
        .collect();
    Json(routes)
}

pub async fn get_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, AdminError> {
    let handler = state
        .registry
        .resolve_by_name(&name)
        .ok_or(AdminError::NameNotFound(name.clone()))?;
    Ok(Json(serde_json::json!({ "name": name, "handler_id": handler.config().id })))
}

pub async fn add_handler(
    State(state): State<AppState>,
    Json(config): Json<HandlerConfig>,
) -> Result<(StatusCode, Json<HandlerStatus>), AdminError> {
    validate_handler(&config).map_err(AdminError::Invalid)?;
    let id = HandlerId(config.id);
    state.registry.add(Arc::new(ResponseHandler::new(config)));

    let status = handler_status(&state, id).ok_or(AdminError::NotFound(id))?;
    Ok((StatusCode::CREATED, Json(status)))
}

pub async fn remove_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AdminError> {
    let id = HandlerId(id);
    if !state.registry.is_registered(id) {
        return Err(AdminError::NotFound(id));
    }
    state.registry.remove(id);
    Ok(StatusCode::NO_CONTENT)
}
