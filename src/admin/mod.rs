//! Admin API for registration management and introspection.
//!
//! # Endpoints
//! - `GET /admin/status`: per-handler outcome for every requested pattern
//! - `GET /admin/routes`: active pattern → handler, with waiting handlers
//! - `GET /admin/names/{name}`: by-name lookup
//! - `POST /admin/handlers`: register a response handler
//! - `DELETE /admin/handlers/{id}`: unregister a handler

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(get_routes))
        .route("/admin/names/{name}", get(get_name))
        .route("/admin/handlers", post(add_handler))
        .route("/admin/handlers/{id}", delete(remove_handler))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
