//! Fixed-response handler.
//!
//! # Responsibilities
//! - Serve a configured status, content type and body
//! - Load `body_file` on activation and drop it on disposal
//!
//! # Design Decisions
//! - `init` reports problems as failure reasons instead of panicking:
//!   bad status → `ValidationFailed`, unreadable file → `ExceptionOnInit`
//! - `dispose` is idempotent; a disposed handler answers 503 until it is
//!   initialized again

use std::fs;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use parking_lot::RwLock;

use crate::config::HandlerConfig;
use crate::routing::{FailureReason, Handler, HandlerId, PathResolution};

pub const X_HANDLER_ID: &str = "x-handler-id";
pub const X_MATCHED_PATTERN: &str = "x-matched-pattern";
pub const X_SERVLET_PATH: &str = "x-servlet-path";
pub const X_PATH_INFO: &str = "x-path-info";

/// Handler answering every request with the same response.
#[derive(Debug)]
pub struct ResponseHandler {
    config: HandlerConfig,
    body: RwLock<Option<Bytes>>,
}

impl ResponseHandler {
    pub fn new(config: HandlerConfig) -> Self {
        Self {
            config,
            body: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// True between a successful `init` and the next `dispose`.
    pub fn is_live(&self) -> bool {
        self.body.read().is_some()
    }

    /// Build the response for a request resolved to this handler.
    pub fn respond(&self, resolution: &PathResolution<ResponseHandler>) -> Response {
        let Some(body) = self.body.read().clone() else {
            return (StatusCode::SERVICE_UNAVAILABLE, "Handler not available").into_response();
        };
        let status = StatusCode::from_u16(self.config.status).unwrap_or(StatusCode::OK);

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        if let Ok(v) = HeaderValue::from_str(&self.config.content_type) {
            headers.insert(header::CONTENT_TYPE, v);
        }
        headers.insert(X_HANDLER_ID, HeaderValue::from(self.config.id));
        let pairs = [
            (X_MATCHED_PATTERN, Some(resolution.pattern())),
            (X_SERVLET_PATH, Some(resolution.servlet_path.as_str())),
            (X_PATH_INFO, resolution.path_info.as_deref()),
        ];
        for (name, value) in pairs {
            if let Some(v) = value.and_then(|v| HeaderValue::from_str(v).ok()) {
                headers.insert(name, v);
            }
        }
        response
    }

    fn load_body(&self) -> Result<Bytes, FailureReason> {
        match &self.config.body_file {
            Some(path) => fs::read(path).map(Bytes::from).map_err(|e| {
                tracing::warn!(handler_id = self.config.id, path = %path, error = %e, "Failed to read body file");
                FailureReason::ExceptionOnInit
            }),
            None => Ok(Bytes::from(self.config.body.clone().unwrap_or_default())),
        }
    }
}

impl Handler for ResponseHandler {
    fn id(&self) -> HandlerId {
        HandlerId(self.config.id)
    }

    fn patterns(&self) -> Option<&[String]> {
        Some(&self.config.patterns)
    }

    fn name(&self) -> Option<&str> {
        self.config.name.as_deref()
    }

    fn rank(&self) -> i32 {
        self.config.rank
    }

    fn init(&self) -> Result<(), FailureReason> {
        if StatusCode::from_u16(self.config.status).is_err() {
            return Err(FailureReason::ValidationFailed);
        }
        let body = self.load_body()?;
        *self.body.write() = Some(body);
        Ok(())
    }

    fn dispose(&self) {
        if self.body.write().take().is_some() {
            tracing::debug!(handler_id = self.config.id, "Response handler disposed");
        }
    }
}
