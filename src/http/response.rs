//! Failure responses.
//!
//! # Responsibilities
//! - Turn handler errors and panics into a generic 500 response
//! - Carry the error to the reporting middleware in a response extension
//!
//! # Design Decisions
//! - The body never leaks error details: `{"error":"Internal Server Error"}`
//! - Whether the error escalates is decided where it is raised

use std::any::Any;
use std::error::Error;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::logging::{ErrorEvent, ErrorOptions};

/// Error travelling from a handler to the reporting middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub event: ErrorEvent,
    pub options: ErrorOptions,
}

/// Handler error. Renders as a generic 500 and is logged by the
/// error-reporting middleware.
#[derive(Debug)]
pub struct AppError {
    source: Box<dyn Error + Send + Sync>,
    notify: bool,
}

impl AppError {
    /// Do not escalate this error to the notifier.
    pub fn quiet(mut self) -> Self {
        self.notify = false;
        self
    }
}

impl<E> From<E> for AppError
where
    E: Into<Box<dyn Error + Send + Sync>>,
{
    fn from(err: E) -> Self {
        Self {
            source: err.into(),
            notify: true,
        }
    }
}

fn internal_error(report: ErrorReport) -> Response {
    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal Server Error" })),
    )
        .into_response();
    response.extensions_mut().insert(report);
    response
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        internal_error(ErrorReport {
            event: ErrorEvent::from_error(&*self.source),
            options: ErrorOptions::notify(self.notify),
        })
    }
}

/// Panic handler for `CatchPanicLayer`.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    internal_error(ErrorReport {
        event: ErrorEvent::new(format!("Handler panicked: {}", detail)),
        options: ErrorOptions::default(),
    })
}
