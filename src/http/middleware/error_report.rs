//! Error reporting middleware.
//!
//! Handlers and the panic catcher attach an [`ErrorReport`] to the 500
//! response they produce; this middleware takes it off the response and logs
//! it on the application channel with the request context. The response sent
//! to the client does not depend on what logging or notification does.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::response::ErrorReport;
use crate::http::server::AppState;
use crate::logging::Metadata;

pub async fn error_report_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut context = Metadata::new()
        .with("method", request.method().as_str())
        .with("path", request.uri().path());
    if let Some(id) = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
    {
        context.insert("request_id", id);
    }

    let mut response = next.run(request).await;

    if let Some(report) = response.extensions_mut().remove::<ErrorReport>() {
        state
            .logger
            .error(report.event, report.options.with_meta(context));
    }
    response
}
