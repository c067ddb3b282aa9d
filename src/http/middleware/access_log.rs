//! Access logging middleware.
//!
//! Renders one Apache "combined" line per request and hands it to the HTTP
//! channel:
//!
//! ```text
//! 127.0.0.1 - - [09/Mar/2024:14:05:07 +0000] "GET /health HTTP/1.1" 200 - "-" "curl/8.5.0"
//! ```

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};

use crate::http::server::AppState;
use crate::observability::metrics;

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Everything needed to render one access line.
#[derive(Debug, Clone)]
pub struct AccessEntry {
    pub remote_addr: Option<SocketAddr>,
    pub time: DateTime<Utc>,
    pub method: String,
    pub uri: String,
    pub version: String,
    pub status: u16,
    pub content_length: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

impl AccessEntry {
    /// Render in combined log format; absent fields print as `-`.
    pub fn render(&self) -> String {
        let dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        format!(
            "{} - - [{}] \"{} {} {}\" {} {} \"{}\" \"{}\"",
            self.remote_addr
                .map(|a| a.ip().to_string())
                .unwrap_or_else(|| "-".to_string()),
            self.time.format(CLF_TIME),
            self.method,
            self.uri,
            self.version,
            self.status,
            dash(&self.content_length),
            dash(&self.referrer),
            dash(&self.user_agent),
        )
    }
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Log every request on the HTTP channel after the response is produced.
pub async fn access_log_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let time = Utc::now();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let method = request.method().to_string();
    let uri = request.uri().to_string();
    let version = format!("{:?}", request.version());
    let referrer = header_value(request.headers(), header::REFERER);
    let user_agent = header_value(request.headers(), header::USER_AGENT);

    let response = next.run(request).await;

    let entry = AccessEntry {
        remote_addr,
        time,
        method,
        uri,
        version,
        status: response.status().as_u16(),
        content_length: header_value(response.headers(), header::CONTENT_LENGTH),
        referrer,
        user_agent,
    };
    metrics::record_request(&entry.method, entry.status);
    state.logger.http(entry.render());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_combined_format() {
        let entry = AccessEntry {
            remote_addr: Some("127.0.0.1:50312".parse().unwrap()),
            time: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
            method: "GET".into(),
            uri: "/health".into(),
            version: "HTTP/1.1".into(),
            status: 200,
            content_length: None,
            referrer: None,
            user_agent: Some("curl/8.5.0".into()),
        };
        assert_eq!(
            entry.render(),
            "127.0.0.1 - - [09/Mar/2024:14:05:07 +0000] \"GET /health HTTP/1.1\" 200 - \"-\" \"curl/8.5.0\""
        );
    }
}
