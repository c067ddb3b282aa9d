//! Dual-channel structured logging with rotating files and failure
//! notification, plus the small HTTP bootstrap that feeds it.

pub mod config;
pub mod escalation;
pub mod http;
pub mod lifecycle;
pub mod logging;
pub mod notify;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use logging::{ErrorEvent, ErrorOptions, Logger};
