//! Request middleware.

pub mod access_log;
pub mod error_report;

pub use access_log::{access_log_middleware, AccessEntry};
pub use error_report::error_report_middleware;
