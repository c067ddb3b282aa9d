//! HTTP bootstrap.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup)
//!     → request.rs (x-request-id assigned / propagated)
//!     → middleware/access_log.rs (combined line → Logger::http)
//!     → middleware/error_report.rs (ErrorReport → Logger::error)
//!     → handler, or response.rs on error/panic (generic 500)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{AppError, ErrorReport};
pub use server::{AppState, HttpServer};
