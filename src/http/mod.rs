//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, query parameters)
//!     → resolver engine
//!     → response.rs (status, headers, body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, WebFingerParams, X_REQUEST_ID};
pub use server::{AppState, HttpServer, WEBFINGER_PATH};
