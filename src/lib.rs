//! WebFinger (RFC 7033) discovery server library.
//!
//! Resolves `acct:` resources against a hot-reloaded resource file and
//! serves the results at `/.well-known/webfinger`.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resolver;

pub use config::{ConfigStore, ServerConfig, Snapshot};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resolver::{Query, Resolution, ResolutionEngine, ResolutionError};
