//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load resources → Start reloader → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Server drains, reloader exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Trigger resource reload
//! ```
//!
//! # Design Decisions
//! - Fail fast: a startup error is fatal
//! - Listener binds last (traffic only once a snapshot exists)

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
