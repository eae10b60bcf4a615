//! WebFinger resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Query (resource?, rel?)
//!     → engine.rs (normalize, look up in current Snapshot)
//!     → relation.rs (attribute ↔ relation URI table)
//!     → document.rs (JRD body)
//!     → Return: Resolution or ResolutionError
//! ```

pub mod document;
pub mod engine;
pub mod relation;

pub use document::{Link, WebFingerDocument};
pub use engine::{resolve, Query, Resolution, ResolutionEngine, ResolutionError};
pub use relation::Relation;
