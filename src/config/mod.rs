//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! resource file (YAML/TOML/JSON)
//!     → loader.rs (read & deserialize into RawResources)
//!     → store.rs (extract default subject, build Snapshot)
//!     → ArcSwap<Snapshot> shared with the resolver
//!
//! On reload tick / SIGHUP / file change:
//!     reloader.rs receives the trigger
//!     → store.rs reloads through loader.rs
//!     → atomic swap of Arc<Snapshot> on success
//!     → previous snapshot kept on failure
//!
//! server settings (TOML, optional)
//!     → loader.rs (parse)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (immutable for the process lifetime)
//! ```
//!
//! # Design Decisions
//! - Snapshots are immutable; a reload always builds a whole new table
//! - All settings have defaults to allow running with no settings file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod reloader;
pub mod schema;
pub mod store;
pub mod validation;
pub mod watcher;

pub use loader::{
    ConfigError, FileSource, RawResources, ResourceSource, SettingsError, StaticSource,
};
pub use reloader::{ConfigReloader, ReloadTrigger};
pub use schema::ServerConfig;
pub use schema::{HttpConfig, ListenerConfig, ObservabilityConfig, ResourcesConfig};
pub use store::{AttributeSet, ConfigStore, Snapshot};
