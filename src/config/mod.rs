//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (literal or JSON file)
//!     → loader.rs (read & deserialize)
//!     → schema.rs builtin runtime defaults merged underneath
//!     → store.rs (persisted document merged on top)
//!     → Settings handle, shared by the controller and the CLI
//!
//! On read:
//!     env.rs override (get_or_env only) → store snapshot → caller default
//!
//! On write:
//!     path.rs edit on a copy → persist to disk → atomic swap of the snapshot
//! ```
//!
//! # Design Decisions
//! - Settings are addressed by dot-paths into one JSON document
//! - Reads never block writers; writers are serialized
//! - Runtime keys are validated on read and fall back to defaults

pub mod env;
pub mod error;
pub mod loader;
pub mod path;
pub mod schema;
pub mod store;
pub mod validation;

pub use error::ConfigError;
pub use loader::{InfoSource, SettingsSource};
pub use schema::ProgramInfo;
pub use store::Settings;
