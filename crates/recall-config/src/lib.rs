//! # recall-config
//!
//! Configuration for the Recall memory layer. Reads from `recall.toml`, then
//! applies environment variable overrides. CLI flags are layered on top by
//! the caller.

pub mod schema;
pub mod loader;

pub use schema::RecallConfig;
pub use schema::{
    ConfigWarning, GenerationConfig, LoggingConfig, MemoryConfig, WarningSeverity,
    DEFAULT_USER,
};
pub use loader::ConfigLoader;
