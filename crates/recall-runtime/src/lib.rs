//! # recall-runtime
//!
//! Wires the memory layer together for one query: store → ranker → composer →
//! generator. Storage failures propagate to the caller; generation failures
//! come back as a [`Reply::Failed`] so a bad model call never takes the
//! stored memories down with it.

pub mod factory;
pub mod session;

pub use factory::{build_generator, open_store};
pub use session::{Comparison, MemorySession, PreparedPrompt, Reply, SessionOptions, Turn};
