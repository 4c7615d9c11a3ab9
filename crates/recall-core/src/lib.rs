//! # recall-core
//!
//! Shared vocabulary for the Recall workspace: the unified error type and the
//! role-tagged chat message used by both the memory store and the generators.

pub mod error;
pub mod message;

pub use error::{RecallError, Result};
pub use message::ChatMessage;
