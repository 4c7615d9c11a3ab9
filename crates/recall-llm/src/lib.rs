//! # recall-llm
//!
//! The generation step behind the memory layer: a prompt goes in, text comes
//! out, or the call fails. Backends implement [`Generator`].

pub mod provider;
pub mod gemini;
pub mod mock;

pub use provider::{GenerationSettings, Generator};
pub use gemini::GeminiGenerator;
pub use mock::{MockGenerator, MockReply};
