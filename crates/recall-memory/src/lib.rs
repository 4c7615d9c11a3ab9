//! # recall-memory
//!
//! Long-term memory for a conversational agent:
//!
//! - **Store**: durable, append-only JSON collections of conversation records
//!   and memory facts, scoped by user id.
//! - **Ranker**: keyword-overlap scoring of a user's memories against a query.
//! - **Composer**: folds ranked memories and the query into one generation payload.
//!
//! Every store operation re-reads its collection from disk and rewrites it
//! atomically, so callers always observe the latest committed state.

pub mod composer;
pub mod lock;
pub mod ranker;
pub mod record;
pub mod store;

pub use composer::compose;
pub use ranker::{DEFAULT_SEARCH_LIMIT, ScoredMemory, rank};
pub use record::{ConversationRecord, MemoryRecord};
pub use store::{MemoryStore, StoreConfig, StoreStats};
