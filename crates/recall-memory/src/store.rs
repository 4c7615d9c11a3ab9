use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use recall_core::{ChatMessage, RecallError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::lock::LocationLock;
use crate::ranker::{self, ScoredMemory};
use crate::record::{ConversationRecord, MemoryRecord};

const MEMORIES_FILE: &str = "memories.json";
const CONVERSATIONS_FILE: &str = "conversations.json";

/// Where and how a [`MemoryStore`] keeps its collections.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding both collection files.
    pub location: PathBuf,
    /// How long an operation waits for the location lock.
    pub lock_timeout: Duration,
}

impl StoreConfig {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            lock_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

/// Aggregate counts across all users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub memory_count: usize,
    pub conversation_count: usize,
    pub location: PathBuf,
}

/// File-backed store of conversation and memory records.
///
/// Each collection is one pretty-printed JSON array. Every operation takes the
/// location lock, reads the whole collection, and (for writes) replaces the file
/// via a temporary file and an atomic rename. Nothing is cached between calls.
pub struct MemoryStore {
    config: StoreConfig,
    memories_path: PathBuf,
    conversations_path: PathBuf,
}

impl MemoryStore {
    /// Open the store at `config.location`, creating empty collections as needed.
    pub fn open(config: StoreConfig) -> Result<Self> {
        info!(location = ?config.location, "opening memory store");
        let store = Self {
            memories_path: config.location.join(MEMORIES_FILE),
            conversations_path: config.location.join(CONVERSATIONS_FILE),
            config,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Ensure the location exists and both collections are present. Idempotent.
    pub fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.config.location).map_err(|source| RecallError::StorageWrite {
            path: self.config.location.clone(),
            source,
        })?;

        let _lock = self.lock()?;
        for path in [&self.memories_path, &self.conversations_path] {
            if !path.exists() {
                write_collection::<MemoryRecord>(path, &[])?;
                info!(?path, "created empty collection");
            }
        }
        Ok(())
    }

    pub fn location(&self) -> &Path {
        &self.config.location
    }

    pub fn memories_path(&self) -> &Path {
        &self.memories_path
    }

    pub fn conversations_path(&self) -> &Path {
        &self.conversations_path
    }

    fn lock(&self) -> Result<LocationLock> {
        LocationLock::acquire(&self.config.location, self.config.lock_timeout)
    }

    // ── Appends ────────────────────────────────────────────────

    /// Append a conversation. Returns its position in the full collection.
    pub fn append_conversation(
        &self,
        user_id: &str,
        messages: Vec<ChatMessage>,
        timestamp: Option<String>,
    ) -> Result<usize> {
        let record = ConversationRecord::new(user_id, messages, timestamp)?;

        let _lock = self.lock()?;
        let mut conversations: Vec<ConversationRecord> = read_collection(&self.conversations_path)?;
        conversations.push(record);
        write_collection(&self.conversations_path, &conversations)?;

        let id = conversations.len() - 1;
        debug!(user_id, id, "appended conversation");
        Ok(id)
    }

    /// Append a memory fact. Returns its position in the full collection.
    pub fn append_memory(
        &self,
        user_id: &str,
        text: &str,
        timestamp: Option<String>,
    ) -> Result<usize> {
        let record = MemoryRecord::new(user_id, text, timestamp)?;

        let _lock = self.lock()?;
        let mut memories: Vec<MemoryRecord> = read_collection(&self.memories_path)?;
        memories.push(record);
        write_collection(&self.memories_path, &memories)?;

        let id = memories.len() - 1;
        debug!(user_id, id, "appended memory");
        Ok(id)
    }

    // ── Reads ──────────────────────────────────────────────────

    /// The `limit` most recent conversations for a user, oldest first.
    pub fn list_conversations(&self, user_id: &str, limit: usize) -> Result<Vec<ConversationRecord>> {
        let _lock = self.lock()?;
        let mut conversations: Vec<ConversationRecord> = read_collection(&self.conversations_path)?;
        conversations.retain(|c| c.user_id == user_id);
        let start = conversations.len().saturating_sub(limit);
        Ok(conversations.split_off(start))
    }

    /// All memories for a user in insertion order.
    pub fn list_memories(&self, user_id: &str) -> Result<Vec<MemoryRecord>> {
        let _lock = self.lock()?;
        let mut memories: Vec<MemoryRecord> = read_collection(&self.memories_path)?;
        memories.retain(|m| m.user_id == user_id);
        Ok(memories)
    }

    /// Rank a user's memories against `query`, keeping at most `limit`.
    pub fn search(&self, user_id: &str, query: &str, limit: usize) -> Result<Vec<ScoredMemory>> {
        let memories = self.list_memories(user_id)?;
        let ranked = ranker::rank(query, &memories, limit);
        debug!(user_id, candidates = memories.len(), hits = ranked.len(), "searched memories");
        Ok(ranked)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let _lock = self.lock()?;
        let memories: Vec<MemoryRecord> = read_collection(&self.memories_path)?;
        let conversations: Vec<ConversationRecord> = read_collection(&self.conversations_path)?;
        Ok(StoreStats {
            memory_count: memories.len(),
            conversation_count: conversations.len(),
            location: self.config.location.clone(),
        })
    }

    // ── Reset ──────────────────────────────────────────────────

    /// Replace both collections with empty ones. Irreversible.
    pub fn clear_all(&self) -> Result<()> {
        let _lock = self.lock()?;
        write_collection::<MemoryRecord>(&self.memories_path, &[])?;
        write_collection::<ConversationRecord>(&self.conversations_path, &[])?;
        info!(location = ?self.config.location, "cleared all memory data");
        Ok(())
    }
}

fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            RecallError::integrity(path, "collection file is missing")
        } else {
            RecallError::integrity(path, e)
        }
    })?;
    serde_json::from_str(&raw).map_err(|e| RecallError::integrity(path, e))
}

fn write_collection<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    let dir = path.parent().unwrap_or(Path::new("."));
    let write_err = |source: std::io::Error| RecallError::StorageWrite {
        path: path.to_path_buf(),
        source,
    };

    // Atomic write: temp file in the same directory, then rename over the target.
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(json.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
