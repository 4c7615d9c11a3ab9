use chrono::{DateTime, Local, NaiveDateTime};
use recall_core::{ChatMessage, RecallError, Result};
use serde::{Deserialize, Serialize};

/// A raw, role-tagged exchange stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConversation")]
pub struct ConversationRecord {
    pub user_id: String,
    pub timestamp: String,
    pub messages: Vec<ChatMessage>,
}

/// A distilled fact about a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMemory")]
pub struct MemoryRecord {
    pub user_id: String,
    pub memory: String,
    pub timestamp: String,
}

impl ConversationRecord {
    /// Build a validated record. `timestamp` defaults to the current local time.
    pub fn new(
        user_id: impl Into<String>,
        messages: Vec<ChatMessage>,
        timestamp: Option<String>,
    ) -> Result<Self> {
        let user_id = user_id.into();
        validate_user_id(&user_id)?;
        if messages.is_empty() {
            return Err(RecallError::validation(
                "conversation must contain at least one message",
            ));
        }
        if let Some(pos) = messages.iter().position(|m| m.role.trim().is_empty()) {
            return Err(RecallError::validation(format!(
                "message {pos} has an empty role"
            )));
        }
        Ok(Self {
            user_id,
            timestamp: resolve_timestamp(timestamp)?,
            messages,
        })
    }
}

impl MemoryRecord {
    /// Build a validated record. `timestamp` defaults to the current local time.
    pub fn new(
        user_id: impl Into<String>,
        memory: impl Into<String>,
        timestamp: Option<String>,
    ) -> Result<Self> {
        let user_id = user_id.into();
        let memory = memory.into();
        validate_user_id(&user_id)?;
        if memory.trim().is_empty() {
            return Err(RecallError::validation("memory text is empty"));
        }
        Ok(Self {
            user_id,
            memory,
            timestamp: resolve_timestamp(timestamp)?,
        })
    }
}

// On-disk shapes. Deserialization funnels through the validating constructors
// so a schema-invalid file never yields a record.

#[derive(Deserialize)]
struct RawConversation {
    user_id: String,
    timestamp: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct RawMemory {
    user_id: String,
    memory: String,
    timestamp: String,
}

impl TryFrom<RawConversation> for ConversationRecord {
    type Error = RecallError;

    fn try_from(raw: RawConversation) -> Result<Self> {
        Self::new(raw.user_id, raw.messages, Some(raw.timestamp))
    }
}

impl TryFrom<RawMemory> for MemoryRecord {
    type Error = RecallError;

    fn try_from(raw: RawMemory) -> Result<Self> {
        Self::new(raw.user_id, raw.memory, Some(raw.timestamp))
    }
}

fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(RecallError::validation("user id is empty"));
    }
    Ok(())
}

fn resolve_timestamp(timestamp: Option<String>) -> Result<String> {
    match timestamp {
        Some(ts) => {
            validate_timestamp(&ts)?;
            Ok(ts)
        }
        None => Ok(now_iso()),
    }
}

/// Current local time as naive ISO-8601 with microseconds.
pub fn now_iso() -> String {
    format_iso(Local::now().naive_local())
}

/// Render a naive timestamp the way records store it.
pub fn format_iso(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Accepts RFC 3339 (with offset) or a naive `YYYY-MM-DDTHH:MM:SS[.fraction]`.
pub fn validate_timestamp(ts: &str) -> Result<()> {
    if DateTime::parse_from_rfc3339(ts).is_ok()
        || NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S").is_ok()
    {
        return Ok(());
    }
    Err(RecallError::validation(format!(
        "timestamp '{ts}' is not ISO-8601"
    )))
}
