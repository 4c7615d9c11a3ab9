use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for the Recall memory layer.
#[derive(Error, Debug)]
pub enum RecallError {
    // ── Input errors ───────────────────────────────────────────
    #[error("validation failed: {0}")]
    Validation(String),

    // ── Storage errors ─────────────────────────────────────────
    #[error("storage integrity failure: {path}: {reason}")]
    StorageIntegrity { path: PathBuf, reason: String },

    #[error("storage write failed: {path}: {source}")]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage locked: {path} (waited {waited_ms}ms)")]
    StorageLocked { path: PathBuf, waited_ms: u64 },

    // ── Generation errors ──────────────────────────────────────
    #[error("generation failed: {0}")]
    Generation(String),

    #[error("generation timed out after {secs}s")]
    GenerationTimeout { secs: u64 },

    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    #[error("config validation failed: {field}: {reason}")]
    ConfigValidation { field: String, reason: String },

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl RecallError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn integrity(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::StorageIntegrity {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for failures of the durable store (corrupt, unwritable, or locked).
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::StorageIntegrity { .. } | Self::StorageWrite { .. } | Self::StorageLocked { .. }
        )
    }

    /// True for failures of the external generation step.
    pub fn is_generation(&self) -> bool {
        matches!(self, Self::Generation(_) | Self::GenerationTimeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, RecallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_classification() {
        let err = RecallError::integrity("/tmp/memories.json", "expected value at line 1");
        assert!(err.is_storage());
        assert!(!err.is_generation());

        let err = RecallError::StorageWrite {
            path: "/tmp/x".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.is_storage());
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_generation_classification() {
        assert!(RecallError::Generation("HTTP 500".into()).is_generation());
        assert!(RecallError::GenerationTimeout { secs: 30 }.is_generation());
        assert!(!RecallError::validation("empty user id").is_storage());
    }

    #[test]
    fn test_display() {
        let err = RecallError::integrity("/data/memories.json", "not a list");
        assert_eq!(
            err.to_string(),
            "storage integrity failure: /data/memories.json: not a list"
        );
    }
}
