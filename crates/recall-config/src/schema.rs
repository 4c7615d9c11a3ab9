use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User id used when the caller does not name one.
pub const DEFAULT_USER: &str = "default_user";

/// Root configuration, mapped from `recall.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallConfig {
    pub memory: MemoryConfig,
    pub generation: GenerationConfig,
    pub logging: LoggingConfig,
}

// ── Memory ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Directory holding `memories.json` and `conversations.json`.
    pub location: PathBuf,
    /// User id used when none is given on the command line.
    pub default_user: String,
    /// Maximum number of ranked memories fed into a prompt.
    pub search_limit: usize,
    /// Number of recent conversations listed by default.
    pub conversation_limit: usize,
    /// How long a store operation waits for the location lock.
    pub lock_timeout_ms: u64,
    /// Append each successful question/answer exchange as a conversation record.
    pub record_conversations: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            location: PathBuf::from("./memory_db"),
            default_user: DEFAULT_USER.into(),
            search_limit: 5,
            conversation_limit: 10,
            lock_timeout_ms: 5_000,
            record_conversations: false,
        }
    }
}

// ── Generation ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Model identifier in `provider/model` form, e.g. "gemini/gemini-2.5-flash".
    pub model: String,
    /// API key for the provider. Falls back to GOOGLE_API_KEY.
    pub api_key: Option<String>,
    /// Override for the provider's API base URL.
    pub base_url: Option<String>,
    /// Sampling temperature (0.0 - 2.0). Provider default when unset.
    pub temperature: Option<f32>,
    /// Cap on generated tokens. Provider default when unset.
    pub max_output_tokens: Option<u32>,
    /// Seconds before a generation call is abandoned. 0 = no timeout.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gemini/gemini-2.5-flash".into(),
            api_key: None,
            base_url: None,
            temperature: None,
            max_output_tokens: None,
            timeout_secs: 60,
        }
    }
}

impl GenerationConfig {
    /// Split `provider/model` into its two halves.
    pub fn provider_and_model(&self) -> (&str, &str) {
        match self.model.split_once('/') {
            Some((provider, model)) => (provider, model),
            None => ("gemini", self.model.as_str()),
        }
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Output format: "pretty" or "json".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Validation ─────────────────────────────────────────────────

/// A single finding from [`RecallConfig::validate`].
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            WarningSeverity::Error => "error",
            WarningSeverity::Warning => "warning",
            WarningSeverity::Info => "note",
        };
        write!(f, "{} {}: {}", label, self.field, self.message)?;
        if let Some(ref h) = self.hint {
            write!(f, "\n   ↳ {}", h)?;
        }
        Ok(())
    }
}

const KNOWN_PROVIDERS: [&str; 2] = ["gemini", "mock"];

impl RecallConfig {
    /// Validate the config and return a list of warnings.
    /// Returns `Err` with all error messages joined if any severity is Error.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let mut warnings = Vec::new();

        // ── Memory location ───
        if self.memory.location.as_os_str().is_empty() {
            warnings.push(ConfigWarning {
                field: "memory.location".into(),
                message: "storage location is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to a directory, e.g. './memory_db'".into()),
            });
        }

        if self.memory.default_user.trim().is_empty() {
            warnings.push(ConfigWarning {
                field: "memory.default_user".into(),
                message: "default user id is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some(format!("Use e.g. '{}'", DEFAULT_USER)),
            });
        }

        if self.memory.search_limit == 0 {
            warnings.push(ConfigWarning {
                field: "memory.search_limit".into(),
                message: "search_limit is 0: no memories will ever reach the prompt".into(),
                severity: WarningSeverity::Warning,
                hint: Some("Set to e.g. 5".into()),
            });
        }

        if self.memory.lock_timeout_ms == 0 {
            warnings.push(ConfigWarning {
                field: "memory.lock_timeout_ms".into(),
                message: "lock timeout is 0: any contention fails immediately".into(),
                severity: WarningSeverity::Info,
                hint: None,
            });
        }

        // ── Generation model ───
        let model = &self.generation.model;
        if model.is_empty() {
            warnings.push(ConfigWarning {
                field: "generation.model".into(),
                message: "model is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 'gemini/gemini-2.5-flash'".into()),
            });
        } else if !model.contains('/') {
            warnings.push(ConfigWarning {
                field: "generation.model".into(),
                message: format!("model '{}' should be in 'provider/model' format", model),
                severity: WarningSeverity::Warning,
                hint: Some("Use 'gemini/gemini-2.5-flash' or 'mock/echo'".into()),
            });
        } else {
            let (provider, _) = self.generation.provider_and_model();
            if !KNOWN_PROVIDERS.contains(&provider) {
                warnings.push(ConfigWarning {
                    field: "generation.model".into(),
                    message: format!("unknown provider '{}'", provider),
                    severity: WarningSeverity::Warning,
                    hint: Some(format!("Known providers: {}", KNOWN_PROVIDERS.join(", "))),
                });
            } else if provider == "gemini" && self.generation.api_key.is_none() {
                warnings.push(ConfigWarning {
                    field: "generation.api_key".into(),
                    message: "no API key configured: generation will fail".into(),
                    severity: WarningSeverity::Warning,
                    hint: Some("Set GOOGLE_API_KEY in the environment or a .env file".into()),
                });
            }
        }

        // ── Temperature ───
        if let Some(t) = self.generation.temperature {
            if !(0.0..=2.0).contains(&t) {
                warnings.push(ConfigWarning {
                    field: "generation.temperature".into(),
                    message: format!("temperature {} is out of range", t),
                    severity: WarningSeverity::Error,
                    hint: Some("Temperature must be between 0.0 and 2.0".into()),
                });
            }
        }

        if self.generation.max_output_tokens == Some(0) {
            warnings.push(ConfigWarning {
                field: "generation.max_output_tokens".into(),
                message: "max_output_tokens is 0: generator won't produce output".into(),
                severity: WarningSeverity::Error,
                hint: Some("Remove it or set to e.g. 2048".into()),
            });
        }

        if self.generation.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                field: "generation.timeout_secs".into(),
                message: "no generation timeout: a stalled provider blocks forever".into(),
                severity: WarningSeverity::Info,
                hint: None,
            });
        }

        // ── Logging format ───
        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.format".into(),
                message: format!("unknown log format '{}'", self.logging.format),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_formats.join(", "))),
            });
        }

        // ── Logging level ───
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.level".into(),
                message: format!("unknown log level '{}'", self.logging.level),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_levels.join(", "))),
            });
        }

        // Check for hard errors
        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| format!("{}: {}", w.field, w.message))
            .collect();

        if !errors.is_empty() {
            return Err(format!("Configuration errors:\n  • {}", errors.join("\n  • ")));
        }

        Ok(warnings)
    }
}
