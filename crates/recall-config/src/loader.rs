use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::schema::RecallConfig;

/// Loads the Recall configuration and remembers where it came from.
pub struct ConfigLoader {
    config: RecallConfig,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > RECALL_CONFIG env > ~/.recall/recall.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("RECALL_CONFIG") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".recall")
            .join("recall.toml")
    }

    /// Load the config from disk, falling back to defaults.
    pub fn load(path: Option<&Path>) -> recall_core::Result<Self> {
        let config_path = Self::resolve_path(path);
        let config = if config_path.exists() {
            info!(?config_path, "loading configuration");
            Self::read(&config_path)?
        } else {
            warn!(?config_path, "config file not found, using defaults");
            RecallConfig::default()
        };

        let config = Self::apply_env_overrides(config);

        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
            }
            Err(e) => {
                return Err(recall_core::RecallError::Config(e));
            }
        }

        Ok(Self {
            config,
            config_path,
        })
    }

    fn read(path: &Path) -> recall_core::Result<RecallConfig> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str::<RecallConfig>(&raw).map_err(|e| {
            recall_core::RecallError::Config(format!(
                "failed to parse {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// A copy of the loaded config, for the caller to layer flags onto.
    pub fn get(&self) -> RecallConfig {
        self.config.clone()
    }

    /// Path the config was (or would have been) read from.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply env var overrides (RECALL_STORAGE_PATH, RECALL_MODEL, etc.)
    pub fn apply_env_overrides(config: RecallConfig) -> RecallConfig {
        Self::apply_overrides(config, |key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_overrides(
        mut config: RecallConfig,
        var: impl Fn(&str) -> Option<String>,
    ) -> RecallConfig {
        if let Some(v) = var("RECALL_STORAGE_PATH") {
            config.memory.location = PathBuf::from(v);
        }
        if let Some(v) = var("RECALL_USER") {
            config.memory.default_user = v;
        }
        if let Some(v) = var("RECALL_MODEL") {
            config.generation.model = v;
        }
        if let Some(v) = var("RECALL_LOG_LEVEL") {
            config.logging.level = v;
        }
        if let Some(v) = var("RECALL_GENERATION_TIMEOUT") {
            if let Ok(secs) = v.parse::<u64>() {
                config.generation.timeout_secs = secs;
            }
        }
        // Config file takes priority, env is the fallback.
        if config.generation.api_key.is_none() {
            if let Some(v) = var("GOOGLE_API_KEY") {
                config.generation.api_key = Some(v);
            }
        }
        config
    }
}
