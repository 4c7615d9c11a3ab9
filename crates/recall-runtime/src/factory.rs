use std::sync::Arc;
use std::time::Duration;

use recall_config::{GenerationConfig, RecallConfig};
use recall_core::{RecallError, Result};
use recall_llm::{GeminiGenerator, GenerationSettings, Generator, MockGenerator};
use recall_memory::{MemoryStore, StoreConfig};
use tracing::info;

/// Open the store described by `[memory]`.
pub fn open_store(config: &RecallConfig) -> Result<MemoryStore> {
    MemoryStore::open(
        StoreConfig::new(&config.memory.location)
            .with_lock_timeout(Duration::from_millis(config.memory.lock_timeout_ms)),
    )
}

/// Build the generator selected by `generation.model` (`provider/model`).
pub fn build_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    let (provider, model) = config.provider_and_model();
    info!(provider, model, "building generator");
    match provider {
        "gemini" => {
            let key = config.api_key.clone().ok_or_else(|| {
                RecallError::Config(
                    "no Gemini API key: set generation.api_key or GOOGLE_API_KEY".into(),
                )
            })?;
            let mut generator = GeminiGenerator::new(key, model).with_settings(GenerationSettings {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
            });
            if let Some(ref url) = config.base_url {
                generator = generator.with_base_url(url.clone());
            }
            Ok(Arc::new(generator))
        }
        "mock" => Ok(Arc::new(MockGenerator::new(model))),
        other => Err(RecallError::Config(format!(
            "unknown generation provider '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_needs_key() {
        let config = GenerationConfig::default();
        assert!(matches!(build_generator(&config), Err(RecallError::Config(_))));

        let config = GenerationConfig {
            api_key: Some("key".into()),
            ..Default::default()
        };
        let generator = build_generator(&config).unwrap();
        assert_eq!(generator.name(), "gemini");
        assert_eq!(generator.model(), "gemini-2.5-flash");
    }

    #[test]
    fn test_mock_and_unknown() {
        let config = GenerationConfig {
            model: "mock/echo".into(),
            ..Default::default()
        };
        assert_eq!(build_generator(&config).unwrap().name(), "echo");

        let config = GenerationConfig {
            model: "acme/large".into(),
            ..Default::default()
        };
        assert!(build_generator(&config).is_err());
    }

    #[test]
    fn test_open_store_uses_memory_section() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RecallConfig::default();
        config.memory.location = dir.path().join("db");
        let store = open_store(&config).unwrap();
        assert_eq!(store.location(), dir.path().join("db"));
        assert!(store.memories_path().exists());
    }
}
