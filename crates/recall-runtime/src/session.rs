use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use recall_config::{DEFAULT_USER, RecallConfig};
use recall_core::{ChatMessage, RecallError, Result};
use recall_llm::Generator;
use recall_memory::{DEFAULT_SEARCH_LIMIT, MemoryStore, ScoredMemory, compose};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Knobs for a [`MemorySession`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// User id used when the caller passes none.
    pub default_user: String,
    /// Maximum ranked memories folded into a prompt.
    pub search_limit: usize,
    /// Abandon a generation call after this long. `None` waits forever.
    pub generation_timeout: Option<Duration>,
    /// Store each successful exchange as a conversation record.
    pub record_conversations: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            default_user: DEFAULT_USER.into(),
            search_limit: DEFAULT_SEARCH_LIMIT,
            generation_timeout: Some(Duration::from_secs(60)),
            record_conversations: false,
        }
    }
}

impl From<&RecallConfig> for SessionOptions {
    fn from(config: &RecallConfig) -> Self {
        let timeout = config.generation.timeout_secs;
        Self {
            default_user: config.memory.default_user.clone(),
            search_limit: config.memory.search_limit,
            generation_timeout: (timeout > 0).then(|| Duration::from_secs(timeout)),
            record_conversations: config.memory.record_conversations,
        }
    }
}

/// Outcome of one generation call, already safe to show to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum Reply {
    Text(String),
    Failed(String),
}

impl Reply {
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Text(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Reply::Text(t) => Some(t),
            Reply::Failed(_) => None,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Text(t) => f.write_str(t),
            Reply::Failed(e) => write!(f, "Error generating response: {e}"),
        }
    }
}

/// Everything that goes into a generation call, before it is made.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedPrompt {
    pub user_id: String,
    pub query: String,
    pub memories: Vec<ScoredMemory>,
    pub payload: String,
}

/// One orchestrated query: the memories used, the payload sent, the reply.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub user_id: String,
    pub query: String,
    pub memories: Vec<ScoredMemory>,
    pub payload: String,
    pub reply: Reply,
}

/// The same query answered without and with memory.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub stateless: Reply,
    pub with_memory: Turn,
}

/// Answers queries for users, conditioning each answer on stored memories.
///
/// Store calls block on the location lock and on file I/O, so the async
/// paths run them on tokio's blocking pool.
pub struct MemorySession {
    store: Arc<MemoryStore>,
    generator: Arc<dyn Generator>,
    options: SessionOptions,
}

impl MemorySession {
    pub fn new(store: MemoryStore, generator: Arc<dyn Generator>, options: SessionOptions) -> Self {
        Self {
            store: Arc::new(store),
            generator,
            options,
        }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    fn resolve_user(&self, user_id: Option<&str>) -> String {
        user_id
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(&self.options.default_user)
            .to_string()
    }

    /// Rank the user's memories and compose the payload, without generating.
    pub fn prepare(&self, user_id: Option<&str>, query: &str) -> Result<PreparedPrompt> {
        let user_id = self.resolve_user(user_id);
        let memories = self.store.search(&user_id, query, self.options.search_limit)?;
        Ok(assemble(user_id, query, memories))
    }

    /// Answer `query` using the user's relevant memories.
    pub async fn ask(&self, user_id: Option<&str>, query: &str) -> Result<Turn> {
        let user_id = self.resolve_user(user_id);
        let limit = self.options.search_limit;
        let memories = {
            let (user_id, query) = (user_id.clone(), query.to_string());
            self.with_store(move |store| store.search(&user_id, &query, limit))
                .await?
        };
        let prepared = assemble(user_id, query, memories);
        let reply = self.generate(&prepared.payload).await;

        if self.options.record_conversations {
            if let Reply::Text(ref answer) = reply {
                let user_id = prepared.user_id.clone();
                let messages = vec![ChatMessage::user(query), ChatMessage::assistant(answer.as_str())];
                let id = self
                    .with_store(move |store| store.append_conversation(&user_id, messages, None))
                    .await?;
                debug!(user_id = %prepared.user_id, id, "recorded exchange");
            }
        }

        Ok(Turn {
            user_id: prepared.user_id,
            query: prepared.query,
            memories: prepared.memories,
            payload: prepared.payload,
            reply,
        })
    }

    /// Send the query as-is, with no memory context.
    pub async fn ask_stateless(&self, query: &str) -> Reply {
        self.generate(query).await
    }

    /// Answer the same query without and then with memory.
    pub async fn compare(&self, user_id: Option<&str>, query: &str) -> Result<Comparison> {
        let stateless = self.ask_stateless(query).await;
        let with_memory = self.ask(user_id, query).await?;
        Ok(Comparison {
            stateless,
            with_memory,
        })
    }

    async fn with_store<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&MemoryStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| RecallError::Other(e.into()))?
    }

    async fn generate(&self, prompt: &str) -> Reply {
        info!(generator = self.generator.name(), "generating response");
        let call = self.generator.generate(prompt);
        let result = match self.options.generation_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(RecallError::GenerationTimeout {
                    secs: limit.as_secs(),
                }),
            },
            None => call.await,
        };

        match result {
            Ok(text) => Reply::Text(text),
            Err(e) => {
                warn!(error = %e, "generation failed");
                Reply::Failed(e.to_string())
            }
        }
    }
}

fn assemble(user_id: String, query: &str, memories: Vec<ScoredMemory>) -> PreparedPrompt {
    let payload = compose(query, &memories);
    debug!(
        user_id = %user_id,
        memories = memories.len(),
        payload_chars = payload.len(),
        "prepared prompt"
    );
    PreparedPrompt {
        user_id,
        query: query.to_string(),
        memories,
        payload,
    }
}
