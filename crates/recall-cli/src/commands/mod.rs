use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;

use recall_config::{ConfigLoader, RecallConfig};
use recall_core::{ChatMessage, RecallError};
use recall_memory::compose;

mod ask;
mod seed;

use ask::AskMode;

/// Recall: long-term memory for a conversational agent
#[derive(Parser)]
#[command(name = "recall", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to recall.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// User id to act as (defaults to memory.default_user)
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the storage location and show what it holds
    Init,
    /// Store a memory fact for the user
    Remember {
        /// The fact to remember
        text: String,
        /// ISO-8601 timestamp (defaults to now)
        #[arg(long)]
        timestamp: Option<String>,
    },
    /// Store a conversation for the user
    Record {
        /// Messages as role=content pairs, in order
        #[arg(short, long = "message", value_parser = parse_key_val, required = true)]
        messages: Vec<(String, String)>,
        /// ISO-8601 timestamp (defaults to now)
        #[arg(long)]
        timestamp: Option<String>,
    },
    /// List the user's memories
    Memories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the user's most recent conversations
    Conversations {
        /// Number of conversations (default memory.conversation_limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rank the user's memories against a query
    Search {
        query: String,
        /// Maximum results (default memory.search_limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the payload that would be sent for a query
    Prompt {
        query: String,
        /// Maximum memories folded in (default memory.search_limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Answer a query using the user's memories
    Ask {
        query: String,
        /// Maximum memories folded in (default memory.search_limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Send the query without any memory context
        #[arg(long, conflicts_with = "compare")]
        stateless: bool,
        /// Show the answer without and with memory side by side
        #[arg(long)]
        compare: bool,
    },
    /// Load the demo profile (defaults to user "john")
    Seed {
        /// Append to existing data instead of clearing first
        #[arg(long)]
        keep: bool,
    },
    /// Show record counts
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every stored memory and conversation
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Show current configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Parse "role=content" CLI arguments.
fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid ROLE=CONTENT: no `=` found in `{s}`"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn init_tracing(format: &str, level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Logs go to stderr so `--json` output stays pipeable.
    if format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}

impl Cli {
    pub async fn run(self) -> recall_core::Result<()> {
        let config_loader = ConfigLoader::load(self.config.as_deref())?;
        let mut config = config_loader.get();
        if let Some(ref user) = self.user {
            config.memory.default_user = user.clone();
        }

        // --verbose > --quiet > --log-level > config
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            self.log_level
                .as_deref()
                .unwrap_or(config.logging.level.as_str())
        };
        init_tracing(&config.logging.format, log_level);

        let user = config.memory.default_user.clone();
        match self.command {
            Commands::Init => Self::cmd_init(&config),
            Commands::Remember { text, timestamp } => {
                Self::cmd_remember(&config, &user, &text, timestamp)
            }
            Commands::Record {
                messages,
                timestamp,
            } => Self::cmd_record(&config, &user, messages, timestamp),
            Commands::Memories { json } => Self::cmd_memories(&config, &user, json),
            Commands::Conversations { limit, json } => {
                let limit = limit.unwrap_or(config.memory.conversation_limit);
                Self::cmd_conversations(&config, &user, limit, json)
            }
            Commands::Search { query, limit, json } => {
                let limit = limit.unwrap_or(config.memory.search_limit);
                Self::cmd_search(&config, &user, &query, limit, json)
            }
            Commands::Prompt { query, limit } => {
                let limit = limit.unwrap_or(config.memory.search_limit);
                Self::cmd_prompt(&config, &user, &query, limit)
            }
            Commands::Ask {
                query,
                limit,
                stateless,
                compare,
            } => {
                let mode = if stateless {
                    AskMode::Stateless
                } else if compare {
                    AskMode::Compare
                } else {
                    AskMode::WithMemory
                };
                ask::cmd_ask(config, &user, &query, limit, mode).await
            }
            Commands::Seed { keep } => seed::cmd_seed(&config, self.user.as_deref(), keep),
            Commands::Stats { json } => Self::cmd_stats(&config, json),
            Commands::Clear { yes } => Self::cmd_clear(&config, yes),
            Commands::Config { json } => Self::cmd_config(config, config_loader.path(), json),
        }
    }

    fn cmd_init(config: &RecallConfig) -> recall_core::Result<()> {
        let store = recall_runtime::open_store(config)?;
        let stats = store.stats()?;
        println!(
            "{} Memory store ready at {}",
            style("✓").green(),
            store.location().display()
        );
        println!("   memories:      {}", stats.memory_count);
        println!("   conversations: {}", stats.conversation_count);
        Ok(())
    }

    fn cmd_remember(
        config: &RecallConfig,
        user: &str,
        text: &str,
        timestamp: Option<String>,
    ) -> recall_core::Result<()> {
        let store = recall_runtime::open_store(config)?;
        let id = store.append_memory(user, text, timestamp)?;
        println!("{} Stored memory {id} for {user}", style("✓").green());
        Ok(())
    }

    fn cmd_record(
        config: &RecallConfig,
        user: &str,
        messages: Vec<(String, String)>,
        timestamp: Option<String>,
    ) -> recall_core::Result<()> {
        let messages = messages
            .into_iter()
            .map(|(role, content)| ChatMessage::new(role, content))
            .collect();
        let store = recall_runtime::open_store(config)?;
        let id = store.append_conversation(user, messages, timestamp)?;
        println!("{} Stored conversation {id} for {user}", style("✓").green());
        Ok(())
    }

    fn cmd_memories(config: &RecallConfig, user: &str, json: bool) -> recall_core::Result<()> {
        let store = recall_runtime::open_store(config)?;
        let memories = store.list_memories(user)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&memories)?);
            return Ok(());
        }
        if memories.is_empty() {
            println!("No memories for {user}.");
            return Ok(());
        }
        println!("{} ({} memories)", style(user).bold(), memories.len());
        for (i, m) in memories.iter().enumerate() {
            println!("{:>3}. {}  {}", i + 1, style(&m.timestamp).dim(), m.memory);
        }
        Ok(())
    }

    fn cmd_conversations(
        config: &RecallConfig,
        user: &str,
        limit: usize,
        json: bool,
    ) -> recall_core::Result<()> {
        let store = recall_runtime::open_store(config)?;
        let conversations = store.list_conversations(user, limit)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&conversations)?);
            return Ok(());
        }
        if conversations.is_empty() {
            println!("No conversations for {user}.");
            return Ok(());
        }
        for conv in &conversations {
            println!("{}", style(&conv.timestamp).dim());
            for msg in &conv.messages {
                println!("  {}: {}", style(&msg.role).cyan(), msg.content);
            }
            println!();
        }
        Ok(())
    }

    fn cmd_search(
        config: &RecallConfig,
        user: &str,
        query: &str,
        limit: usize,
        json: bool,
    ) -> recall_core::Result<()> {
        let store = recall_runtime::open_store(config)?;
        let results = store.search(user, query, limit)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&results)?);
            return Ok(());
        }
        if results.is_empty() {
            println!("No memories matched '{query}'.");
            return Ok(());
        }
        for r in &results {
            println!("[{}] {}", style(r.score).yellow(), r.memory);
        }
        Ok(())
    }

    fn cmd_prompt(
        config: &RecallConfig,
        user: &str,
        query: &str,
        limit: usize,
    ) -> recall_core::Result<()> {
        let store = recall_runtime::open_store(config)?;
        let memories = store.search(user, query, limit)?;
        let payload = compose(query, &memories);
        println!("{payload}");
        println!();
        println!(
            "{}",
            style(format!(
                "{} memories, {} characters",
                memories.len(),
                payload.chars().count()
            ))
            .dim()
        );
        Ok(())
    }

    fn cmd_stats(config: &RecallConfig, json: bool) -> recall_core::Result<()> {
        let store = recall_runtime::open_store(config)?;
        let stats = store.stats()?;
        if json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("location:      {}", stats.location.display());
            println!("memories:      {}", stats.memory_count);
            println!("conversations: {}", stats.conversation_count);
        }
        Ok(())
    }

    fn cmd_clear(config: &RecallConfig, yes: bool) -> recall_core::Result<()> {
        if !yes {
            return Err(RecallError::validation(
                "clear deletes every stored record; pass --yes to confirm",
            ));
        }
        let store = recall_runtime::open_store(config)?;
        store.clear_all()?;
        println!("{} Cleared {}", style("✓").green(), store.location().display());
        Ok(())
    }

    fn cmd_config(
        mut config: RecallConfig,
        source: &std::path::Path,
        json: bool,
    ) -> recall_core::Result<()> {
        if config.generation.api_key.is_some() {
            config.generation.api_key = Some("********".into());
        }
        if json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            let origin = if source.exists() { "" } else { " (not found, defaults)" };
            println!("# {}{origin}", source.display());
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| RecallError::Config(e.to_string()))?
            );
        }
        Ok(())
    }
}
