use console::style;

use recall_config::RecallConfig;
use recall_runtime::{MemorySession, Reply, SessionOptions, Turn};

pub(super) enum AskMode {
    WithMemory,
    Stateless,
    Compare,
}

pub(super) async fn cmd_ask(
    config: RecallConfig,
    user: &str,
    query: &str,
    limit: Option<usize>,
    mode: AskMode,
) -> recall_core::Result<()> {
    let store = recall_runtime::open_store(&config)?;
    let generator = recall_runtime::build_generator(&config.generation)?;
    let mut options = SessionOptions::from(&config);
    if let Some(n) = limit {
        options.search_limit = n;
    }
    let session = MemorySession::new(store, generator, options);

    match mode {
        AskMode::Stateless => {
            let reply = session.ask_stateless(query).await;
            print_reply("Response", &reply);
        }
        AskMode::WithMemory => {
            let turn = session.ask(Some(user), query).await?;
            print_memories(&turn);
            print_reply("Response", &turn.reply);
        }
        AskMode::Compare => {
            let cmp = session.compare(Some(user), query).await?;
            print_reply("Without memory", &cmp.stateless);
            println!("{}", "-".repeat(60));
            print_memories(&cmp.with_memory);
            print_reply("With memory", &cmp.with_memory.reply);
        }
    }
    Ok(())
}

fn print_memories(turn: &Turn) {
    if turn.memories.is_empty() {
        println!("{}", style(format!("No memories found for {}", turn.user_id)).dim());
        println!();
        return;
    }
    println!(
        "{}",
        style(format!("Using {} memories for {}:", turn.memories.len(), turn.user_id)).dim()
    );
    for m in &turn.memories {
        println!("  {} {}", style(format!("[{}]", m.score)).dim(), m.memory);
    }
    println!();
}

fn print_reply(label: &str, reply: &Reply) {
    let header = if reply.is_ok() {
        style(label).bold().green()
    } else {
        style(label).bold().red()
    };
    println!("{header}");
    println!("{reply}");
    println!();
}
