//! The demo profile: a week of backdated history for one user.

use chrono::{Duration, Local, NaiveDateTime};
use console::style;

use recall_config::RecallConfig;
use recall_core::ChatMessage;
use recall_memory::MemoryStore;
use recall_memory::record::format_iso;

pub(super) const DEMO_USER: &str = "john";

/// (days after the base time, messages)
const CONVERSATIONS: [(i64, &[(&str, &str)]); 4] = [
    (
        0,
        &[
            ("user", "Hi! I'm John, I live in Nuremberg, Germany."),
            (
                "assistant",
                "Nice to meet you John! Nuremberg is a beautiful city with rich history. How do you like living there?",
            ),
            (
                "user",
                "I love it here! The old town is amazing, and I enjoy walking around the castle area.",
            ),
            (
                "assistant",
                "That's wonderful! The Nuremberg Castle is indeed spectacular. Do you have any hobbies or interests?",
            ),
        ],
    ),
    (
        1,
        &[
            (
                "user",
                "I'm really into mountain climbing and hiking. Just got back from the Bavarian Alps.",
            ),
            (
                "assistant",
                "Mountain climbing sounds exciting! The Bavarian Alps must offer some amazing trails. What was your favorite part of the trip?",
            ),
            (
                "user",
                "The view from Zugspitze was breathtaking! I also love the physical challenge.",
            ),
            (
                "assistant",
                "Zugspitze is Germany's highest peak! That's quite an accomplishment. Do you climb regularly?",
            ),
        ],
    ),
    (
        3,
        &[
            (
                "user",
                "I work in tech, specifically AI and machine learning. Always fascinated by how AI can solve complex problems.",
            ),
            (
                "assistant",
                "AI and ML are fascinating fields! What kind of projects do you work on?",
            ),
            (
                "user",
                "Mostly computer vision and natural language processing. I'm particularly interested in how AI can understand human behavior.",
            ),
            (
                "assistant",
                "That's cutting-edge work! Computer vision and NLP are revolutionizing so many industries.",
            ),
        ],
    ),
    (
        5,
        &[
            (
                "user",
                "Do you know any good places to cool down in Nuremberg during summer?",
            ),
            (
                "assistant",
                "Yes! Nuremberg has several great spots for hot weather. The Dutzendteich lake is perfect for swimming, and there are many beer gardens like Schönweiss with shaded areas.",
            ),
            (
                "user",
                "I've been to Dutzendteich! The swimming area is great. Any other recommendations?",
            ),
            (
                "assistant",
                "The Wöhrder See is another beautiful lake option, and the old town has many fountains where you can cool off. The Hauptkirche area stays cooler due to the stone buildings.",
            ),
        ],
    ),
];

/// Extracted facts; the i-th is stamped i days after the base time.
const MEMORIES: [&str; 7] = [
    "John lives in Nuremberg, Germany and loves the old town and castle area",
    "John is passionate about mountain climbing and hiking, especially in the Bavarian Alps",
    "John has climbed Zugspitze (Germany's highest peak) and enjoys physical challenges",
    "John works in tech, specifically AI and machine learning with focus on computer vision and NLP",
    "John is interested in how AI can understand human behavior",
    "John knows about local Nuremberg spots like Dutzendteich lake, Wöhrder See, and beer gardens",
    "John has been swimming at Dutzendteich lake during hot weather",
];

#[derive(Debug, Default)]
pub(super) struct SeedReport {
    pub conversation_ids: Vec<usize>,
    pub memory_ids: Vec<usize>,
}

/// Append the demo profile for `user_id`, timestamped forward from `base`.
pub(super) fn seed_profile(
    store: &MemoryStore,
    user_id: &str,
    base: NaiveDateTime,
) -> recall_core::Result<SeedReport> {
    let mut report = SeedReport::default();

    for (day, messages) in CONVERSATIONS {
        let messages = messages
            .iter()
            .map(|(role, content)| ChatMessage::new(*role, *content))
            .collect();
        let ts = format_iso(base + Duration::days(day));
        report
            .conversation_ids
            .push(store.append_conversation(user_id, messages, Some(ts))?);
    }

    for (day, text) in MEMORIES.iter().enumerate() {
        let ts = format_iso(base + Duration::days(day as i64));
        report
            .memory_ids
            .push(store.append_memory(user_id, text, Some(ts))?);
    }

    Ok(report)
}

pub(super) fn cmd_seed(
    config: &RecallConfig,
    user: Option<&str>,
    keep: bool,
) -> recall_core::Result<()> {
    let user = user.unwrap_or(DEMO_USER);
    let store = recall_runtime::open_store(config)?;
    if !keep {
        store.clear_all()?;
    }

    let base = Local::now().naive_local() - Duration::days(7);
    let report = seed_profile(&store, user, base)?;
    tracing::info!(
        user,
        conversations = report.conversation_ids.len(),
        memories = report.memory_ids.len(),
        "seeded demo profile"
    );

    println!(
        "{} Stored {} conversations and {} memories for {user}",
        style("✓").green(),
        report.conversation_ids.len(),
        report.memory_ids.len()
    );
    let stats = store.stats()?;
    println!(
        "   store now holds {} memories, {} conversations",
        stats.memory_count, stats.conversation_count
    );
    Ok(())
}
