#[cfg(test)]
mod tests {
    use recall_config::RecallConfig;
    use recall_core::ChatMessage;
    use recall_llm::{Generator, MockGenerator};
    use recall_memory::{MemoryStore, StoreConfig};
    use recall_runtime::{MemorySession, Reply, SessionOptions};
    use std::sync::Arc;
    use std::time::Duration;

    fn make_store() -> (tempfile::TempDir, MemoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::open(StoreConfig::new(dir.path())).unwrap();
        (dir, store)
    }

    fn session_with(store: MemoryStore, mock: MockGenerator, options: SessionOptions) -> MemorySession {
        let generator: Arc<dyn Generator> = Arc::new(mock);
        MemorySession::new(store, generator, options)
    }

    // ── Prompt preparation ─────────────────────────────────────

    mod prepare {
        use super::*;

        #[test]
        fn test_prepare_without_memories_sends_query_verbatim() {
            let (_dir, store) = make_store();
            let session = session_with(store, MockGenerator::new("mock"), SessionOptions::default());
            let prepared = session.prepare(Some("john"), "what should I cook?").unwrap();
            assert!(prepared.memories.is_empty());
            assert_eq!(prepared.payload, "what should I cook?");
        }

        #[test]
        fn test_prepare_includes_ranked_memories() {
            let (_dir, store) = make_store();
            store.append_memory("john", "John is allergic to peanuts", None).unwrap();
            store.append_memory("john", "John plays tennis", None).unwrap();
            let session = session_with(store, MockGenerator::new("mock"), SessionOptions::default());

            let prepared = session.prepare(Some("john"), "any peanuts allergies?").unwrap();
            assert_eq!(prepared.memories.len(), 1);
            assert_eq!(prepared.memories[0].memory, "John is allergic to peanuts");
            assert!(!prepared.payload.contains("tennis"));
            assert!(prepared.payload.contains("- John is allergic to peanuts"));
            assert!(prepared.payload.contains("USER QUERY: any peanuts allergies?"));
        }

        #[test]
        fn test_prepare_falls_back_to_default_user() {
            let (_dir, store) = make_store();
            store.append_memory("default_user", "likes jazz", None).unwrap();
            let session = session_with(store, MockGenerator::new("mock"), SessionOptions::default());

            let prepared = session.prepare(None, "jazz").unwrap();
            assert_eq!(prepared.user_id, "default_user");
            assert_eq!(prepared.memories.len(), 1);

            let blank = session.prepare(Some("  "), "jazz").unwrap();
            assert_eq!(blank.user_id, "default_user");
        }

        #[test]
        fn test_prepare_respects_search_limit() {
            let (_dir, store) = make_store();
            for i in 0..4 {
                store.append_memory("john", &format!("fact number {i}"), None).unwrap();
            }
            let options = SessionOptions {
                search_limit: 2,
                ..SessionOptions::default()
            };
            let session = session_with(store, MockGenerator::new("mock"), options);
            let prepared = session.prepare(Some("john"), "fact").unwrap();
            assert_eq!(prepared.memories.len(), 2);
            assert_eq!(prepared.memories[0].memory, "fact number 0");
        }
    }

    // ── Asking ─────────────────────────────────────────────────

    mod ask {
        use super::*;

        #[tokio::test]
        async fn test_ask_sends_composed_payload() {
            let (_dir, store) = make_store();
            store.append_memory("john", "John loves hiking", None).unwrap();
            let mock = MockGenerator::new("mock").with_reply("Try the coastal trail.");
            let prompts = mock.prompt_log();
            let session = session_with(store, mock, SessionOptions::default());

            let turn = session.ask(Some("john"), "hiking ideas?").await.unwrap();
            assert_eq!(turn.reply, Reply::Text("Try the coastal trail.".into()));
            assert_eq!(turn.reply.to_string(), "Try the coastal trail.");

            let sent = prompts.lock().clone();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0], turn.payload);
            assert!(sent[0].contains("- John loves hiking"));
        }

        #[tokio::test]
        async fn test_generator_failure_becomes_reply() {
            let (_dir, store) = make_store();
            let mock = MockGenerator::new("mock").with_error("quota exceeded");
            let session = session_with(store, mock, SessionOptions::default());

            let turn = session.ask(Some("john"), "hello").await.unwrap();
            assert!(!turn.reply.is_ok());
            assert!(turn.reply.text().is_none());
            let shown = turn.reply.to_string();
            assert!(shown.starts_with("Error generating response: "));
            assert!(shown.contains("quota exceeded"));
        }

        #[tokio::test]
        async fn test_timeout_becomes_failed_reply() {
            let (_dir, store) = make_store();
            let mock = MockGenerator::new("mock")
                .with_reply("too late")
                .with_delay(Duration::from_millis(500));
            let options = SessionOptions {
                generation_timeout: Some(Duration::from_millis(20)),
                ..SessionOptions::default()
            };
            let session = session_with(store, mock, options);

            let turn = session.ask(Some("john"), "hello").await.unwrap();
            assert!(!turn.reply.is_ok());
            assert!(turn.reply.to_string().contains("timed out"));
        }

        #[tokio::test]
        async fn test_ask_does_not_record_by_default() {
            let (_dir, store) = make_store();
            let session = session_with(
                store,
                MockGenerator::new("mock").with_reply("hi"),
                SessionOptions::default(),
            );
            session.ask(Some("john"), "hello").await.unwrap();
            assert!(session.store().list_conversations("john", 10).unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_ask_records_successful_exchange() {
            let (_dir, store) = make_store();
            let options = SessionOptions {
                record_conversations: true,
                ..SessionOptions::default()
            };
            let mock = MockGenerator::new("mock")
                .with_reply("Hello John")
                .with_error("boom");
            let session = session_with(store, mock, options);

            session.ask(Some("john"), "hi there").await.unwrap();
            session.ask(Some("john"), "again").await.unwrap();

            let recorded = session.store().list_conversations("john", 10).unwrap();
            assert_eq!(recorded.len(), 1);
            assert_eq!(
                recorded[0].messages,
                vec![ChatMessage::user("hi there"), ChatMessage::assistant("Hello John")]
            );
        }

        #[tokio::test]
        async fn test_ask_stateless_ignores_memories() {
            let (_dir, store) = make_store();
            store.append_memory("default_user", "secret preference", None).unwrap();
            let mock = MockGenerator::new("mock").with_reply("generic");
            let prompts = mock.prompt_log();
            let session = session_with(store, mock, SessionOptions::default());

            let reply = session.ask_stateless("preference?").await;
            assert_eq!(reply, Reply::Text("generic".into()));
            assert_eq!(prompts.lock().as_slice(), ["preference?".to_string()]);
        }
    }

    // ── Store contention ───────────────────────────────────────

    mod contention {
        use super::*;
        use recall_core::RecallError;
        use recall_memory::lock::LocationLock;
        use std::time::Instant;

        #[tokio::test]
        async fn test_lock_wait_does_not_stall_runtime() {
            let dir = tempfile::tempdir().unwrap();
            let store = MemoryStore::open(
                StoreConfig::new(dir.path()).with_lock_timeout(Duration::from_millis(300)),
            )
            .unwrap();
            let session = session_with(
                store,
                MockGenerator::new("mock").with_reply("unused"),
                SessionOptions::default(),
            );
            let _held = LocationLock::acquire(dir.path(), Duration::from_millis(50)).unwrap();

            let started = Instant::now();
            let ticker = tokio::spawn(async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Instant::now()
            });

            let err = session.ask(Some("john"), "hello").await.unwrap_err();
            assert!(matches!(err, RecallError::StorageLocked { .. }));

            // The ticker ran while `ask` waited on the lock.
            let ticked_at = ticker.await.unwrap();
            assert!(ticked_at.duration_since(started) < Duration::from_millis(200));
        }

        #[tokio::test]
        async fn test_locked_store_skips_generation() {
            let dir = tempfile::tempdir().unwrap();
            let store = MemoryStore::open(
                StoreConfig::new(dir.path()).with_lock_timeout(Duration::from_millis(20)),
            )
            .unwrap();
            let mock = MockGenerator::new("mock").with_reply("unused");
            let prompts = mock.prompt_log();
            let session = session_with(store, mock, SessionOptions::default());
            let _held = LocationLock::acquire(dir.path(), Duration::from_millis(50)).unwrap();

            assert!(session.ask(None, "hello").await.is_err());
            assert!(prompts.lock().is_empty());
        }
    }

    // ── Comparison ─────────────────────────────────────────────

    mod compare {
        use super::*;

        #[tokio::test]
        async fn test_compare_runs_stateless_then_memory() {
            let (_dir, store) = make_store();
            store.append_memory("john", "John is vegetarian", None).unwrap();
            let mock = MockGenerator::new("mock")
                .with_reply("Have a steak.")
                .with_reply("Try a lentil curry.");
            let prompts = mock.prompt_log();
            let session = session_with(store, mock, SessionOptions::default());

            let cmp = session.compare(Some("john"), "vegetarian dinner?").await.unwrap();
            assert_eq!(cmp.stateless, Reply::Text("Have a steak.".into()));
            assert_eq!(cmp.with_memory.reply, Reply::Text("Try a lentil curry.".into()));

            let sent = prompts.lock().clone();
            assert_eq!(sent[0], "vegetarian dinner?");
            assert!(sent[1].contains("- John is vegetarian"));
        }

        #[tokio::test]
        async fn test_comparison_serializes() {
            let (_dir, store) = make_store();
            let mock = MockGenerator::new("mock").with_reply("a").with_error("b");
            let session = session_with(store, mock, SessionOptions::default());
            let cmp = session.compare(None, "q").await.unwrap();

            let json = serde_json::to_value(&cmp).unwrap();
            assert_eq!(json["stateless"]["status"], "text");
            assert_eq!(json["with_memory"]["reply"]["status"], "failed");
            assert_eq!(json["with_memory"]["user_id"], "default_user");
        }
    }

    // ── Options ────────────────────────────────────────────────

    mod options {
        use super::*;

        #[test]
        fn test_options_from_config() {
            let mut config = RecallConfig::default();
            config.memory.default_user = "alice".into();
            config.memory.search_limit = 3;
            config.memory.record_conversations = true;
            config.generation.timeout_secs = 0;

            let options = SessionOptions::from(&config);
            assert_eq!(options.default_user, "alice");
            assert_eq!(options.search_limit, 3);
            assert!(options.record_conversations);
            assert!(options.generation_timeout.is_none());

            config.generation.timeout_secs = 15;
            let options = SessionOptions::from(&config);
            assert_eq!(options.generation_timeout, Some(Duration::from_secs(15)));
        }
    }
}
