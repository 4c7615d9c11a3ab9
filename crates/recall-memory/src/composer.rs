//! Prompt assembly: ranked memories + the user's query → one generation payload.

use crate::ranker::ScoredMemory;

const PREAMBLE: &str = "Based on the following context about the user, please provide a personalized and relevant response:";
const CONTEXT_HEADER: &str = "Here's what you know about the user from previous conversations:";
const INSTRUCTION: &str = "Please respond in a natural, conversational way that incorporates relevant details from the context to make your response more personal and helpful.";

/// Render memories as a numbered list, one per line, in the given order.
pub fn render_context(memories: &[ScoredMemory]) -> String {
    let mut context = format!("{CONTEXT_HEADER}\n\n");
    for (i, m) in memories.iter().enumerate() {
        context.push_str(&format!("{}. {}\n", i + 1, m.memory));
    }
    context
}

/// Build the generation payload. With no memories the query is returned as-is.
pub fn compose(query: &str, memories: &[ScoredMemory]) -> String {
    if memories.is_empty() {
        return query.to_string();
    }
    let context = render_context(memories);
    format!("{PREAMBLE}\n\nCONTEXT:\n{context}\n\nUSER QUERY: {query}\n\n{INSTRUCTION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(memory: &str, score: usize) -> ScoredMemory {
        ScoredMemory {
            memory: memory.into(),
            score,
            timestamp: "2024-01-01T00:00:00".into(),
        }
    }

    #[test]
    fn test_no_memories_is_identity() {
        for q in ["", "hello", "  spaced  ", "multi\nline {braces}"] {
            assert_eq!(compose(q, &[]), q);
        }
    }

    #[test]
    fn test_order_preserved() {
        let payload = compose("q", &[scored("m1 text", 3), scored("m2 text", 1)]);
        let first = payload.find("1. m1 text").unwrap();
        let second = payload.find("2. m2 text").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_does_not_resort() {
        let payload = compose("q", &[scored("low", 1), scored("high", 9)]);
        assert!(payload.contains("1. low\n2. high\n"));
    }

    #[test]
    fn test_full_layout() {
        let payload = compose("What should I do?", &[scored("John lives in Nuremberg", 1)]);
        let expected = "Based on the following context about the user, please provide a personalized and relevant response:\n\
\n\
CONTEXT:\n\
Here's what you know about the user from previous conversations:\n\
\n\
1. John lives in Nuremberg\n\
\n\
\n\
USER QUERY: What should I do?\n\
\n\
Please respond in a natural, conversational way that incorporates relevant details from the context to make your response more personal and helpful.";
        assert_eq!(payload, expected);
    }

    #[test]
    fn test_verbatim_embedding() {
        let query = "quote \" and {braces} and\nnewline";
        let payload = compose(query, &[scored("<b>tag</b> & 100%", 1)]);
        assert!(payload.contains(query));
        assert!(payload.contains("1. <b>tag</b> & 100%"));
    }
}
