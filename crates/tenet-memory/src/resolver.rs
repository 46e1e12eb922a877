// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contradiction classifier.
//!
//! The model sees only the new statement and the numbered candidates. Its
//! reply must be exactly one of `1..=N` or `NONE`; everything else is
//! treated as `NONE` so an ambiguous answer never invalidates a belief.

use std::sync::Arc;

use tenet_config::model::MemoryConfig;
use tenet_core::{ChatAdapter, ChatMessage};
use tracing::{debug, warn};

use crate::llm::chat_with_timeout;
use crate::recording::record_fallback;

const RESOLVER_PROMPT: &str = "You decide whether a new statement contradicts one of several \
existing statements about the same person. Two statements contradict when both cannot be true \
at the same time. Reply with only the number of the contradicted statement, or NONE.";

/// Classifier verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Zero-based index of the contradicted candidate.
    Contradicts(usize),
    None,
}

/// Asks the model which candidate, if any, a statement contradicts.
pub struct ContradictionResolver {
    chat: Arc<dyn ChatAdapter>,
    config: MemoryConfig,
}

impl ContradictionResolver {
    pub fn new(chat: Arc<dyn ChatAdapter>, config: MemoryConfig) -> Self {
        Self { chat, config }
    }

    /// Classify `statement` against `candidates`, in the given order.
    ///
    /// Provider failures and timeouts yield [`Verdict::None`].
    pub async fn check(&self, statement: &str, candidates: &[String]) -> Verdict {
        if candidates.is_empty() {
            return Verdict::None;
        }
        let messages = vec![
            ChatMessage::system(RESOLVER_PROMPT),
            ChatMessage::user(build_prompt(statement, candidates)),
        ];
        let reply = chat_with_timeout(
            self.chat.as_ref(),
            messages,
            self.config.classifier_options(),
            self.config.model_timeout(),
        )
        .await;

        match reply {
            Ok(reply) => {
                let verdict = parse_verdict(&reply, candidates.len());
                debug!(?verdict, reply = reply.trim(), "contradiction verdict");
                verdict
            }
            Err(e) => {
                warn!(error = %e, "contradiction check failed, assuming NONE");
                record_fallback("contradiction");
                Verdict::None
            }
        }
    }
}

fn build_prompt(statement: &str, candidates: &[String]) -> String {
    let mut prompt = String::from("Existing statements:\n");
    for (i, candidate) in candidates.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, candidate));
    }
    prompt.push_str(&format!("\nNew statement: {statement}\n\nAnswer:"));
    prompt
}

/// Parse a classifier reply against `n` candidates.
///
/// Only surrounding whitespace and one trailing period are tolerated.
pub fn parse_verdict(reply: &str, n: usize) -> Verdict {
    let trimmed = reply.trim();
    let token = trimmed.strip_suffix('.').unwrap_or(trimmed);
    if token == "NONE" {
        return Verdict::None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) || token.starts_with('0') {
        return Verdict::None;
    }
    match token.parse::<usize>() {
        Ok(i) if (1..=n).contains(&i) => Verdict::Contradicts(i - 1),
        _ => Verdict::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tenet_test_utils::MockChat;

    #[test]
    fn accepts_in_range_numbers() {
        assert_eq!(parse_verdict("1", 3), Verdict::Contradicts(0));
        assert_eq!(parse_verdict(" 3.\n", 3), Verdict::Contradicts(2));
        assert_eq!(parse_verdict("NONE", 3), Verdict::None);
    }

    #[test]
    fn rejects_everything_else() {
        for reply in ["4", "0", "01", "none", "1, 2", "Statement 1", "", "-1", "1.."] {
            assert_eq!(parse_verdict(reply, 3), Verdict::None, "reply {reply:?}");
        }
    }

    #[test]
    fn prompt_numbers_candidates_from_one() {
        let prompt = build_prompt("SQLite is fast", &["SQLite is slow".into()]);
        assert!(prompt.contains("1. SQLite is slow"));
        assert!(prompt.contains("New statement: SQLite is fast"));
    }

    #[tokio::test]
    async fn provider_failure_is_none() {
        let chat = MockChat::new();
        chat.set_failing(true);
        let resolver = ContradictionResolver::new(Arc::new(chat), MemoryConfig::default());
        assert_eq!(resolver.check("a", &["b".into()]).await, Verdict::None);
    }

    #[tokio::test]
    async fn classifier_runs_at_zero_temperature() {
        let chat = Arc::new(MockChat::with_responses(vec!["1"]));
        let resolver = ContradictionResolver::new(chat.clone(), MemoryConfig::default());
        assert_eq!(resolver.check("a", &["b".into()]).await, Verdict::Contradicts(0));
        assert_eq!(chat.options()[0].temperature, 0.0);
    }

    proptest! {
        #[test]
        fn arbitrary_text_never_escapes_range(reply in ".{0,12}", n in 0usize..6) {
            match parse_verdict(&reply, n) {
                Verdict::Contradicts(i) => prop_assert!(i < n),
                Verdict::None => {}
            }
        }
    }
}
