// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model-based extraction of belief statements from raw text.
//!
//! One chat call turns an observation into a fact and an optional insight.
//! The reply is parsed into a tagged [`Extraction`]; anything that does not
//! fit the contract degrades to [`Extraction::Raw`] and never fails.

use std::sync::Arc;

use serde::Deserialize;
use tenet_config::model::MemoryConfig;
use tenet_core::model::DEFAULT_SUBJECT;
use tenet_core::{BeliefType, ChatAdapter, ChatMessage};
use tracing::{debug, warn};

use crate::llm::chat_with_timeout;
use crate::merge::Proposal;
use crate::recording::record_fallback;

/// System prompt for belief extraction.
const EXTRACTION_PROMPT: &str = r#"You turn a single observation about a person into durable beliefs.

Reply with one JSON object and nothing else:
{"fact": "...", "insight": "..." or null, "type": "...", "subject": "..."}

- "fact": the observation restated as one standalone sentence.
- "insight": a higher-level inference the fact supports, or null if there is none.
- "type": one of factual, preference, procedural, architectural.
- "subject": who the fact is about; "owner" for the person speaking."#;

/// Parsed model output for one observation.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// The reply matched the JSON contract.
    Structured {
        fact: String,
        insight: Option<String>,
        belief_type: BeliefType,
        subject: String,
    },
    /// The reply (or the input, when the model was unavailable) used as the fact.
    Raw { text: String },
}

impl Extraction {
    /// Proposals for the merge engine: the fact, then the insight.
    ///
    /// Empty statements yield no proposal. Insights are typed `insight` and
    /// carry the lower insight confidence.
    pub fn into_proposals(self, config: &MemoryConfig) -> (Option<Proposal>, Option<Proposal>) {
        match self {
            Extraction::Structured {
                fact,
                insight,
                belief_type,
                subject,
            } => {
                let fact = non_empty(&fact).map(|statement| Proposal {
                    statement,
                    belief_type,
                    subject: subject.clone(),
                    confidence: config.initial_confidence,
                });
                let insight = insight.as_deref().and_then(non_empty).map(|statement| Proposal {
                    statement,
                    belief_type: BeliefType::Insight,
                    subject,
                    confidence: config.insight_confidence,
                });
                (fact, insight)
            }
            Extraction::Raw { text } => {
                let fact = non_empty(&text).map(|statement| Proposal {
                    statement,
                    belief_type: BeliefType::Factual,
                    subject: DEFAULT_SUBJECT.to_string(),
                    confidence: config.initial_confidence,
                });
                (fact, None)
            }
        }
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Deserialize)]
struct ExtractionReply {
    fact: Option<String>,
    #[serde(default)]
    insight: Option<String>,
    #[serde(default, rename = "type")]
    belief_type: Option<String>,
    #[serde(default)]
    subject: Option<String>,
}

/// Turns observations into candidate belief statements.
pub struct BeliefExtractor {
    chat: Arc<dyn ChatAdapter>,
    config: MemoryConfig,
}

impl BeliefExtractor {
    pub fn new(chat: Arc<dyn ChatAdapter>, config: MemoryConfig) -> Self {
        Self { chat, config }
    }

    /// Extract a fact and optional insight from `raw`.
    ///
    /// Provider failures and timeouts fall back to the prefix-stripped input.
    pub async fn extract(&self, raw: &str) -> Extraction {
        let text = strip_remember_prefix(raw);
        let messages = vec![ChatMessage::system(EXTRACTION_PROMPT), ChatMessage::user(text)];
        let reply = chat_with_timeout(
            self.chat.as_ref(),
            messages,
            self.config.chat_options(),
            self.config.model_timeout(),
        )
        .await;

        match reply {
            Ok(reply) => parse_extraction(&reply),
            Err(e) => {
                warn!(error = %e, "extraction call failed, using raw text as fact");
                record_fallback("extraction");
                Extraction::Raw {
                    text: text.to_string(),
                }
            }
        }
    }
}

/// Parse an extraction reply.
///
/// Tolerates surrounding prose and markdown code fences. A reply that does not
/// hold a JSON object with a string `fact` becomes `Raw` over the trimmed reply.
pub fn parse_extraction(reply: &str) -> Extraction {
    let trimmed = reply.trim();
    let parsed = find_json_object(trimmed)
        .ok_or_else(|| "no JSON object in reply".to_string())
        .and_then(|json| {
            serde_json::from_str::<ExtractionReply>(json).map_err(|e| e.to_string())
        });

    match parsed {
        Ok(ExtractionReply {
            fact: Some(fact),
            insight,
            belief_type,
            subject,
        }) => Extraction::Structured {
            fact: fact.trim().to_string(),
            insight: insight.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            belief_type: belief_type
                .as_deref()
                .map(BeliefType::from_str_value)
                .unwrap_or(BeliefType::Factual),
            subject: subject
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
        },
        Ok(_) => {
            warn!("extraction reply has no fact, using it as raw text");
            Extraction::Raw {
                text: trimmed.to_string(),
            }
        }
        Err(e) => {
            warn!(error = %e, "malformed extraction reply, using it as raw text");
            debug!(reply, "raw extraction reply");
            Extraction::Raw {
                text: trimmed.to_string(),
            }
        }
    }
}

/// The outermost `{...}` span, ignoring code fences and prose around it.
fn find_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Strip "remember this:", "remember that", etc. prefixes from explicit memory text.
pub fn strip_remember_prefix(text: &str) -> &str {
    let trimmed = text.trim();
    let prefixes = [
        "remember this:",
        "remember that:",
        "remember:",
        "remember this ",
        "remember that ",
    ];

    for prefix in &prefixes {
        let matches = trimmed
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
        if matches {
            return trimmed[prefix.len()..].trim();
        }
    }

    trimmed
}
