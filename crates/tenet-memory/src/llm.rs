// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deadline-bounded calls to the chat and embedding capabilities.
//!
//! Every model call in the engine goes through these helpers, so a hung
//! provider surfaces as `TenetError::Timeout` and the calling stage can take
//! its fallback.

use std::time::Duration;

use tenet_core::types::EmbeddingInput;
use tenet_core::{ChatAdapter, ChatMessage, ChatOptions, EmbeddingAdapter, TenetError};

/// Run one chat completion under `timeout`.
pub async fn chat_with_timeout(
    chat: &dyn ChatAdapter,
    messages: Vec<ChatMessage>,
    options: ChatOptions,
    timeout: Duration,
) -> Result<String, TenetError> {
    match tokio::time::timeout(timeout, chat.chat(messages, options)).await {
        Ok(result) => result,
        Err(_) => Err(TenetError::Timeout { duration: timeout }),
    }
}

/// Embed a single text under `timeout`.
///
/// An empty response or an empty vector counts as a provider failure.
pub async fn embed_one(
    embedder: &dyn EmbeddingAdapter,
    text: &str,
    timeout: Duration,
) -> Result<Vec<f32>, TenetError> {
    let input = EmbeddingInput {
        texts: vec![text.to_string()],
    };
    let output = match tokio::time::timeout(timeout, embedder.embed(input)).await {
        Ok(result) => result?,
        Err(_) => return Err(TenetError::Timeout { duration: timeout }),
    };
    output
        .embeddings
        .into_iter()
        .next()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| TenetError::provider("embedding returned no vector"))
}
