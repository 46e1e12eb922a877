// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat adapter trait: the language-model capability used for extraction,
//! contradiction judgment, summarization and synthesis.

use async_trait::async_trait;

use crate::error::TenetError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChatMessage, ChatOptions};

/// Adapter for a chat-completion language model.
///
/// Failures are ordinary `Err` values; every caller in the memory engine
/// degrades to a documented default instead of propagating them.
#[async_trait]
pub trait ChatAdapter: PluginAdapter {
    /// Sends the messages and returns the full response text.
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
    ) -> Result<String, TenetError>;
}
