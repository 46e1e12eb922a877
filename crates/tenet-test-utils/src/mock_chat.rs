// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat adapter for deterministic testing.
//!
//! `MockChat` implements `ChatAdapter` with pre-configured replies and
//! records every request, so tests can assert on prompts and options
//! without a model behind them.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use tenet_core::types::{ChatMessage, ChatOptions};
use tenet_core::{ChatAdapter, PluginAdapter, TenetError};

/// A mock chat model that returns queued replies.
///
/// Replies are popped from a FIFO queue. An empty queue behaves like an
/// unavailable provider and returns an error.
#[derive(Default)]
pub struct MockChat {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<(Vec<ChatMessage>, ChatOptions)>>,
    failing: AtomicBool,
    hanging: AtomicBool,
}

impl MockChat {
    /// Create a mock with an empty reply queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock pre-loaded with the given replies.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chat = Self::new();
        for response in responses {
            chat.push_response(response);
        }
        chat
    }

    /// Add a reply to the end of the queue.
    pub fn push_response(&self, text: impl Into<String>) {
        lock(&self.responses).push_back(text.into());
    }

    /// Make every call fail with a provider error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make every call wait forever. Pair with a timeout.
    pub fn hang(&self) {
        self.hanging.store(true, Ordering::SeqCst);
    }

    /// Messages of every call received so far, in call order.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        lock(&self.requests).iter().map(|(m, _)| m.clone()).collect()
    }

    /// Options of every call received so far, in call order.
    pub fn options(&self) -> Vec<ChatOptions> {
        lock(&self.requests).iter().map(|(_, o)| o.clone()).collect()
    }

    /// Replies still queued.
    pub fn pending(&self) -> usize {
        lock(&self.responses).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl PluginAdapter for MockChat {
    fn name(&self) -> &str {
        "mock-chat"
    }
}

#[async_trait]
impl ChatAdapter for MockChat {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
    ) -> Result<String, TenetError> {
        lock(&self.requests).push((messages, options));

        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(TenetError::provider("mock chat configured to fail"));
        }
        lock(&self.responses)
            .pop_front()
            .ok_or_else(|| TenetError::provider("mock chat has no queued response"))
    }
}
