// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tenet integration tests.
//!
//! Provides mock model adapters and a temp-database harness for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockChat`] - Mock chat model with queued replies and request capture
//! - [`MockEmbedder`] - Deterministic embedding model with pinnable vectors
//! - [`TestHarness`] - Temp SQLite database plus mocks and config

pub mod harness;
pub mod mock_chat;
pub mod mock_embedder;

pub use harness::TestHarness;
pub use mock_chat::MockChat;
pub use mock_embedder::MockEmbedder;

/// Install a fmt subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
