// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the external capabilities the engine consumes.
//!
//! Both adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod chat;
pub mod embedding;

pub use adapter::PluginAdapter;
pub use chat::ChatAdapter;
pub use embedding::EmbeddingAdapter;
