// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tenet belief memory engine.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Tenet workspace. The language model is
//! consumed only through [`ChatAdapter`] and [`EmbeddingAdapter`].

pub mod confidence;
pub mod error;
pub mod model;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TenetError;
pub use model::{
    Belief, BeliefChange, BeliefStatus, BeliefType, ChangeType, Episode, EpisodeKind,
    KnowledgeChunk, KnowledgeSource, Namespace, NewChange,
};
pub use types::{ChatMessage, ChatOptions};

pub use traits::{ChatAdapter, EmbeddingAdapter, PluginAdapter};
