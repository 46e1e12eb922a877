// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge base over learned external documents.

pub mod base;
pub mod chunker;
pub mod source_url;

pub use base::KnowledgeBase;
pub use chunker::chunk_content;
pub use source_url::normalize_url;
