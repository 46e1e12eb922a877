// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.
//!
//! Async functions take `&Database` and run one closure on the writer thread.
//! The `pub(crate)` synchronous helpers take a `&rusqlite::Connection` so that
//! multi-row writes compose inside a single transaction.

pub mod beliefs;
pub mod changes;
pub mod embeddings;
pub mod episodes;
pub mod knowledge;

/// Build an FTS5 `MATCH` expression from free text.
///
/// Each alphanumeric token is quoted and the tokens are OR-joined, so user
/// input can never inject FTS5 operators. Returns `None` when no token remains.
pub fn fts_query(text: &str) -> Option<String> {
    let tokens: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t.to_lowercase()))
        .collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" OR "))
    }
}
