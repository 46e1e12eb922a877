// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `tenet-core::model` for use across
//! crate boundaries. This module re-exports them for convenience within the
//! storage crate, together with the row-level helpers every query module uses.

use chrono::{DateTime, Utc};

pub use tenet_core::model::{
    format_timestamp, parse_timestamp, Belief, BeliefChange, BeliefStatus, BeliefType,
    ChangeType, Episode, EpisodeKind, KnowledgeChunk, KnowledgeSource, Namespace, NewChange,
};

/// Current time in the storage timestamp layout.
pub fn now_timestamp() -> String {
    format_timestamp(&Utc::now())
}

/// Read a timestamp column, surfacing malformed values as a conversion error.
pub(crate) fn timestamp_column(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Extension trait for optional row queries.
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
