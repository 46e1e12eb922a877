// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only belief change log.
//!
//! Rows are only ever inserted. They are written by the belief mutations in
//! [`crate::queries::beliefs`], inside the same transaction as the mutation.

use rusqlite::params;
use tenet_core::TenetError;

use crate::database::{map_tr_err, Database};
use crate::models::{now_timestamp, timestamp_column, BeliefChange, ChangeType, NewChange};

/// Insert one change row and return its id.
pub(crate) fn insert_change(
    conn: &rusqlite::Connection,
    belief_id: &str,
    change: &NewChange,
) -> Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO belief_changes (belief_id, change_type, detail, episode_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            belief_id,
            change.change_type.as_str(),
            change.detail,
            change.episode_id,
            now_timestamp(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Full change history of one belief, oldest first.
pub async fn history(db: &Database, belief_id: &str) -> Result<Vec<BeliefChange>, TenetError> {
    let belief_id = belief_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<BeliefChange>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, belief_id, change_type, detail, episode_id, created_at
                 FROM belief_changes WHERE belief_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt
                .query_map(params![belief_id], |row| {
                    let change_type: String = row.get(2)?;
                    Ok(BeliefChange {
                        id: row.get(0)?,
                        belief_id: row.get(1)?,
                        change_type: ChangeType::from_str_value(&change_type),
                        detail: row.get(3)?,
                        episode_id: row.get(4)?,
                        created_at: timestamp_column(row, 5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

/// Total number of change rows, across all beliefs.
pub async fn count_changes(db: &Database) -> Result<u64, TenetError> {
    db.connection()
        .call(|conn| -> Result<u64, rusqlite::Error> {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM belief_changes", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
        .map_err(map_tr_err)
}
