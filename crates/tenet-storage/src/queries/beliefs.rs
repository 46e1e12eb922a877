// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Belief CRUD and lifecycle transitions.
//!
//! Every mutation here writes its change row, and keeps the belief namespace
//! of the vector table in step, inside one transaction.

use rusqlite::params;
use tenet_core::confidence::{assert_confidence, reinforce};
use tenet_core::TenetError;

use crate::database::{map_tr_err, Database};
use crate::models::{
    format_timestamp, now_timestamp, timestamp_column, Belief, BeliefStatus, BeliefType,
    ChangeType, Namespace, NewChange, OptionalExt,
};
use crate::queries::changes::insert_change;
use crate::queries::embeddings::{delete_vector, touch_vector, upsert_vector};
use crate::queries::episodes::link_belief;
use crate::queries::fts_query;

const BELIEF_COLUMNS: &str =
    "id, statement, belief_type, subject, confidence, status, created_at, updated_at, access_count";

fn row_to_belief(row: &rusqlite::Row<'_>) -> Result<Belief, rusqlite::Error> {
    let belief_type: String = row.get(2)?;
    let status: String = row.get(5)?;
    let access_count: i64 = row.get(8)?;
    Ok(Belief {
        id: row.get(0)?,
        statement: row.get(1)?,
        belief_type: BeliefType::from_str_value(&belief_type),
        subject: row.get(3)?,
        confidence: row.get(4)?,
        status: BeliefStatus::from_str_value(&status),
        created_at: timestamp_column(row, 6)?,
        updated_at: timestamp_column(row, 7)?,
        access_count: access_count.max(0) as u32,
    })
}

fn insert_belief_row(conn: &rusqlite::Connection, belief: &Belief) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO beliefs (id, statement, belief_type, subject, confidence, status, created_at, updated_at, access_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            belief.id,
            belief.statement,
            belief.belief_type.as_str(),
            belief.subject,
            belief.confidence,
            belief.status.as_str(),
            format_timestamp(&belief.created_at),
            format_timestamp(&belief.updated_at),
            belief.access_count as i64,
        ],
    )?;
    Ok(())
}

/// Insert a belief with its vector, its change row and the optional episode link.
fn insert_with_vector(
    conn: &rusqlite::Connection,
    belief: &Belief,
    vector: &[f32],
    change: &NewChange,
) -> Result<(), rusqlite::Error> {
    insert_belief_row(conn, belief)?;
    if belief.is_active() {
        upsert_vector(conn, Namespace::Beliefs, &belief.id, vector)?;
    }
    insert_change(conn, &belief.id, change)?;
    if let Some(episode_id) = &change.episode_id {
        link_belief(conn, episode_id, &belief.id)?;
    }
    Ok(())
}

/// Move an active belief to `to`, dropping its vector. Returns false if it was not active.
fn transition_active(
    conn: &rusqlite::Connection,
    id: &str,
    to: BeliefStatus,
    change: &NewChange,
) -> Result<bool, rusqlite::Error> {
    let updated = conn.execute(
        "UPDATE beliefs SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = 'active'",
        params![to.as_str(), now_timestamp(), id],
    )?;
    if updated == 0 {
        return Ok(false);
    }
    insert_change(conn, id, change)?;
    delete_vector(conn, Namespace::Beliefs, id)?;
    Ok(true)
}

fn check_new_belief(belief: &Belief, vector: &[f32]) -> Result<(), TenetError> {
    assert_confidence(belief.confidence);
    if vector.is_empty() {
        return Err(TenetError::Internal(format!(
            "belief {} created with an empty embedding",
            belief.id
        )));
    }
    Ok(())
}

/// Create a belief together with its embedding and its change row, atomically.
///
/// `change.episode_id`, when set, also links the belief to that episode.
pub async fn create_belief(
    db: &Database,
    belief: &Belief,
    vector: Vec<f32>,
    change: NewChange,
) -> Result<(), TenetError> {
    check_new_belief(belief, &vector)?;
    let belief = belief.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            insert_with_vector(&tx, &belief, &vector, &change)?;
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

/// Invalidate `old_id` and create `replacement` in its place, atomically.
///
/// Returns false (and creates nothing) if `old_id` is no longer active.
pub async fn replace_belief(
    db: &Database,
    old_id: &str,
    replacement: &Belief,
    vector: Vec<f32>,
    episode_id: Option<&str>,
) -> Result<bool, TenetError> {
    check_new_belief(replacement, &vector)?;
    let old_id = old_id.to_string();
    let replacement = replacement.clone();
    let episode_id = episode_id.map(str::to_string);
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction()?;
            let invalidate = NewChange::new(ChangeType::Contradicted)
                .with_detail(format!("replaced by {}", replacement.id))
                .with_episode(episode_id.as_deref());
            if !transition_active(&tx, &old_id, BeliefStatus::Invalidated, &invalidate)? {
                return Ok(false);
            }
            let created = NewChange::new(ChangeType::Created)
                .with_detail(format!("replaces {old_id}"))
                .with_episode(episode_id.as_deref());
            insert_with_vector(&tx, &replacement, &vector, &created)?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

/// Apply one saturating reinforcement step to an active belief.
///
/// Bumps `updated_at` and `access_count`, writes a "reinforced" change row and
/// links the episode when given. Returns the new confidence, or `None` when the
/// belief is unknown or not active.
pub async fn reinforce_belief(
    db: &Database,
    id: &str,
    step: f64,
    episode_id: Option<&str>,
) -> Result<Option<f64>, TenetError> {
    let id = id.to_string();
    let episode_id = episode_id.map(str::to_string);
    db.connection()
        .call(move |conn| -> Result<Option<f64>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let old: Option<f64> = tx
                .query_row(
                    "SELECT confidence FROM beliefs WHERE id = ?1 AND status = 'active'",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(old) = old else {
                return Ok(None);
            };
            let new = reinforce(old, step);
            let now = now_timestamp();
            tx.execute(
                "UPDATE beliefs SET confidence = ?1, updated_at = ?2, access_count = access_count + 1
                 WHERE id = ?3",
                params![new, now, id],
            )?;
            touch_vector(&tx, Namespace::Beliefs, &id, &now)?;
            let change = NewChange::new(ChangeType::Reinforced)
                .with_detail(format!("confidence {old:.3} -> {new:.3}"))
                .with_episode(episode_id.as_deref());
            insert_change(&tx, &id, &change)?;
            if let Some(episode_id) = &episode_id {
                link_belief(&tx, episode_id, &id)?;
            }
            tx.commit()?;
            Ok(Some(new))
        })
        .await
        .map_err(map_tr_err)
}

/// Move an active belief to another status, recording `change`.
///
/// Returns false when the belief is unknown or already inactive; nothing is written then.
pub async fn transition_belief(
    db: &Database,
    id: &str,
    to: BeliefStatus,
    change: NewChange,
) -> Result<bool, TenetError> {
    assert!(to != BeliefStatus::Active, "cannot transition a belief back to active");
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction()?;
            let moved = transition_active(&tx, &id, to, &change)?;
            tx.commit()?;
            Ok(moved)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a belief by id, whatever its status.
pub async fn get_belief(db: &Database, id: &str) -> Result<Option<Belief>, TenetError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Belief>, rusqlite::Error> {
            let sql = format!("SELECT {BELIEF_COLUMNS} FROM beliefs WHERE id = ?1");
            conn.query_row(&sql, params![id], row_to_belief).optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Get beliefs by ids (any status), in no particular order. Unknown ids are skipped.
pub async fn get_beliefs_by_ids(db: &Database, ids: &[String]) -> Result<Vec<Belief>, TenetError> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| -> Result<Vec<Belief>, rusqlite::Error> {
            let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
            let sql = format!(
                "SELECT {BELIEF_COLUMNS} FROM beliefs WHERE id IN ({})",
                placeholders.join(", ")
            );
            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> =
                ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();
            let beliefs = stmt
                .query_map(params.as_slice(), row_to_belief)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(beliefs)
        })
        .await
        .map_err(map_tr_err)
}

/// List beliefs, optionally filtered by status, most recently updated first.
pub async fn list_beliefs(
    db: &Database,
    status: Option<BeliefStatus>,
) -> Result<Vec<Belief>, TenetError> {
    db.connection()
        .call(move |conn| -> Result<Vec<Belief>, rusqlite::Error> {
            let beliefs = match status {
                Some(status) => {
                    let sql = format!(
                        "SELECT {BELIEF_COLUMNS} FROM beliefs WHERE status = ?1
                         ORDER BY updated_at DESC, id ASC"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    stmt.query_map(params![status.as_str()], row_to_belief)?
                        .collect::<Result<Vec<_>, _>>()?
                }
                None => {
                    let sql = format!(
                        "SELECT {BELIEF_COLUMNS} FROM beliefs ORDER BY updated_at DESC, id ASC"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    stmt.query_map([], row_to_belief)?
                        .collect::<Result<Vec<_>, _>>()?
                }
            };
            Ok(beliefs)
        })
        .await
        .map_err(map_tr_err)
}

/// Full-text search over active belief statements.
///
/// Returns `(belief_id, bm25_score)` pairs, most relevant first. BM25 scores
/// are negative (more negative = more relevant).
pub async fn search_beliefs_fts(
    db: &Database,
    text: &str,
    limit: usize,
) -> Result<Vec<(String, f64)>, TenetError> {
    let Some(query) = fts_query(text) else {
        return Ok(vec![]);
    };
    db.connection()
        .call(move |conn| -> Result<Vec<(String, f64)>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT b.id, bm25(beliefs_fts) AS score FROM beliefs_fts
                 JOIN beliefs b ON b.rowid = beliefs_fts.rowid
                 WHERE beliefs_fts MATCH ?1 AND b.status = 'active'
                 ORDER BY score LIMIT ?2",
            )?;
            let results = stmt
                .query_map(params![query, limit as i64], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(results)
        })
        .await
        .map_err(map_tr_err)
}

/// Substring search over active belief statements, case-insensitive for ASCII.
pub async fn search_beliefs_like(
    db: &Database,
    text: &str,
    limit: usize,
) -> Result<Vec<Belief>, TenetError> {
    let needle = text.trim().to_string();
    if needle.is_empty() {
        return Ok(vec![]);
    }
    db.connection()
        .call(move |conn| -> Result<Vec<Belief>, rusqlite::Error> {
            let escaped = needle
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            let sql = format!(
                "SELECT {BELIEF_COLUMNS} FROM beliefs
                 WHERE status = 'active' AND statement LIKE ?1 ESCAPE '\\'
                 ORDER BY confidence DESC, updated_at DESC LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let beliefs = stmt
                .query_map(params![format!("%{escaped}%"), limit as i64], row_to_belief)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(beliefs)
        })
        .await
        .map_err(map_tr_err)
}

/// Increment `access_count` for beliefs returned by a recall.
///
/// Access bookkeeping is not a lifecycle mutation: no change row, `updated_at` untouched.
pub async fn record_access(db: &Database, ids: &[String]) -> Result<(), TenetError> {
    if ids.is_empty() {
        return Ok(());
    }
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "UPDATE beliefs SET access_count = access_count + 1 WHERE id = ?1",
                )?;
                for id in &ids {
                    stmt.execute(params![id])?;
                }
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

/// Number of beliefs per status. Every status appears, with zero when empty.
pub async fn count_by_status(db: &Database) -> Result<Vec<(BeliefStatus, u64)>, TenetError> {
    db.connection()
        .call(|conn| -> Result<Vec<(BeliefStatus, u64)>, rusqlite::Error> {
            let mut stmt =
                conn.prepare("SELECT status, COUNT(*) FROM beliefs GROUP BY status")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            let counts = BeliefStatus::ALL
                .iter()
                .map(|status| {
                    let n = rows
                        .iter()
                        .find(|(s, _)| s == status.as_str())
                        .map(|(_, n)| *n as u64)
                        .unwrap_or(0);
                    (*status, n)
                })
                .collect();
            Ok(counts)
        })
        .await
        .map_err(map_tr_err)
}
