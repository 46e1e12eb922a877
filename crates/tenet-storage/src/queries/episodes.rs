// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Episode log operations.

use rusqlite::params;
use tenet_core::TenetError;

use crate::database::{map_tr_err, Database};
use crate::models::{
    format_timestamp, timestamp_column, Episode, EpisodeKind, Namespace, OptionalExt,
};
use crate::queries::embeddings::upsert_vector;

fn row_to_episode(row: &rusqlite::Row<'_>) -> Result<Episode, rusqlite::Error> {
    let kind: String = row.get(3)?;
    Ok(Episode {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        content: row.get(2)?,
        kind: EpisodeKind::from_str_value(&kind),
        created_at: timestamp_column(row, 4)?,
    })
}

/// Link a belief to the episode that produced or reinforced it. Repeat links are ignored.
pub(crate) fn link_belief(
    conn: &rusqlite::Connection,
    episode_id: &str,
    belief_id: &str,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR IGNORE INTO episode_beliefs (episode_id, belief_id) VALUES (?1, ?2)",
        params![episode_id, belief_id],
    )?;
    Ok(())
}

/// Append an episode, with its embedding when one is available.
pub async fn create_episode(
    db: &Database,
    episode: &Episode,
    vector: Option<Vec<f32>>,
) -> Result<(), TenetError> {
    let episode = episode.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO episodes (id, thread_id, content, kind, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    episode.id,
                    episode.thread_id,
                    episode.content,
                    episode.kind.as_str(),
                    format_timestamp(&episode.created_at),
                ],
            )?;
            if let Some(vector) = vector.filter(|v| !v.is_empty()) {
                upsert_vector(&tx, Namespace::Episodes, &episode.id, &vector)?;
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

/// Get an episode by id.
pub async fn get_episode(db: &Database, id: &str) -> Result<Option<Episode>, TenetError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Episode>, rusqlite::Error> {
            conn.query_row(
                "SELECT id, thread_id, content, kind, created_at FROM episodes WHERE id = ?1",
                params![id],
                row_to_episode,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent episodes first, optionally restricted to one thread.
pub async fn list_episodes(
    db: &Database,
    thread_id: Option<&str>,
    limit: usize,
) -> Result<Vec<Episode>, TenetError> {
    let thread_id = thread_id.map(str::to_string);
    db.connection()
        .call(move |conn| -> Result<Vec<Episode>, rusqlite::Error> {
            let episodes = match &thread_id {
                Some(thread) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, thread_id, content, kind, created_at FROM episodes
                         WHERE thread_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
                    )?;
                    stmt.query_map(params![thread, limit as i64], row_to_episode)?
                        .collect::<Result<Vec<_>, _>>()?
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, thread_id, content, kind, created_at FROM episodes
                         ORDER BY created_at DESC, rowid DESC LIMIT ?1",
                    )?;
                    stmt.query_map(params![limit as i64], row_to_episode)?
                        .collect::<Result<Vec<_>, _>>()?
                }
            };
            Ok(episodes)
        })
        .await
        .map_err(map_tr_err)
}

/// Ids of the beliefs linked to an episode.
pub async fn beliefs_for_episode(
    db: &Database,
    episode_id: &str,
) -> Result<Vec<String>, TenetError> {
    let episode_id = episode_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT belief_id FROM episode_beliefs WHERE episode_id = ?1 ORDER BY belief_id",
            )?;
            let ids = stmt
                .query_map(params![episode_id], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(ids)
        })
        .await
        .map_err(map_tr_err)
}

/// Episodes linked to a belief, oldest first.
pub async fn episodes_for_belief(
    db: &Database,
    belief_id: &str,
) -> Result<Vec<Episode>, TenetError> {
    let belief_id = belief_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<Episode>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT e.id, e.thread_id, e.content, e.kind, e.created_at
                 FROM episodes e JOIN episode_beliefs l ON l.episode_id = e.id
                 WHERE l.belief_id = ?1 ORDER BY e.created_at ASC, e.rowid ASC",
            )?;
            let episodes = stmt
                .query_map(params![belief_id], row_to_episode)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(episodes)
        })
        .await
        .map_err(map_tr_err)
}
