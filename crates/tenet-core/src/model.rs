// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain entities shared by the storage layer and the memory engine.
//!
//! Beliefs are never hard-deleted: every lifecycle step is a status change
//! recorded as a [`BeliefChange`] row.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::confidence::assert_confidence;

/// Timestamp layout used for every persisted time value.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Subject assigned to beliefs when extraction does not name one.
pub const DEFAULT_SUBJECT: &str = "owner";

/// Format a UTC timestamp for storage.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp. Accepts the storage layout and plain RFC 3339.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
        Ok(naive) => Ok(naive.and_utc()),
        Err(_) => DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)),
    }
}

/// A durable, confidence-weighted statement held about a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Belief {
    pub id: String,
    pub statement: String,
    pub belief_type: BeliefType,
    /// Free-text subject, "owner" unless extraction names another.
    pub subject: String,
    /// Stored confidence in [0, 1], before decay.
    pub confidence: f64,
    pub status: BeliefStatus,
    pub created_at: DateTime<Utc>,
    /// Last creation or reinforcement time; decay is measured from here.
    pub updated_at: DateTime<Utc>,
    pub access_count: u32,
}

impl Belief {
    /// Build a fresh active belief with a new v4 id.
    ///
    /// Panics if `confidence` is outside [0, 1].
    pub fn new(
        statement: impl Into<String>,
        confidence: f64,
        belief_type: BeliefType,
        subject: impl Into<String>,
    ) -> Self {
        assert_confidence(confidence);
        let now = Utc::now();
        Self {
            id: uuid_v4(),
            statement: statement.into(),
            belief_type,
            subject: subject.into(),
            confidence,
            status: BeliefStatus::Active,
            created_at: now,
            updated_at: now,
            access_count: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == BeliefStatus::Active
    }
}

/// Category of a belief.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeliefType {
    Factual,
    Preference,
    Procedural,
    Architectural,
    Insight,
    /// Synthesized from a pattern across other beliefs.
    Meta,
}

impl BeliefType {
    /// Convert to string for SQLite storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            BeliefType::Factual => "factual",
            BeliefType::Preference => "preference",
            BeliefType::Procedural => "procedural",
            BeliefType::Architectural => "architectural",
            BeliefType::Insight => "insight",
            BeliefType::Meta => "meta",
        }
    }

    /// Parse from SQLite or model output. Unknown values map to `Factual`.
    pub fn from_str_value(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "preference" => BeliefType::Preference,
            "procedural" => BeliefType::Procedural,
            "architectural" => BeliefType::Architectural,
            "insight" => BeliefType::Insight,
            "meta" => BeliefType::Meta,
            _ => BeliefType::Factual,
        }
    }
}

/// Lifecycle status of a belief.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeliefStatus {
    /// Available for retrieval, reinforcement and contradiction.
    Active,
    /// Replaced by a contradicting statement.
    Invalidated,
    /// Explicitly forgotten, or lost a duplicate merge.
    Forgotten,
    /// Decayed below the prune threshold.
    Pruned,
}

impl BeliefStatus {
    pub const ALL: [BeliefStatus; 4] = [
        BeliefStatus::Active,
        BeliefStatus::Invalidated,
        BeliefStatus::Forgotten,
        BeliefStatus::Pruned,
    ];

    /// Convert to string for SQLite storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            BeliefStatus::Active => "active",
            BeliefStatus::Invalidated => "invalidated",
            BeliefStatus::Forgotten => "forgotten",
            BeliefStatus::Pruned => "pruned",
        }
    }

    /// Parse from SQLite string.
    pub fn from_str_value(s: &str) -> Self {
        match s {
            "invalidated" => BeliefStatus::Invalidated,
            "forgotten" => BeliefStatus::Forgotten,
            "pruned" => BeliefStatus::Pruned,
            _ => BeliefStatus::Active,
        }
    }
}

/// Kind of mutation recorded in the belief audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Created,
    Reinforced,
    Contradicted,
    Merged,
    Pruned,
    /// Explicit `forget` by the caller.
    Forgotten,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Created => "created",
            ChangeType::Reinforced => "reinforced",
            ChangeType::Contradicted => "contradicted",
            ChangeType::Merged => "merged",
            ChangeType::Pruned => "pruned",
            ChangeType::Forgotten => "forgotten",
        }
    }

    pub fn from_str_value(s: &str) -> Self {
        match s {
            "reinforced" => ChangeType::Reinforced,
            "contradicted" => ChangeType::Contradicted,
            "merged" => ChangeType::Merged,
            "pruned" => ChangeType::Pruned,
            "forgotten" => ChangeType::Forgotten,
            _ => ChangeType::Created,
        }
    }
}

/// One append-only audit row. Every belief mutation writes exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefChange {
    pub id: i64,
    pub belief_id: String,
    pub change_type: ChangeType,
    pub detail: Option<String>,
    pub episode_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A change row about to be written, before the database assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChange {
    pub change_type: ChangeType,
    pub detail: Option<String>,
    pub episode_id: Option<String>,
}

impl NewChange {
    pub fn new(change_type: ChangeType) -> Self {
        Self {
            change_type,
            detail: None,
            episode_id: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_episode(mut self, episode_id: Option<&str>) -> Self {
        self.episode_id = episode_id.map(str::to_string);
        self
    }
}

/// Scan domain of the vector store. Each namespace is searched independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    Beliefs,
    Episodes,
    Knowledge,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Beliefs => "beliefs",
            Namespace::Episodes => "episodes",
            Namespace::Knowledge => "knowledge",
        }
    }
}

/// How an episode entered the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeKind {
    /// A raw observation passed to `remember`.
    Observation,
    /// A consolidation summary of several conversation turns.
    Summary,
}

impl EpisodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeKind::Observation => "observation",
            EpisodeKind::Summary => "summary",
        }
    }

    pub fn from_str_value(s: &str) -> Self {
        match s {
            "summary" => EpisodeKind::Summary,
            _ => EpisodeKind::Observation,
        }
    }
}

/// An append-only observation or conversation-derived event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: String,
    /// Conversation thread the episode came from.
    pub thread_id: String,
    pub content: String,
    pub kind: EpisodeKind,
    pub created_at: DateTime<Utc>,
}

impl Episode {
    pub fn new(thread_id: impl Into<String>, content: impl Into<String>, kind: EpisodeKind) -> Self {
        Self {
            id: uuid_v4(),
            thread_id: thread_id.into(),
            content: content.into(),
            kind,
            created_at: Utc::now(),
        }
    }
}

/// A learned external document, keyed by its normalized url.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSource {
    pub id: String,
    pub url: String,
    pub title: String,
    pub learned_at: DateTime<Utc>,
}

/// One ordered slice of a knowledge source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub id: String,
    pub source_id: String,
    pub ordinal: u32,
    pub content: String,
    /// Absent when the embedding call failed at learn time.
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

fn uuid_v4() -> String {
    uuid::Uuid::new_v4().to_string()
}
