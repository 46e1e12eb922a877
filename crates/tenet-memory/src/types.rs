// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types for the belief engine.

use serde::Serialize;
use tenet_core::{Belief, KnowledgeChunk, KnowledgeSource};

/// One vector-store hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Similar {
    pub id: String,
    /// Cosine similarity in [-1, 1]. Zero when either vector has zero norm.
    pub similarity: f32,
}

/// Decision taken by the merge engine for one statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MergeOutcome {
    /// The top match was close enough to be the same belief; it was reinforced.
    Reinforced { belief_id: String, similarity: f32 },
    /// A contradicted belief was invalidated and replaced by a new one.
    Replaced { belief_id: String, replaced_id: String },
    /// A new belief was created.
    Created { belief_id: String },
    /// No embedding could be computed, so the statement was not turned into a belief.
    Skipped { statement: String },
}

impl MergeOutcome {
    /// The belief that now carries the statement, if any.
    pub fn belief_id(&self) -> Option<&str> {
        match self {
            MergeOutcome::Reinforced { belief_id, .. }
            | MergeOutcome::Replaced { belief_id, .. }
            | MergeOutcome::Created { belief_id } => Some(belief_id),
            MergeOutcome::Skipped { .. } => None,
        }
    }

    pub fn is_reinforcement(&self) -> bool {
        matches!(self, MergeOutcome::Reinforced { .. })
    }

    /// Short label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            MergeOutcome::Reinforced { .. } => "reinforced",
            MergeOutcome::Replaced { .. } => "replaced",
            MergeOutcome::Created { .. } => "created",
            MergeOutcome::Skipped { .. } => "skipped",
        }
    }
}

/// Result of `remember`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RememberOutcome {
    pub episode_id: String,
    /// Beliefs created or reinforced, fact first.
    pub belief_ids: Vec<String>,
    /// True iff the fact statement reinforced an existing belief.
    pub is_reinforcement: bool,
    /// Per-statement decisions, fact first then insight.
    pub outcomes: Vec<MergeOutcome>,
}

/// A belief returned by recall, with its fused ranking score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredBelief {
    pub belief: Belief,
    /// Confidence at recall time after decay.
    pub effective_confidence: f64,
    /// RRF score multiplied by effective confidence.
    pub score: f32,
}

/// A belief at or below the stale watermark.
#[derive(Debug, Clone, Serialize)]
pub struct StaleBelief {
    pub belief: Belief,
    pub effective_confidence: f64,
}

/// Output of the read-only reflect pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReflectReport {
    /// Groups of near-duplicate active beliefs, ids by confidence descending.
    pub clusters: Vec<Vec<String>>,
    pub stale: Vec<StaleBelief>,
}

/// Result of merging one duplicate cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeReport {
    /// Surviving belief. `None` when no member of the cluster was still active.
    pub winner: Option<String>,
    /// Beliefs forgotten by this call.
    pub merged: Vec<String>,
}

/// Result of `learn_from_content`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearnOutcome {
    pub source_id: String,
    /// True when the normalized url was already learned; nothing was written.
    pub skipped: bool,
    pub chunks_stored: usize,
    /// Chunks stored without a vector because embedding failed.
    pub chunks_without_vector: usize,
}

/// One knowledge search hit.
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeHit {
    pub chunk: KnowledgeChunk,
    pub source: KnowledgeSource,
    /// Cosine similarity for vector hits, reciprocal BM25 rank for lexical ones.
    pub score: f32,
}

/// Counts reported by `stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoryStats {
    pub active: u64,
    pub invalidated: u64,
    pub forgotten: u64,
    pub pruned: u64,
    pub changes: u64,
    pub belief_vectors: u64,
    pub knowledge_sources: u64,
}

/// Cosine similarity between two vectors of equal length.
///
/// Defined as 0 when either vector has zero norm, so the result is never NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "vectors must have same length");
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0) as f32
}
