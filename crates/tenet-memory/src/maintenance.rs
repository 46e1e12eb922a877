// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maintenance passes over the belief set: reflect, merge, prune, synthesize, resolve.
//!
//! These are read-heavy and may run beside foreground writes. Each mutation
//! they make is still a single-belief transition, so a concurrent write can
//! at worst make one of their steps a no-op.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tenet_config::model::MemoryConfig;
use tenet_core::{Belief, BeliefStatus, BeliefType, ChatAdapter, ChatMessage, Namespace, TenetError};
use tracing::{debug, info, warn};

use crate::decay::effective_confidence;
use crate::llm::chat_with_timeout;
use crate::merge::{MergeEngine, Proposal};
use crate::recording::{record_fallback, record_retired};
use crate::store::BeliefStore;
use crate::types::{cosine_similarity, MergeOutcome, MergeReport, ReflectReport, StaleBelief};
use crate::vector::VectorStore;

const SYNTHESIS_PROMPT: &str = "Below are related beliefs about one subject. If they reveal a \
broader pattern, state it as one or more short standalone sentences. Reply with a JSON array of \
strings, or [] when there is no pattern.";

/// Runs maintenance operations against the belief store.
pub struct Maintenance {
    beliefs: BeliefStore,
    vectors: Arc<dyn VectorStore>,
    chat: Arc<dyn ChatAdapter>,
    merge: Arc<MergeEngine>,
    config: MemoryConfig,
}

impl Maintenance {
    pub fn new(
        beliefs: BeliefStore,
        vectors: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatAdapter>,
        merge: Arc<MergeEngine>,
        config: MemoryConfig,
    ) -> Self {
        Self {
            beliefs,
            vectors,
            chat,
            merge,
            config,
        }
    }

    /// Read-only pass: duplicate clusters among active beliefs and stale beliefs.
    pub async fn reflect(&self, now: DateTime<Utc>) -> Result<ReflectReport, TenetError> {
        let active = self.beliefs.list_beliefs(Some(BeliefStatus::Active)).await?;
        let entries = self.vectors.entries(Namespace::Beliefs).await?;
        let confidence: HashMap<&str, f64> =
            active.iter().map(|b| (b.id.as_str(), b.confidence)).collect();

        // Only vectors of currently active beliefs take part.
        let vectors: Vec<(&str, &[f32])> = entries
            .iter()
            .filter(|e| confidence.contains_key(e.entity_id.as_str()))
            .map(|e| (e.entity_id.as_str(), e.vector.as_slice()))
            .collect();

        let mut clusters: Vec<Vec<String>> =
            duplicate_components(&vectors, self.config.duplicate_threshold)
                .into_iter()
                .map(|ids| ids.into_iter().map(str::to_string).collect())
                .collect();
        for cluster in &mut clusters {
            cluster.sort_by(|a, b| {
                let ca = confidence.get(a.as_str()).copied().unwrap_or_default();
                let cb = confidence.get(b.as_str()).copied().unwrap_or_default();
                cb.total_cmp(&ca).then_with(|| a.cmp(b))
            });
        }

        let half_life = self.config.decay_half_life_days;
        let stale: Vec<StaleBelief> = active
            .into_iter()
            .filter_map(|belief| {
                let effective = effective_confidence(&belief, now, half_life);
                (effective <= self.config.stale_watermark).then_some(StaleBelief {
                    belief,
                    effective_confidence: effective,
                })
            })
            .collect();

        debug!(clusters = clusters.len(), stale = stale.len(), "reflect complete");
        Ok(ReflectReport { clusters, stale })
    }

    /// Merge each cluster into its strongest active member, forgetting the rest.
    ///
    /// Members that are no longer active are ignored, so re-running on the same
    /// clusters merges nothing new and keeps the same winner.
    pub async fn merge_duplicates(
        &self,
        clusters: &[Vec<String>],
    ) -> Result<Vec<MergeReport>, TenetError> {
        let mut reports = Vec::with_capacity(clusters.len());
        for cluster in clusters {
            let members: Vec<Belief> = self
                .beliefs
                .get_beliefs(cluster)
                .await?
                .into_iter()
                .filter(Belief::is_active)
                .collect();
            let Some(winner) = pick_winner(&members) else {
                reports.push(MergeReport {
                    winner: None,
                    merged: vec![],
                });
                continue;
            };
            let winner = winner.id.clone();

            let mut merged = Vec::new();
            for loser in members.iter().filter(|b| b.id != winner) {
                if self.beliefs.merge_into(&loser.id, &winner).await? {
                    merged.push(loser.id.clone());
                }
            }
            record_retired("merged", merged.len());
            if !merged.is_empty() {
                info!(winner = %winner, merged = merged.len(), "duplicates merged");
            }
            reports.push(MergeReport {
                winner: Some(winner),
                merged,
            });
        }
        Ok(reports)
    }

    /// Prune active beliefs whose effective confidence at `now` is below `threshold`.
    pub async fn prune_beliefs_at(
        &self,
        threshold: f64,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, TenetError> {
        let half_life = self.config.decay_half_life_days;
        let active = self.beliefs.list_beliefs(Some(BeliefStatus::Active)).await?;

        let mut pruned = Vec::new();
        for belief in active {
            let effective = effective_confidence(&belief, now, half_life);
            if effective >= threshold {
                continue;
            }
            let detail = format!("effective confidence {effective:.4} below {threshold:.4}");
            if self.beliefs.prune(&belief.id, detail).await? {
                pruned.push(belief.id);
            }
        }
        record_retired("pruned", pruned.len());
        info!(pruned = pruned.len(), threshold, "prune complete");
        Ok(pruned)
    }

    /// Ask the model for meta-beliefs over groups of related beliefs.
    ///
    /// Each synthesized statement goes through the normal merge path. Model
    /// failures or malformed replies yield no meta-beliefs for that group.
    pub async fn synthesize(&self) -> Result<Vec<MergeOutcome>, TenetError> {
        let active = self.beliefs.list_beliefs(Some(BeliefStatus::Active)).await?;
        let groups = synthesis_groups(
            active,
            self.config.synthesis_min_group,
            self.config.synthesis_max_groups,
        );

        let mut outcomes = Vec::new();
        for group in groups {
            let subject = group[0].subject.clone();
            let listing: String = group
                .iter()
                .map(|b| format!("- {}\n", b.statement))
                .collect();
            let messages = vec![
                ChatMessage::system(SYNTHESIS_PROMPT),
                ChatMessage::user(format!("Subject: {subject}\n{listing}")),
            ];
            let reply = match chat_with_timeout(
                self.chat.as_ref(),
                messages,
                self.config.chat_options(),
                self.config.model_timeout(),
            )
            .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(error = %e, "synthesis call failed, no meta-beliefs for group");
                    record_fallback("synthesis");
                    continue;
                }
            };

            for statement in parse_synthesis(&reply) {
                let proposal = Proposal {
                    statement,
                    belief_type: BeliefType::Meta,
                    subject: subject.clone(),
                    confidence: self.config.meta_confidence,
                };
                outcomes.push(self.merge.propose(&proposal, None).await?);
            }
        }
        info!(synthesized = outcomes.len(), "synthesis complete");
        Ok(outcomes)
    }

    /// Manually settle a conflict by invalidating `remove_id` in favor of `keep_id`.
    ///
    /// False when either id is unknown, the ids are equal, or `remove_id` is not active.
    pub async fn resolve(&self, keep_id: &str, remove_id: &str) -> Result<bool, TenetError> {
        if keep_id == remove_id {
            return Ok(false);
        }
        if self.beliefs.get_belief(keep_id).await?.is_none() {
            return Ok(false);
        }
        self.beliefs
            .invalidate(remove_id, Some(format!("resolved in favor of {keep_id}")))
            .await
    }
}

/// Connected components of the "similarity >= threshold" graph, size two or more.
fn duplicate_components<'a>(vectors: &[(&'a str, &[f32])], threshold: f64) -> Vec<Vec<&'a str>> {
    let n = vectors.len();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (vectors[i].1, vectors[j].1);
            if a.len() != b.len() {
                continue;
            }
            if f64::from(cosine_similarity(a, b)) >= threshold {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    let mut components: BTreeMap<usize, Vec<&'a str>> = BTreeMap::new();
    for i in 0..n {
        let root = find(&mut parent, i);
        components.entry(root).or_default().push(vectors[i].0);
    }
    components.into_values().filter(|c| c.len() > 1).collect()
}

/// Highest confidence, then most recently updated, then most accessed.
fn pick_winner(members: &[Belief]) -> Option<&Belief> {
    members.iter().max_by(|a, b| {
        a.confidence
            .total_cmp(&b.confidence)
            .then_with(|| a.updated_at.cmp(&b.updated_at))
            .then_with(|| a.access_count.cmp(&b.access_count))
            .then_with(|| b.id.cmp(&a.id))
    })
}

/// Group non-meta beliefs by subject and type; largest groups first.
fn synthesis_groups(beliefs: Vec<Belief>, min_group: usize, max_groups: usize) -> Vec<Vec<Belief>> {
    let mut by_key: BTreeMap<(String, &'static str), Vec<Belief>> = BTreeMap::new();
    for belief in beliefs.into_iter().filter(|b| b.belief_type != BeliefType::Meta) {
        by_key
            .entry((belief.subject.clone(), belief.belief_type.as_str()))
            .or_default()
            .push(belief);
    }
    let mut groups: Vec<Vec<Belief>> = by_key
        .into_values()
        .filter(|g| g.len() >= min_group.max(1))
        .collect();
    groups.sort_by(|a, b| b.len().cmp(&a.len()));
    groups.truncate(max_groups);
    groups
}

#[derive(Deserialize)]
#[serde(transparent)]
struct SynthesisReply(Vec<String>);

/// Parse a JSON array of strings. Anything else is no statements.
pub fn parse_synthesis(reply: &str) -> Vec<String> {
    let trimmed = reply.trim();
    let json = match (trimmed.find('['), trimmed.rfind(']')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => {
            warn!("synthesis reply has no JSON array");
            return vec![];
        }
    };
    match serde_json::from_str::<SynthesisReply>(json) {
        Ok(SynthesisReply(statements)) => statements
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Err(e) => {
            warn!(error = %e, "malformed synthesis reply");
            vec![]
        }
    }
}
