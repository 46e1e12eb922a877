// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tenet memory engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tenet_core::ChatOptions;

/// Top-level Tenet configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TenetConfig {
    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Belief engine thresholds and model settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Knowledge base chunking and search settings.
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("tenet").join("tenet.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("tenet.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Belief engine configuration.
///
/// Every threshold the reinforcement/merge engine, decay and maintenance
/// passes use lives here and is supplied at engine construction.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Similarity above which a new statement reinforces the top match.
    #[serde(default = "default_reinforce_threshold")]
    pub reinforce_threshold: f64,

    /// Lower (exclusive) bound of the contradiction-check band.
    /// Similarities in (contradiction_band, reinforce_threshold] go to the resolver.
    #[serde(default = "default_contradiction_band")]
    pub contradiction_band: f64,

    /// Effective confidence below which `prune_beliefs` retires a belief.
    #[serde(default = "default_prune_threshold")]
    pub prune_threshold: f64,

    /// Effective confidence at or below which `reflect` reports a belief as stale.
    #[serde(default = "default_stale_watermark")]
    pub stale_watermark: f64,

    /// Half-life of the exponential confidence decay, in days.
    #[serde(default = "default_decay_half_life_days")]
    pub decay_half_life_days: f64,

    /// Fraction of the remaining distance to 1.0 added on reinforcement.
    #[serde(default = "default_reinforce_step")]
    pub reinforce_step: f64,

    /// Confidence of a belief created from an extracted fact.
    #[serde(default = "default_initial_confidence")]
    pub initial_confidence: f64,

    /// Confidence of a belief created from an extracted insight.
    #[serde(default = "default_insight_confidence")]
    pub insight_confidence: f64,

    /// Confidence of a synthesized meta-belief.
    #[serde(default = "default_meta_confidence")]
    pub meta_confidence: f64,

    /// Number of nearest beliefs fetched for the merge decision.
    #[serde(default = "default_search_k")]
    pub search_k: usize,

    /// Pairwise similarity at or above which `reflect` clusters duplicates.
    #[serde(default = "default_duplicate_threshold")]
    pub duplicate_threshold: f64,

    /// Fewer turns than this and consolidation is skipped without a model call.
    #[serde(default = "default_consolidation_min_turns")]
    pub consolidation_min_turns: usize,

    /// Only the most recent turns up to this count are summarized.
    #[serde(default = "default_consolidation_max_turns")]
    pub consolidation_max_turns: usize,

    /// Minimum number of related beliefs before a group is offered for synthesis.
    #[serde(default = "default_synthesis_min_group")]
    pub synthesis_min_group: usize,

    /// Maximum number of groups sent to the model per synthesis pass.
    #[serde(default = "default_synthesis_max_groups")]
    pub synthesis_max_groups: usize,

    /// Deadline for any single model call.
    #[serde(default = "default_model_timeout_secs")]
    pub model_timeout_secs: u64,

    /// Maximum number of beliefs returned by `recall`.
    #[serde(default = "default_recall_limit")]
    pub recall_limit: usize,

    /// Model identifier passed to the chat adapter.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature for extraction, summarization and synthesis.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            reinforce_threshold: default_reinforce_threshold(),
            contradiction_band: default_contradiction_band(),
            prune_threshold: default_prune_threshold(),
            stale_watermark: default_stale_watermark(),
            decay_half_life_days: default_decay_half_life_days(),
            reinforce_step: default_reinforce_step(),
            initial_confidence: default_initial_confidence(),
            insight_confidence: default_insight_confidence(),
            meta_confidence: default_meta_confidence(),
            search_k: default_search_k(),
            duplicate_threshold: default_duplicate_threshold(),
            consolidation_min_turns: default_consolidation_min_turns(),
            consolidation_max_turns: default_consolidation_max_turns(),
            synthesis_min_group: default_synthesis_min_group(),
            synthesis_max_groups: default_synthesis_max_groups(),
            model_timeout_secs: default_model_timeout_secs(),
            recall_limit: default_recall_limit(),
            model: default_model(),
            temperature: default_temperature(),
        }
    }
}

impl MemoryConfig {
    /// Deadline applied to each model call.
    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    /// Chat options for generative calls (extraction, summaries, synthesis).
    pub fn chat_options(&self) -> ChatOptions {
        ChatOptions {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: 1024,
        }
    }

    /// Chat options for classification calls, which must be deterministic.
    pub fn classifier_options(&self) -> ChatOptions {
        ChatOptions {
            model: self.model.clone(),
            temperature: 0.0,
            max_tokens: 8,
        }
    }
}

fn default_reinforce_threshold() -> f64 {
    0.85
}

fn default_contradiction_band() -> f64 {
    0.70
}

fn default_prune_threshold() -> f64 {
    0.05
}

fn default_stale_watermark() -> f64 {
    0.10
}

fn default_decay_half_life_days() -> f64 {
    60.0
}

fn default_reinforce_step() -> f64 {
    0.15
}

fn default_initial_confidence() -> f64 {
    0.6
}

fn default_insight_confidence() -> f64 {
    0.5
}

fn default_meta_confidence() -> f64 {
    0.5
}

fn default_search_k() -> usize {
    5
}

fn default_duplicate_threshold() -> f64 {
    0.85
}

fn default_consolidation_min_turns() -> usize {
    4
}

fn default_consolidation_max_turns() -> usize {
    40
}

fn default_synthesis_min_group() -> usize {
    3
}

fn default_synthesis_max_groups() -> usize {
    5
}

fn default_model_timeout_secs() -> u64 {
    30
}

fn default_recall_limit() -> usize {
    10
}

fn default_model() -> String {
    "default".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

/// Knowledge base configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KnowledgeConfig {
    /// Word cap per chunk when splitting learned documents.
    #[serde(default = "default_chunk_max_words")]
    pub chunk_max_words: usize,

    /// Default number of chunks returned by `knowledge_search`.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            chunk_max_words: default_chunk_max_words(),
            search_limit: default_search_limit(),
        }
    }
}

fn default_chunk_max_words() -> usize {
    300
}

fn default_search_limit() -> usize {
    5
}
