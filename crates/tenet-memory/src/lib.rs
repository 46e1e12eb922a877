// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Belief and episodic memory engine for the Tenet agent.
//!
//! Observations are recorded as episodes, distilled by a chat model into
//! belief statements, and merged into a SQLite-backed belief store by
//! embedding similarity. Beliefs lose confidence over time, gain it when
//! reinforced, and can be contradicted, merged, pruned or forgotten. Every
//! transition is written to an append-only change log.
//!
//! ## Architecture
//!
//! - **MemoryEngine**: public facade, per-thread write serialization
//! - **BeliefStore**: belief rows, change log and FTS5 lexical search
//! - **EpisodeStore**: append-only episodic log and provenance links
//! - **VectorStore**: namespaced brute-force cosine search
//! - **BeliefExtractor**: observation to fact and insight
//! - **MergeEngine**: similarity-banded reinforce / replace / create
//! - **ContradictionResolver**: model verdict over close candidates
//! - **HybridRetriever**: vector + BM25 + RRF, weighted by decayed confidence
//! - **Consolidator**: conversation windows to summary episodes
//! - **Maintenance**: reflect, merge duplicates, prune, synthesize, resolve
//! - **KnowledgeBase**: learned documents, chunked and searchable

pub mod consolidation;
pub mod decay;
pub mod engine;
pub mod episodes;
pub mod extractor;
pub mod knowledge;
pub mod llm;
pub mod maintenance;
pub mod merge;
pub mod recording;
pub mod resolver;
pub mod retriever;
pub mod serializer;
pub mod store;
pub mod types;
pub mod vector;

pub use consolidation::Consolidator;
pub use decay::{decay_factor, effective_confidence};
pub use engine::{MemoryEngine, DEFAULT_THREAD};
pub use episodes::EpisodeStore;
pub use extractor::{BeliefExtractor, Extraction};
pub use knowledge::KnowledgeBase;
pub use maintenance::Maintenance;
pub use merge::{MergeEngine, Proposal};
pub use resolver::{ContradictionResolver, Verdict};
pub use retriever::HybridRetriever;
pub use serializer::{ThreadGuard, ThreadSerializer};
pub use store::BeliefStore;
pub use types::*;
pub use vector::{SqliteVectorStore, VectorStore};
