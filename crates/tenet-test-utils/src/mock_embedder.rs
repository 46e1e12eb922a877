// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock embedding adapter.
//!
//! Texts registered with [`MockEmbedder::set`] map to fixed vectors. Any
//! other text is embedded as a hashed bag of lowercase words, so equal texts
//! always get equal vectors and texts sharing words land close together.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use tenet_core::types::{EmbeddingInput, EmbeddingOutput};
use tenet_core::{EmbeddingAdapter, PluginAdapter, TenetError};

pub struct MockEmbedder {
    dimensions: usize,
    fixed: Mutex<HashMap<String, Vec<f32>>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new(dimensions: usize) -> Self {
        assert!(dimensions > 0, "embedding dimension must be positive");
        Self {
            dimensions,
            fixed: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Pin the vector returned for `text`.
    pub fn set(&self, text: &str, vector: Vec<f32>) {
        assert_eq!(vector.len(), self.dimensions, "vector dimension mismatch");
        self.fixed
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(text.to_string(), vector);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `embed` calls, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let fixed = self.fixed.lock().unwrap_or_else(|p| p.into_inner());
        match fixed.get(text) {
            Some(v) => v.clone(),
            None => bag_of_words(text, self.dimensions),
        }
    }
}

fn bag_of_words(text: &str, dimensions: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dimensions];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        vector[fnv1a(&word.to_lowercase()) as usize % dimensions] += 1.0;
    }
    if vector.iter().all(|x| *x == 0.0) {
        vector[0] = 1.0;
    }
    vector
}

// 64-bit FNV-1a; stable across runs and platforms.
fn fnv1a(word: &str) -> u64 {
    word.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x0100_0000_01b3)
    })
}

impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, TenetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(TenetError::provider("mock embedder configured to fail"));
        }
        Ok(EmbeddingOutput {
            embeddings: input.texts.iter().map(|t| self.vector_for(t)).collect(),
            dimensions: self.dimensions,
        })
    }
}
