// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(dead_code)]

use tenet_memory::MemoryEngine;
use tenet_test_utils::TestHarness;

/// Harness with 2-dimensional embeddings, so tests can place vectors at exact angles.
pub async fn harness() -> TestHarness {
    TestHarness::builder().with_dimensions(2).build().await.unwrap()
}

pub fn engine(h: &TestHarness) -> MemoryEngine {
    MemoryEngine::new(
        h.db.clone(),
        h.chat.clone(),
        h.embedder.clone(),
        h.config.clone(),
    )
}

/// Unit vector whose cosine with `[1, 0]` is `cos`.
pub fn at(cos: f32) -> Vec<f32> {
    vec![cos, (1.0 - cos * cos).sqrt()]
}

/// Extraction reply naming a single factual statement.
pub fn fact_reply(fact: &str) -> String {
    format!(r#"{{"fact": "{fact}", "insight": null, "type": "factual", "subject": "owner"}}"#)
}
