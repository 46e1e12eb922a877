// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` opens a migrated SQLite database in a temp directory and
//! pairs it with mock model adapters and a test-friendly configuration.
//! Callers build the engine under test from its public fields.

use std::sync::Arc;

use tenet_config::model::{MemoryConfig, StorageConfig, TenetConfig};
use tenet_core::TenetError;
use tenet_storage::Database;

use crate::mock_chat::MockChat;
use crate::mock_embedder::MockEmbedder;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    dimensions: usize,
    memory: MemoryConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            dimensions: 8,
            memory: MemoryConfig::default(),
        }
    }

    /// Queue chat replies, consumed in call order.
    pub fn with_mock_responses<I, S>(mut self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.responses = responses.into_iter().map(Into::into).collect();
        self
    }

    /// Embedding dimension of the mock embedder.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_memory_config(mut self, memory: MemoryConfig) -> Self {
        self.memory = memory;
        self
    }

    /// Build the test harness, creating the temp database.
    pub async fn build(self) -> Result<TestHarness, TenetError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| TenetError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };
        let db = Database::open_with_config(&storage).await?;

        let config = TenetConfig {
            storage,
            memory: self.memory,
            ..TenetConfig::default()
        };

        Ok(TestHarness {
            db,
            chat: Arc::new(MockChat::with_responses(self.responses)),
            embedder: Arc::new(MockEmbedder::new(self.dimensions)),
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A temp database plus mock adapters, cleaned up on drop.
pub struct TestHarness {
    /// Migrated database in the temp directory.
    pub db: Database,
    pub chat: Arc<MockChat>,
    pub embedder: Arc<MockEmbedder>,
    /// Configuration pointing at the temp database.
    pub config: TenetConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Queue one more chat reply.
    pub fn add_chat_response(&self, text: impl Into<String>) {
        self.chat.push_response(text);
    }
}
