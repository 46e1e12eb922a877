// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait shared by the model capability adapters.

/// Identity of a capability adapter.
///
/// Chat and embedding adapters extend this trait. The name is only used to
/// label log records.
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;
}
