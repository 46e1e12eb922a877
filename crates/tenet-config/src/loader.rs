// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tenet.toml` > `~/.config/tenet/tenet.toml` > `/etc/tenet/tenet.toml`
//! with environment variable overrides via `TENET_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::TenetConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tenet/tenet.toml` (system-wide)
/// 3. `~/.config/tenet/tenet.toml` (user XDG config)
/// 4. `./tenet.toml` (local directory)
/// 5. `TENET_*` environment variables
pub fn load_config() -> Result<TenetConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<TenetConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TenetConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TenetConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TenetConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TenetConfig::default()))
        .merge(Toml::file("/etc/tenet/tenet.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("tenet/tenet.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("tenet.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys contain
/// underscores: `TENET_MEMORY_PRUNE_THRESHOLD` must map to
/// `memory.prune_threshold`, not `memory.prune.threshold`.
fn env_provider() -> Env {
    Env::prefixed("TENET_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("storage_", "storage.", 1)
            .replacen("memory_", "memory.", 1)
            .replacen("knowledge_", "knowledge.", 1);
        mapped.into()
    })
}
