// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./consultease.toml` >
//! `~/.config/consultease/consultease.toml` >
//! `/etc/consultease/consultease.toml`, with environment variable overrides
//! via the `CONSULTEASE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ConsultEaseConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/consultease/consultease.toml` (system-wide)
/// 3. `~/.config/consultease/consultease.toml` (user XDG config)
/// 4. `./consultease.toml` (local directory)
/// 5. `CONSULTEASE_*` environment variables
pub fn load_config() -> Result<ConsultEaseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConsultEaseConfig::default()))
        .merge(Toml::file("/etc/consultease/consultease.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("consultease/consultease.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("consultease.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
pub fn load_config_from_str(toml_content: &str) -> Result<ConsultEaseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConsultEaseConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ConsultEaseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConsultEaseConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `CONSULTEASE_BROKER_CLIENT_ID` must map
/// to `broker.client_id`, not `broker.client.id`.
fn env_provider() -> Env {
    Env::prefixed("CONSULTEASE_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("system_", "system.", 1)
            .replacen("broker_", "broker.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("queue_", "queue.", 1);
        mapped.into()
    })
}
