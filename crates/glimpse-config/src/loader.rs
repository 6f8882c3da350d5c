// SPDX-FileCopyrightText: 2026 Glimpse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./glimpse.toml` > `~/.config/glimpse/glimpse.toml`
//! > `/etc/glimpse/glimpse.toml` with environment variable overrides via the
//! `GLIMPSE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::GlimpseConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/glimpse/glimpse.toml` (system-wide)
/// 3. `~/.config/glimpse/glimpse.toml` (user XDG config)
/// 4. `./glimpse.toml` (local directory)
/// 5. `GLIMPSE_*` environment variables
pub fn load_config() -> Result<GlimpseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GlimpseConfig::default()))
        .merge(Toml::file("/etc/glimpse/glimpse.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("glimpse/glimpse.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("glimpse.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<GlimpseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GlimpseConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<GlimpseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GlimpseConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `GLIMPSE_ENGINE_MAX_CONVERSATIONS` must
/// map to `engine.max_conversations`, not `engine.max.conversations`.
fn env_provider() -> Env {
    Env::prefixed("GLIMPSE_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("engine_", "engine.", 1)
            .replacen("scroll_", "scroll.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.engine.max_conversations, 24);
        assert_eq!(config.scroll.step_settle_ms, 400);
    }

    #[test]
    fn toml_string_overrides_defaults() {
        let config = load_config_from_str(
            r#"
[engine]
max_conversations = 8

[scroll]
max_down_steps = 3
"#,
        )
        .unwrap();
        assert_eq!(config.engine.max_conversations, 8);
        assert_eq!(config.scroll.max_down_steps, 3);
        // Untouched keys keep defaults.
        assert_eq!(config.engine.max_messages_per_chat, 200);
    }

    #[test]
    fn unknown_section_is_rejected() {
        let result = load_config_from_str(
            r#"
[gestures]
speed = 2
"#,
        );
        assert!(result.is_err());
    }
}
