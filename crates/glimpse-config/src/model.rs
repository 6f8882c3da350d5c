// SPDX-FileCopyrightText: 2026 Glimpse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Glimpse engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Glimpse configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GlimpseConfig {
    /// Reconciliation engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Scroll controller settings.
    #[serde(default)]
    pub scroll: ScrollConfig,
}

/// Reconciliation engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum number of conversations retained in the LRU store.
    #[serde(default = "default_max_conversations")]
    pub max_conversations: usize,

    /// Maximum entries retained per conversation. Older entries are evicted
    /// from the oldest end once the cap is exceeded.
    #[serde(default = "default_max_messages_per_chat")]
    pub max_messages_per_chat: usize,

    /// Quantization unit for the position fingerprint, in layout pixels.
    /// Coarse enough that sub-pixel re-layout does not move a row between
    /// buckets; a tunable, not a correctness-critical value.
    #[serde(default = "default_position_quantum")]
    pub position_quantum: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_conversations: default_max_conversations(),
            max_messages_per_chat: default_max_messages_per_chat(),
            position_quantum: default_position_quantum(),
        }
    }
}

fn default_max_conversations() -> usize {
    24
}

fn default_max_messages_per_chat() -> usize {
    200
}

fn default_position_quantum() -> i32 {
    24
}

/// Scroll controller configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScrollConfig {
    /// Cooldown between scroll-down sweeps for the same conversation.
    #[serde(default = "default_down_cooldown_ms")]
    pub down_cooldown_ms: u64,

    /// Shorter cooldown applied after a sweep that observed no visible change.
    #[serde(default = "default_no_change_cooldown_ms")]
    pub no_change_cooldown_ms: u64,

    /// Cooldown between backlog-recovery scroll-up sweeps.
    #[serde(default = "default_up_cooldown_ms")]
    pub up_cooldown_ms: u64,

    /// Step budget for one scroll-down sweep.
    #[serde(default = "default_max_down_steps")]
    pub max_down_steps: u32,

    /// Upper bound on scroll-up steps, applied on top of the reported gap.
    #[serde(default = "default_max_up_steps")]
    pub max_up_steps: u32,

    /// Settle time between a gesture and the next snapshot.
    #[serde(default = "default_step_settle_ms")]
    pub step_settle_ms: u64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            down_cooldown_ms: default_down_cooldown_ms(),
            no_change_cooldown_ms: default_no_change_cooldown_ms(),
            up_cooldown_ms: default_up_cooldown_ms(),
            max_down_steps: default_max_down_steps(),
            max_up_steps: default_max_up_steps(),
            step_settle_ms: default_step_settle_ms(),
        }
    }
}

fn default_down_cooldown_ms() -> u64 {
    6_000
}

fn default_no_change_cooldown_ms() -> u64 {
    5_000
}

fn default_up_cooldown_ms() -> u64 {
    6_000
}

fn default_max_down_steps() -> u32 {
    6
}

fn default_max_up_steps() -> u32 {
    20
}

fn default_step_settle_ms() -> u64 {
    400
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_engine_caps() {
        let config = GlimpseConfig::default();
        assert_eq!(config.engine.max_conversations, 24);
        assert_eq!(config.engine.max_messages_per_chat, 200);
        assert_eq!(config.engine.position_quantum, 24);
    }

    #[test]
    fn default_scroll_budgets() {
        let config = GlimpseConfig::default();
        assert_eq!(config.scroll.max_down_steps, 6);
        assert_eq!(config.scroll.max_up_steps, 20);
        assert_eq!(config.scroll.down_cooldown_ms, 6_000);
        assert_eq!(config.scroll.no_change_cooldown_ms, 5_000);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[engine]
max_messages_per_chat = 50
"#;
        let config: GlimpseConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.max_messages_per_chat, 50);
        assert_eq!(config.engine.max_conversations, 24);
        assert_eq!(config.scroll.max_down_steps, 6);
    }

    #[test]
    fn unknown_keys_rejected() {
        let toml_str = r#"
[engine]
max_conversatoins = 10
"#;
        assert!(toml::from_str::<GlimpseConfig>(toml_str).is_err());
    }
}
