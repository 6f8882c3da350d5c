// SPDX-FileCopyrightText: 2026 Glimpse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as positive caps and step budgets.

use glimpse_core::GlimpseError;

use crate::model::GlimpseConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<GlimpseError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &GlimpseConfig) -> Result<(), Vec<GlimpseError>> {
    let mut errors = Vec::new();

    if config.engine.max_conversations == 0 {
        errors.push(GlimpseError::Config(
            "engine.max_conversations must be at least 1".to_string(),
        ));
    }

    if config.engine.max_messages_per_chat == 0 {
        errors.push(GlimpseError::Config(
            "engine.max_messages_per_chat must be at least 1".to_string(),
        ));
    }

    if config.engine.position_quantum < 1 {
        errors.push(GlimpseError::Config(format!(
            "engine.position_quantum must be at least 1, got {}",
            config.engine.position_quantum
        )));
    }

    if config.scroll.max_down_steps == 0 {
        errors.push(GlimpseError::Config(
            "scroll.max_down_steps must be at least 1".to_string(),
        ));
    }

    if config.scroll.max_up_steps == 0 {
        errors.push(GlimpseError::Config(
            "scroll.max_up_steps must be at least 1".to_string(),
        ));
    }

    if config.scroll.step_settle_ms == 0 {
        errors.push(GlimpseError::Config(
            "scroll.step_settle_ms must be at least 1".to_string(),
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
