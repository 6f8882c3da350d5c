// SPDX-FileCopyrightText: 2026 Glimpse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered TOML configuration for the Glimpse engine.
//!
//! Config is merged from compiled defaults, system and XDG files, a local
//! `glimpse.toml`, and `GLIMPSE_*` environment variables, then validated.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{EngineConfig, GlimpseConfig, ScrollConfig};
pub use validation::validate_config;
