// SPDX-FileCopyrightText: 2026 Glimpse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Glimpse workspace.

use thiserror::Error;

/// The primary error type used across Glimpse adapter traits and config loading.
///
/// The reconciliation engine itself has no fatal conditions: unfingerprintable
/// input, match misses, and capacity exhaustion all degrade gracefully without
/// surfacing here. Errors only arise at the seams (config, UI surface).
#[derive(Debug, Error)]
pub enum GlimpseError {
    /// Configuration errors (invalid TOML, unknown keys, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Chat surface errors (accessibility tree unavailable, gesture dispatch failure).
    #[error("surface error: {message}")]
    Surface {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
