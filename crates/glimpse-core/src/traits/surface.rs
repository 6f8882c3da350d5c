// SPDX-FileCopyrightText: 2026 Glimpse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat surface trait for the gesture and UI-sampler layer.

use async_trait::async_trait;

use crate::error::GlimpseError;
use crate::types::RawMessage;

/// Live view onto the currently open conversation's scrollable message list.
///
/// The scroll controller drives this seam: it re-samples the visible window
/// after each gesture and stops as soon as the surface reports no response.
/// Scroll methods return `Ok(false)` when the gesture was dispatched but the
/// UI did not react (end of list, frozen app); that is a normal negative
/// result, not an error.
#[async_trait]
pub trait ChatSurface: Send + Sync {
    /// Sample the currently visible message rows, oldest-first.
    async fn snapshot(&self) -> Result<Vec<RawMessage>, GlimpseError>;

    /// Scroll the list toward the newest messages by one step.
    async fn scroll_to_bottom(&self) -> Result<bool, GlimpseError>;

    /// Scroll the list toward older messages by one step.
    async fn scroll_up(&self) -> Result<bool, GlimpseError>;
}
