// SPDX-FileCopyrightText: 2026 Glimpse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Glimpse reconciliation engine.
//!
//! This crate provides the shared data model (snapshot rows, deliveries),
//! the workspace error type, and the trait definitions for the two external
//! seams: the delivery transport and the chat UI surface.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::GlimpseError;
pub use traits::{ChatSurface, DeliverySink};
pub use types::{Delivery, MessageKind, RawMessage, Rect};
