// SPDX-FileCopyrightText: 2026 Glimpse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scroll-direction and cooldown controller.
//!
//! Consumes the engine's match statistics to decide when to scroll the chat
//! list down (catch up to latest) or up (recover older backlog), with
//! bounded step budgets and per-conversation cooldowns.

pub mod controller;

pub use controller::{ScrollController, ScrollResult, snapshot_signature};
