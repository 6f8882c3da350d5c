// SPDX-FileCopyrightText: 2026 Glimpse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation reconciliation engine.
//!
//! Turns a noisy stream of chat-list snapshots into a stable, deduplicated,
//! ordered message history per conversation, delivering each new incoming
//! message exactly once to a [`DeliverySink`](glimpse_core::DeliverySink).
//!
//! Identity is fingerprint-based: messages sampled off a third-party UI have
//! no native id, so the engine hashes normalized content, sender, and coarse
//! screen position, matching snapshot rows against bounded per-conversation
//! history through three indexes (base hash, content hash, adjacency chain).

pub mod fingerprint;
pub mod matcher;
pub mod reconcile;
pub mod store;

pub use fingerprint::{Fingerprint, HashKey, build_fingerprint};
pub use matcher::{find_match, senders_compatible};
pub use reconcile::{Engine, MatchStats, ReconcileOutcome};
pub use store::{Conversation, ConversationStore, EntryHandle, MessageEntry};
