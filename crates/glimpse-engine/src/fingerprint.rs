// SPDX-FileCopyrightText: 2026 Glimpse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fingerprint derivation for raw snapshot rows.
//!
//! Messages sampled off a chat UI carry no native id, so identity is derived
//! from content. Each fingerprintable row yields three keys:
//! - `base`: direction + kind + normalized text/description. Stable across
//!   sender-attribution glitches.
//! - `content`: the base inputs plus the normalized sender. Tighter match.
//! - `pos`: quantized screen bounds, used only as a tie-breaker.
//!
//! Hashes are SHA-256 over pipe-joined normalized fields; correctness relies
//! on determinism and low collision probability, not on the algorithm.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use glimpse_core::types::{MessageKind, RawMessage};
use sha2::{Digest, Sha256};

/// A 256-bit fingerprint key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashKey([u8; 32]);

impl HashKey {
    /// Sentinel used as the `prev_base` of the first item in a snapshot.
    /// SHA-256 of real input never produces the all-zero key in practice.
    pub const START: HashKey = HashKey([0; 32]);

    fn digest(input: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        HashKey(hasher.finalize().into())
    }

    /// Short hex prefix for log output.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl fmt::Debug for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashKey({})", self.short())
    }
}

/// Derived identity keys for one raw message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    /// Sender-agnostic content key.
    pub base: HashKey,
    /// Sender-specific content key.
    pub content: HashKey,
    /// Normalized sender name, or empty when the UI attributed none.
    pub sender_key: String,
    /// Quantized position key. Zero when the row had no bounds.
    pub pos: u64,
}

/// Normalize a text field: lowercase, trim, collapse internal whitespace.
fn normalize(s: &str) -> String {
    s.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Blank or placeholder content that carries no identity.
fn is_blank(normalized: &str) -> bool {
    normalized.is_empty() || normalized == "none"
}

/// Quantize bounds into a coarse position key.
///
/// Center coordinates and extent are bucketed by `quantum` so sub-pixel
/// re-layout lands in the same bucket while genuinely different rows do not.
fn position_key(msg: &RawMessage, quantum: i32) -> u64 {
    let Some(bounds) = msg.bounds else {
        return 0;
    };
    let q = quantum.max(1);
    let mut hasher = DefaultHasher::new();
    (bounds.center_x() / q).hash(&mut hasher);
    (bounds.center_y() / q).hash(&mut hasher);
    (bounds.width() / q).hash(&mut hasher);
    (bounds.height() / q).hash(&mut hasher);
    hasher.finish()
}

/// Derive only the base key for a raw message, with the same validity rules
/// as [`build_fingerprint`]. Used for snapshot signatures, where the
/// position and sender keys are irrelevant.
pub fn base_key(msg: &RawMessage) -> Option<HashKey> {
    build_fingerprint(msg, 1).map(|fp| fp.base)
}

/// Build the fingerprint for a raw message, or `None` if the message is
/// invalid for history purposes.
///
/// Invalid rows: outgoing messages, system rows, and rows whose text and
/// description are both blank (or the "none" placeholder). These are routed
/// to hidden/ignored by the driver and never stored.
pub fn build_fingerprint(msg: &RawMessage, quantum: i32) -> Option<Fingerprint> {
    if !msg.incoming || msg.kind == MessageKind::System {
        return None;
    }

    let text = normalize(msg.text.as_deref().unwrap_or(""));
    let description = normalize(msg.description.as_deref().unwrap_or(""));
    if is_blank(&text) && is_blank(&description) {
        return None;
    }

    let direction = if msg.incoming { "in" } else { "out" };
    let base_input = format!("{direction}|{}|{text}|{description}", msg.kind);
    let sender_key = normalize(msg.sender.as_deref().unwrap_or(""));
    let content_input = format!("{base_input}|{sender_key}");

    Some(Fingerprint {
        base: HashKey::digest(&base_input),
        content: HashKey::digest(&content_input),
        sender_key,
        pos: position_key(msg, quantum),
    })
}
