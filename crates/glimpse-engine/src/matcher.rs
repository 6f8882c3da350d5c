// SPDX-FileCopyrightText: 2026 Glimpse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entry matching: resolve a candidate fingerprint to an existing entry.
//!
//! Matching proceeds in strict priority order and returns the first hit:
//! 1. Chain match on `(prev_base, base)` — anchors on adjacency, so identity
//!    survives even when content hashes later diverge.
//! 2. Content match on the sender-specific content hash.
//! 3. Base match on the sender-agnostic base hash, with a position tie-break
//!    when multiple candidates remain.
//!
//! Every step requires sender compatibility, and entries already claimed in
//! the current reconciliation pass are skipped so one entry is never reused
//! twice for a single snapshot.

use std::collections::HashSet;

use crate::fingerprint::{Fingerprint, HashKey};
use crate::store::{Conversation, EntryHandle};

/// Two sender keys are compatible if either is blank, or they are equal.
///
/// Blank tolerance covers attribution lag: the UI often renders a message
/// row before its sender label.
pub fn senders_compatible(a: &str, b: &str) -> bool {
    a.is_empty() || b.is_empty() || a == b
}

/// Find the best existing entry for a candidate fingerprint, or `None` to
/// signal that a new entry must be created.
///
/// `prev_base` is the base hash of the immediately preceding fingerprintable
/// item in the *current* snapshot (not the stored history), seeded with
/// [`HashKey::START`]. `claimed` holds entries already matched during this
/// pass.
///
/// Ambiguity among multiple base candidates is resolved deterministically:
/// prefer an entry whose stored position key equals the candidate's,
/// otherwise take the first sender-compatible one. Pathological duplicate
/// content can misattribute identity here; that is an accepted heuristic
/// limitation, not a fault.
pub fn find_match(
    conv: &Conversation,
    fp: &Fingerprint,
    prev_base: HashKey,
    claimed: &HashSet<EntryHandle>,
) -> Option<EntryHandle> {
    let available = |handle: &&EntryHandle| -> bool {
        !claimed.contains(handle)
            && conv
                .entry(**handle)
                .is_some_and(|e| senders_compatible(&e.sender_key, &fp.sender_key))
    };

    // 1. Chain match: same adjacency in a previous snapshot.
    if let Some(handle) = conv
        .chain_candidates(prev_base, fp.base)
        .iter()
        .find(available)
    {
        return Some(*handle);
    }

    // 2. Content match: sender-specific hash (aliases included).
    if let Some(handle) = conv
        .content_candidates(fp.content)
        .iter()
        .find(available)
    {
        return Some(*handle);
    }

    // 3. Base match: sender-agnostic hash.
    let unclaimed: Vec<EntryHandle> = conv
        .base_candidates(fp.base)
        .iter()
        .filter(|h| !claimed.contains(*h))
        .copied()
        .collect();

    match unclaimed.as_slice() {
        [] => None,
        [only] => conv
            .entry(*only)
            .is_some_and(|e| senders_compatible(&e.sender_key, &fp.sender_key))
            .then_some(*only),
        many => {
            let compatible = many.iter().filter(|h| {
                conv.entry(**h)
                    .is_some_and(|e| senders_compatible(&e.sender_key, &fp.sender_key))
            });
            let mut first = None;
            for handle in compatible {
                if conv.entry(*handle).is_some_and(|e| e.pos == fp.pos) {
                    return Some(*handle);
                }
                first.get_or_insert(*handle);
            }
            first
        }
    }
}
