// SPDX-FileCopyrightText: 2026 Glimpse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded per-conversation history and the LRU conversation store.
//!
//! Entries live in a slot arena addressed by stable [`EntryHandle`] indices;
//! the order list and all three lookup indexes hold handles, never
//! references. Eviction always removes from the oldest end and purges the
//! evicted handle from every index before freeing its slot.

use std::collections::{HashMap, VecDeque};

use tracing::debug;
use uuid::Uuid;

use crate::fingerprint::{Fingerprint, HashKey};

/// Stable handle into a conversation's entry arena.
///
/// Handles are only meaningful within the conversation that issued them and
/// may be reused after eviction; indexes are purged atomically on eviction so
/// a live handle always refers to a live entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryHandle(usize);

/// One reconciled message identity.
///
/// `id` and `sequence` never change after creation. `sender_key` may be
/// upgraded from empty to a real value once attribution is observed, and
/// `content_hashes` grows as content variants of the same message are
/// matched to it.
#[derive(Debug, Clone)]
pub struct MessageEntry {
    /// Opaque, globally unique id.
    pub id: Uuid,
    /// Per-conversation sequence number, strictly increasing from 1.
    pub sequence: u64,
    /// Sender-agnostic content key.
    pub base: HashKey,
    /// Base key of the entry immediately before this one at creation time,
    /// or [`HashKey::START`] if it was first in its snapshot.
    pub prev_base: HashKey,
    /// Every content key this entry has ever matched (aliases included).
    pub content_hashes: Vec<HashKey>,
    /// Normalized sender name, empty until observed.
    pub sender_key: String,
    /// Quantized position key at creation time.
    pub pos: u64,
}

/// Bounded, order-preserving message history for one conversation.
pub struct Conversation {
    /// Conversation title as last observed.
    pub title: String,
    /// Whether the conversation is a group chat.
    pub is_group: bool,
    /// False until the first snapshot has been reconciled.
    pub initialized: bool,

    slots: Vec<Option<MessageEntry>>,
    free: Vec<usize>,
    /// Live handles, oldest first.
    order: VecDeque<EntryHandle>,
    by_base: HashMap<HashKey, Vec<EntryHandle>>,
    by_content: HashMap<HashKey, Vec<EntryHandle>>,
    by_chain: HashMap<(HashKey, HashKey), Vec<EntryHandle>>,
    next_sequence: u64,
}

impl Conversation {
    pub fn new(title: &str, is_group: bool) -> Self {
        Self {
            title: title.to_string(),
            is_group,
            initialized: false,
            slots: Vec::new(),
            free: Vec::new(),
            order: VecDeque::new(),
            by_base: HashMap::new(),
            by_content: HashMap::new(),
            by_chain: HashMap::new(),
            next_sequence: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Look up an entry by handle. `None` only for stale handles, which the
    /// index maintenance above rules out for handles obtained from this
    /// conversation's indexes.
    pub fn entry(&self, handle: EntryHandle) -> Option<&MessageEntry> {
        self.slots.get(handle.0).and_then(|slot| slot.as_ref())
    }

    /// Live handles in history order, oldest first.
    pub fn handles(&self) -> impl Iterator<Item = EntryHandle> + '_ {
        self.order.iter().copied()
    }

    pub fn chain_candidates(&self, prev_base: HashKey, base: HashKey) -> &[EntryHandle] {
        self.by_chain
            .get(&(prev_base, base))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn content_candidates(&self, content: HashKey) -> &[EntryHandle] {
        self.by_content
            .get(&content)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn base_candidates(&self, base: HashKey) -> &[EntryHandle] {
        self.by_base.get(&base).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Create a new entry from a fingerprint, assign it the next sequence
    /// number, and register it in the order list and all three indexes.
    pub fn insert(&mut self, fp: &Fingerprint, prev_base: HashKey) -> EntryHandle {
        let entry = MessageEntry {
            id: Uuid::new_v4(),
            sequence: self.next_sequence,
            base: fp.base,
            prev_base,
            content_hashes: vec![fp.content],
            sender_key: fp.sender_key.clone(),
            pos: fp.pos,
        };
        self.next_sequence += 1;

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };

        let handle = EntryHandle(slot);
        self.order.push_back(handle);
        self.by_base.entry(fp.base).or_default().push(handle);
        self.by_content.entry(fp.content).or_default().push(handle);
        self.by_chain
            .entry((prev_base, fp.base))
            .or_default()
            .push(handle);
        handle
    }

    /// Apply the side effects of a successful match while the store lock is
    /// held: upgrade a blank sender key, and register the candidate's content
    /// hash as an alias so future lookups for this variant resolve here.
    pub fn apply_match(&mut self, handle: EntryHandle, fp: &Fingerprint) {
        let Some(slot) = self.slots.get_mut(handle.0) else {
            return;
        };
        let Some(entry) = slot.as_mut() else {
            return;
        };

        if entry.sender_key.is_empty() && !fp.sender_key.is_empty() {
            entry.sender_key = fp.sender_key.clone();
        }

        if !entry.content_hashes.contains(&fp.content) {
            entry.content_hashes.push(fp.content);
            self.by_content.entry(fp.content).or_default().push(handle);
        }
    }

    /// Evict entries from the oldest end until the cap is met.
    ///
    /// Returns the number of entries evicted. Each eviction purges the
    /// handle from all three indexes before freeing the slot.
    pub fn enforce_cap(&mut self, cap: usize) -> usize {
        let mut evicted = 0;
        while self.order.len() > cap {
            let Some(handle) = self.order.pop_front() else {
                break;
            };
            let Some(entry) = self.slots.get_mut(handle.0).and_then(Option::take) else {
                continue;
            };

            prune_index(&mut self.by_base, &entry.base, handle);
            for content in &entry.content_hashes {
                prune_index(&mut self.by_content, content, handle);
            }
            prune_index(&mut self.by_chain, &(entry.prev_base, entry.base), handle);

            debug!(
                sequence = entry.sequence,
                base = %entry.base.short(),
                "evicted oldest entry"
            );
            self.free.push(handle.0);
            evicted += 1;
        }
        evicted
    }
}

/// Remove one handle from an index bucket, dropping the bucket when empty.
fn prune_index<K: std::hash::Hash + Eq>(
    index: &mut HashMap<K, Vec<EntryHandle>>,
    key: &K,
    handle: EntryHandle,
) {
    if let Some(bucket) = index.get_mut(key) {
        bucket.retain(|h| *h != handle);
        if bucket.is_empty() {
            index.remove(key);
        }
    }
}

/// LRU-bounded map of conversation key to [`Conversation`].
///
/// Touching a conversation (read or write) refreshes its recency; exceeding
/// the capacity drops the least-recently-touched conversation with all its
/// entries and indexes.
pub struct ConversationStore {
    conversations: HashMap<String, (Conversation, u64)>,
    clock: u64,
    capacity: usize,
}

impl ConversationStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            conversations: HashMap::new(),
            clock: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.conversations.contains_key(key)
    }

    /// Inspect a conversation without refreshing its recency.
    ///
    /// For diagnostics and tests; operational reads go through [`get`]
    /// (ConversationStore::get) so recency tracks real usage.
    pub fn peek(&self, key: &str) -> Option<&Conversation> {
        self.conversations.get(key).map(|(conv, _)| conv)
    }

    /// Fetch a conversation, refreshing its recency.
    pub fn get(&mut self, key: &str) -> Option<&Conversation> {
        self.clock += 1;
        let clock = self.clock;
        self.conversations.get_mut(key).map(|(conv, touched)| {
            *touched = clock;
            &*conv
        })
    }

    /// Fetch or create a conversation, refreshing its recency and updating
    /// its displayed title and group flag. Evicts the least-recently-touched
    /// conversation when the capacity is exceeded.
    pub fn get_or_insert(&mut self, key: &str, title: &str, is_group: bool) -> &mut Conversation {
        self.clock += 1;
        let clock = self.clock;

        if !self.conversations.contains_key(key) {
            self.conversations
                .insert(key.to_string(), (Conversation::new(title, is_group), clock));
            self.evict_lru();
        }

        // Just inserted above when missing, and eviction spares the
        // most-recently-touched key.
        let (conv, touched) = self
            .conversations
            .get_mut(key)
            .unwrap_or_else(|| unreachable!("conversation inserted above"));
        *touched = clock;
        conv.title = title.to_string();
        conv.is_group = is_group;
        conv
    }

    fn evict_lru(&mut self) {
        while self.conversations.len() > self.capacity {
            let Some(oldest) = self
                .conversations
                .iter()
                .min_by_key(|(_, (_, touched))| *touched)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            debug!(key = %oldest, "evicted least-recently-used conversation");
            self.conversations.remove(&oldest);
        }
    }
}
