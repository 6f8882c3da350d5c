// SPDX-FileCopyrightText: 2026 Glimpse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciliation driver: feeds one snapshot through the fingerprint builder
//! and entry matcher, assigns sequence numbers, and hands newly-deliverable
//! messages to the delivery sink.
//!
//! All mutation of the store happens under one mutex: reconciling two
//! snapshots against the same engine concurrently is serialized, and the
//! matcher always observes a consistent view of all three indexes.

use std::collections::HashSet;
use std::sync::Arc;

use glimpse_config::EngineConfig;
use glimpse_core::traits::DeliverySink;
use glimpse_core::types::{Delivery, RawMessage};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::fingerprint::{HashKey, build_fingerprint};
use crate::matcher::find_match;
use crate::store::ConversationStore;

/// Read-only match statistics for one snapshot against stored history.
///
/// Consumed by the scroll controller: `matched == 0 && gap > 0` for a
/// conversation with prior history means the visible window shares nothing
/// with what we know, i.e. a jump occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchStats {
    /// Qualifying incoming items that resolved to a stored entry.
    pub matched: usize,
    /// Qualifying incoming items with no history hit.
    pub gap: usize,
}

/// Per-snapshot reconciliation summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileOutcome {
    /// Messages handed to the delivery sink.
    pub delivered: usize,
    /// Items resolved to an existing entry (hidden/duplicate).
    pub matched: usize,
    /// New entries created.
    pub created: usize,
    /// Unfingerprintable items (outgoing, system, blank).
    pub ignored: usize,
}

/// The conversation reconciliation engine.
///
/// One engine per process/session: it owns the LRU conversation store behind
/// a single mutex and the delivery sink handed in at construction. No global
/// state.
pub struct Engine {
    config: EngineConfig,
    store: Mutex<ConversationStore>,
    sink: Arc<dyn DeliverySink>,
}

impl Engine {
    pub fn new(config: EngineConfig, sink: Arc<dyn DeliverySink>) -> Self {
        let store = ConversationStore::new(config.max_conversations);
        Self {
            config,
            store: Mutex::new(store),
            sink,
        }
    }

    /// Reconcile one snapshot for a conversation.
    ///
    /// Items are processed in snapshot order. Each fingerprintable item
    /// either resolves to an existing entry (marked hidden/duplicate, never
    /// re-delivered) or creates a new one. New incoming entries are handed
    /// to the delivery sink immediately and synchronously, except during the
    /// baseline pass (first-ever reconciliation), where only the single
    /// most-recent qualifying incoming item is delivered so the sink is not
    /// flooded with pre-existing backlog.
    pub async fn reconcile(
        &self,
        key: &str,
        title: &str,
        is_group: bool,
        messages: &[RawMessage],
    ) -> ReconcileOutcome {
        let quantum = self.config.position_quantum;
        let mut store = self.store.lock().await;
        let conv = store.get_or_insert(key, title, is_group);

        let baseline = !conv.initialized;
        // During the baseline pass, only the most recent qualifying incoming
        // item may be delivered.
        let baseline_deliverable: Option<usize> = if baseline {
            messages
                .iter()
                .enumerate()
                .rev()
                .find(|(_, m)| m.incoming && build_fingerprint(m, quantum).is_some())
                .map(|(idx, _)| idx)
        } else {
            None
        };

        let mut outcome = ReconcileOutcome::default();
        let mut claimed = HashSet::new();
        let mut prev_base = HashKey::START;

        for (idx, message) in messages.iter().enumerate() {
            let Some(fp) = build_fingerprint(message, quantum) else {
                outcome.ignored += 1;
                continue;
            };

            match find_match(conv, &fp, prev_base, &claimed) {
                Some(handle) => {
                    conv.apply_match(handle, &fp);
                    claimed.insert(handle);
                    outcome.matched += 1;
                    debug!(
                        key,
                        base = %fp.base.short(),
                        "snapshot item matched existing entry"
                    );
                }
                None => {
                    let handle = conv.insert(&fp, prev_base);
                    claimed.insert(handle);
                    outcome.created += 1;

                    let deliverable =
                        message.incoming && (!baseline || baseline_deliverable == Some(idx));
                    if deliverable {
                        outcome.delivered += 1;
                        let sequence = conv.entry(handle).map(|e| e.sequence).unwrap_or(0);
                        info!(key, sequence, baseline, "delivering new message");
                        self.sink.deliver(Delivery {
                            conversation_key: key.to_string(),
                            title: title.to_string(),
                            is_group,
                            message: message.clone(),
                        });
                    }
                }
            }

            prev_base = fp.base;
        }

        let evicted = conv.enforce_cap(self.config.max_messages_per_chat);
        if evicted > 0 {
            info!(key, evicted, "conversation history trimmed to cap");
        }
        conv.initialized = true;

        debug!(
            key,
            delivered = outcome.delivered,
            matched = outcome.matched,
            created = outcome.created,
            ignored = outcome.ignored,
            "snapshot reconciled"
        );
        outcome
    }

    /// Read-only match statistics for a snapshot, without mutating state.
    ///
    /// Runs the same fingerprint and prev-base threading as [`reconcile`]
    /// (Engine::reconcile) but only counts hits and misses among qualifying
    /// incoming items. A conversation with no stored history reports
    /// everything as gap.
    pub async fn match_stats(&self, key: &str, messages: &[RawMessage]) -> MatchStats {
        let quantum = self.config.position_quantum;
        let mut store = self.store.lock().await;

        let mut stats = MatchStats::default();
        let Some(conv) = store.get(key) else {
            stats.gap = messages
                .iter()
                .filter(|m| m.incoming && build_fingerprint(m, quantum).is_some())
                .count();
            return stats;
        };

        let mut claimed = HashSet::new();
        let mut prev_base = HashKey::START;
        for message in messages {
            let Some(fp) = build_fingerprint(message, quantum) else {
                continue;
            };
            match find_match(conv, &fp, prev_base, &claimed) {
                Some(handle) => {
                    // Claim locally so duplicate rows within the snapshot
                    // count the way a real pass would, but never write back.
                    claimed.insert(handle);
                    stats.matched += 1;
                }
                None => stats.gap += 1,
            }
            prev_base = fp.base;
        }
        stats
    }

    /// Whether any history is stored for this conversation key.
    pub async fn has_conversation(&self, key: &str) -> bool {
        self.store.lock().await.contains(key)
    }

    /// Number of retained entries for a conversation, 0 if unknown.
    pub async fn conversation_len(&self, key: &str) -> usize {
        self.store
            .lock()
            .await
            .get(key)
            .map(|conv| conv.len())
            .unwrap_or(0)
    }

    /// Whether the conversation has completed its baseline pass.
    pub async fn is_initialized(&self, key: &str) -> bool {
        self.store
            .lock()
            .await
            .get(key)
            .map(|conv| conv.initialized)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimpse_core::types::MessageKind;
    use std::sync::Mutex as StdMutex;

    /// Recording sink: stores deliveries for assertions.
    #[derive(Default)]
    struct RecordingSink {
        deliveries: StdMutex<Vec<Delivery>>,
    }

    impl RecordingSink {
        fn texts(&self) -> Vec<String> {
            self.deliveries
                .lock()
                .unwrap()
                .iter()
                .map(|d| d.message.text.clone().unwrap_or_default())
                .collect()
        }

        fn count(&self) -> usize {
            self.deliveries.lock().unwrap().len()
        }
    }

    impl DeliverySink for RecordingSink {
        fn deliver(&self, delivery: Delivery) {
            self.deliveries.lock().unwrap().push(delivery);
        }
    }

    fn engine_with_sink() -> (Engine, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let engine = Engine::new(EngineConfig::default(), sink.clone());
        (engine, sink)
    }

    fn incoming(sender: &str, text: &str) -> RawMessage {
        RawMessage {
            incoming: true,
            sender: Some(sender.to_string()),
            text: Some(text.to_string()),
            ..RawMessage::default()
        }
    }

    fn outgoing(text: &str) -> RawMessage {
        RawMessage {
            incoming: false,
            text: Some(text.to_string()),
            ..RawMessage::default()
        }
    }

    #[tokio::test]
    async fn baseline_pass_delivers_only_most_recent_incoming() {
        let (engine, sink) = engine_with_sink();
        let snapshot: Vec<RawMessage> = (1..=5)
            .map(|i| incoming("Alice", &format!("message {i}")))
            .collect();

        let outcome = engine.reconcile("alice", "Alice", false, &snapshot).await;

        assert_eq!(outcome.created, 5);
        assert_eq!(outcome.delivered, 1);
        assert_eq!(sink.texts(), vec!["message 5"]);
    }

    #[tokio::test]
    async fn second_snapshot_delivers_only_the_new_message() {
        let (engine, sink) = engine_with_sink();
        let mut snapshot: Vec<RawMessage> = (1..=5)
            .map(|i| incoming("Alice", &format!("message {i}")))
            .collect();
        engine.reconcile("alice", "Alice", false, &snapshot).await;

        snapshot.push(incoming("Alice", "message 6"));
        let outcome = engine.reconcile("alice", "Alice", false, &snapshot).await;

        assert_eq!(outcome.matched, 5);
        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.delivered, 1);
        assert_eq!(sink.texts(), vec!["message 5", "message 6"]);
    }

    #[tokio::test]
    async fn reconcile_is_idempotent() {
        let (engine, sink) = engine_with_sink();
        let snapshot: Vec<RawMessage> = (1..=4)
            .map(|i| incoming("Alice", &format!("message {i}")))
            .collect();

        engine.reconcile("alice", "Alice", false, &snapshot).await;
        let first_count = sink.count();
        let outcome = engine.reconcile("alice", "Alice", false, &snapshot).await;

        assert_eq!(outcome.delivered, 0, "identical snapshot re-delivers nothing");
        assert_eq!(outcome.matched, 4);
        assert_eq!(sink.count(), first_count);
    }

    #[tokio::test]
    async fn outgoing_and_system_rows_are_ignored() {
        let (engine, sink) = engine_with_sink();
        let system = RawMessage {
            incoming: true,
            kind: MessageKind::System,
            text: Some("alice joined".into()),
            ..RawMessage::default()
        };
        let snapshot = vec![outgoing("me first"), system, incoming("Alice", "hello")];

        let outcome = engine.reconcile("alice", "Alice", false, &snapshot).await;

        assert_eq!(outcome.ignored, 2);
        assert_eq!(outcome.created, 1);
        assert_eq!(sink.texts(), vec!["hello"]);
    }

    #[tokio::test]
    async fn baseline_with_no_qualifying_incoming_delivers_nothing() {
        let (engine, sink) = engine_with_sink();
        let snapshot = vec![outgoing("just me"), outgoing("talking to myself")];

        let outcome = engine.reconcile("self", "Self", false, &snapshot).await;

        assert_eq!(outcome.delivered, 0);
        assert_eq!(outcome.ignored, 2);
        assert_eq!(sink.count(), 0);
        assert!(engine.is_initialized("self").await);
    }

    #[tokio::test]
    async fn steady_state_delivers_in_snapshot_order() {
        let (engine, sink) = engine_with_sink();
        engine
            .reconcile("alice", "Alice", false, &[incoming("Alice", "opener")])
            .await;

        let snapshot = vec![
            incoming("Alice", "opener"),
            incoming("Alice", "second"),
            incoming("Alice", "third"),
        ];
        engine.reconcile("alice", "Alice", false, &snapshot).await;

        assert_eq!(sink.texts(), vec!["opener", "second", "third"]);
    }

    #[tokio::test]
    async fn at_most_once_delivery_across_reordered_snapshots() {
        let (engine, sink) = engine_with_sink();
        let a = incoming("Alice", "alpha");
        let b = incoming("Alice", "beta");
        let c = incoming("Alice", "gamma");

        engine
            .reconcile("alice", "Alice", false, &[a.clone(), b.clone(), c.clone()])
            .await;
        // The UI partially redraws: same rows, shuffled order.
        engine
            .reconcile("alice", "Alice", false, &[b.clone(), a.clone(), c.clone()])
            .await;

        // Only the baseline delivery ever happened.
        assert_eq!(sink.texts(), vec!["gamma"]);
    }

    #[tokio::test]
    async fn chain_recovery_does_not_duplicate_on_content_drift() {
        let (engine, sink) = engine_with_sink();
        let a = incoming("Alice", "first");
        let b = incoming("Bob", "second");
        engine
            .reconcile("group", "Group", true, &[a.clone(), b.clone()])
            .await;
        assert_eq!(engine.conversation_len("group").await, 2);

        // B's sender attribution dropped, so its content hash drifts; the
        // chain (prev_base -> base) still anchors it to the stored entry.
        let b_drifted = RawMessage {
            sender: None,
            ..b.clone()
        };
        let outcome = engine
            .reconcile("group", "Group", true, &[a.clone(), b_drifted])
            .await;

        assert_eq!(outcome.created, 0);
        assert_eq!(outcome.matched, 2);
        assert_eq!(engine.conversation_len("group").await, 2);
        assert_eq!(sink.texts(), vec!["second"]);
    }

    #[tokio::test]
    async fn eviction_bound_holds_under_backlog_flood() {
        let sink = Arc::new(RecordingSink::default());
        let config = EngineConfig {
            max_messages_per_chat: 10,
            ..EngineConfig::default()
        };
        let engine = Engine::new(config, sink.clone());

        for batch in 0..5 {
            let snapshot: Vec<RawMessage> = (0..6)
                .map(|i| incoming("Alice", &format!("batch {batch} msg {i}")))
                .collect();
            engine.reconcile("alice", "Alice", false, &snapshot).await;
        }

        assert_eq!(engine.conversation_len("alice").await, 10);
    }

    #[tokio::test]
    async fn match_stats_reports_full_gap_for_unknown_conversation() {
        let (engine, _sink) = engine_with_sink();
        let snapshot = vec![incoming("Alice", "hi"), outgoing("yo")];

        let stats = engine.match_stats("ghost", &snapshot).await;
        assert_eq!(stats, MatchStats { matched: 0, gap: 1 });
        assert!(!engine.has_conversation("ghost").await);
    }

    #[tokio::test]
    async fn match_stats_does_not_mutate_history() {
        let (engine, sink) = engine_with_sink();
        engine
            .reconcile("alice", "Alice", false, &[incoming("Alice", "known")])
            .await;

        let probe = vec![incoming("Alice", "known"), incoming("Alice", "unknown")];
        let stats = engine.match_stats("alice", &probe).await;
        assert_eq!(stats, MatchStats { matched: 1, gap: 1 });

        // Nothing was created or delivered by the probe.
        assert_eq!(engine.conversation_len("alice").await, 1);
        assert_eq!(sink.count(), 1);

        // The unknown item still delivers when reconciled for real.
        engine.reconcile("alice", "Alice", false, &probe).await;
        assert_eq!(sink.texts(), vec!["known", "unknown"]);
    }

    #[tokio::test]
    async fn sequences_are_strictly_increasing_across_snapshots() {
        let (engine, _sink) = engine_with_sink();
        engine
            .reconcile(
                "alice",
                "Alice",
                false,
                &[incoming("Alice", "one"), incoming("Alice", "two")],
            )
            .await;
        engine
            .reconcile(
                "alice",
                "Alice",
                false,
                &[
                    incoming("Alice", "one"),
                    incoming("Alice", "two"),
                    incoming("Alice", "three"),
                ],
            )
            .await;

        let store = engine.store.lock().await;
        let conv = store.peek("alice").expect("conversation exists");
        let sequences: Vec<u64> = conv
            .handles()
            .filter_map(|h| conv.entry(h))
            .map(|e| e.sequence)
            .collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn conversation_store_is_lru_bounded() {
        let sink = Arc::new(RecordingSink::default());
        let config = EngineConfig {
            max_conversations: 2,
            ..EngineConfig::default()
        };
        let engine = Engine::new(config, sink);

        engine
            .reconcile("a", "A", false, &[incoming("A", "hi")])
            .await;
        engine
            .reconcile("b", "B", false, &[incoming("B", "hi")])
            .await;
        engine
            .reconcile("c", "C", false, &[incoming("C", "hi")])
            .await;

        assert!(!engine.has_conversation("a").await);
        assert!(engine.has_conversation("b").await);
        assert!(engine.has_conversation("c").await);
    }
}
