// SPDX-FileCopyrightText: 2026 Glimpse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end flow: scroll controller settling a scripted chat surface,
//! reconciliation warming history, and deliveries flowing to the sink.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use glimpse_config::{EngineConfig, ScrollConfig};
use glimpse_core::traits::{ChatSurface, DeliverySink};
use glimpse_core::types::{Delivery, RawMessage};
use glimpse_core::GlimpseError;
use glimpse_engine::Engine;
use glimpse_scroll::ScrollController;

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
}

impl DeliverySink for RecordingSink {
    fn deliver(&self, delivery: Delivery) {
        self.deliveries.lock().unwrap().push(delivery);
    }
}

struct ScriptedSurface {
    current: StdMutex<Vec<RawMessage>>,
    up_windows: StdMutex<VecDeque<Vec<RawMessage>>>,
}

impl ScriptedSurface {
    fn new(initial: Vec<RawMessage>) -> Self {
        Self {
            current: StdMutex::new(initial),
            up_windows: StdMutex::new(VecDeque::new()),
        }
    }
}

#[async_trait::async_trait]
impl ChatSurface for ScriptedSurface {
    async fn snapshot(&self) -> Result<Vec<RawMessage>, GlimpseError> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn scroll_to_bottom(&self) -> Result<bool, GlimpseError> {
        // Already at the bottom throughout this scenario.
        Ok(true)
    }

    async fn scroll_up(&self) -> Result<bool, GlimpseError> {
        if let Some(window) = self.up_windows.lock().unwrap().pop_front() {
            *self.current.lock().unwrap() = window;
        }
        Ok(true)
    }
}

fn incoming(text: &str) -> RawMessage {
    RawMessage {
        incoming: true,
        sender: Some("Alice".to_string()),
        text: Some(text.to_string()),
        ..RawMessage::default()
    }
}

fn window(texts: &[&str]) -> Vec<RawMessage> {
    texts.iter().map(|t| incoming(t)).collect()
}

/// A full session: baseline attach, a new message arriving, then a window
/// jump recovered by scrolling up to an anchor. Deliveries stay exactly-once
/// throughout.
#[tokio::test]
async fn attach_deliver_jump_and_recover() {
    let sink = Arc::new(RecordingSink::default());
    let engine = Engine::new(EngineConfig::default(), sink.clone());
    let controller = ScrollController::new(ScrollConfig {
        step_settle_ms: 1,
        up_cooldown_ms: 0,
        down_cooldown_ms: 0,
        no_change_cooldown_ms: 0,
        ..ScrollConfig::default()
    });

    // 1. Attach: three messages already on screen; baseline delivers one.
    let surface = ScriptedSurface::new(window(&["one", "two", "three"]));
    let settled = controller.settle(&engine, &surface, "alice").await.unwrap();
    engine
        .reconcile("alice", "Alice", false, &settled.snapshot)
        .await;
    assert_eq!(sink.texts(), vec!["three"]);

    // 2. A new message arrives at the bottom.
    *surface.current.lock().unwrap() = window(&["one", "two", "three", "four"]);
    let settled = controller.settle(&engine, &surface, "alice").await.unwrap();
    assert_eq!(settled.up_steps, 0, "window overlaps history, no recovery needed");
    engine
        .reconcile("alice", "Alice", false, &settled.snapshot)
        .await;
    assert_eq!(sink.texts(), vec!["three", "four"]);

    // 3. The view jumps: nothing visible matches history. The controller
    //    scrolls up until the anchor reappears.
    *surface.current.lock().unwrap() = window(&["seven", "eight", "nine"]);
    surface
        .up_windows
        .lock()
        .unwrap()
        .extend([window(&["five", "six", "seven"]), window(&["four", "five", "six"])]);

    let settled = controller.settle(&engine, &surface, "alice").await.unwrap();
    assert!(settled.anchor_found);
    assert_eq!(settled.up_steps, 2);

    engine
        .reconcile("alice", "Alice", false, &settled.snapshot)
        .await;

    // The anchored window delivers its unseen messages; "four" is not
    // re-delivered.
    assert_eq!(sink.texts(), vec!["three", "four", "five", "six"]);
}
