// SPDX-FileCopyrightText: 2026 Glimpse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scroll controller: decides when to scroll the chat list down (catch up to
//! latest) or up (recover older context), with cooldowns to avoid thrashing.
//!
//! States per conversation are `Idle`, `ScrollingDown`, `ScrollingUp`; both
//! scroll loops are bounded by a fixed step budget and return to `Idle`
//! unconditionally when the loop completes. A loop is only abortable between
//! steps, never mid-gesture; an unresponsive UI is a normal negative result
//! that stops the loop with the best snapshot obtained so far.
//!
//! Overlapping scroll attempts on the same conversation are prevented by the
//! per-key cooldowns, not a lock: bounded staleness is acceptable,
//! overlapping destructive UI actions are not.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use glimpse_config::ScrollConfig;
use glimpse_core::traits::ChatSurface;
use glimpse_core::types::RawMessage;
use glimpse_core::GlimpseError;
use glimpse_engine::fingerprint::base_key;
use glimpse_engine::Engine;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Signature of the visible window: oldest key | newest key | row count.
///
/// Two snapshots with the same signature show the same window; a changed
/// signature after a gesture means the list moved.
pub fn snapshot_signature(messages: &[RawMessage]) -> String {
    let oldest = messages
        .iter()
        .find_map(base_key)
        .map(|k| k.short())
        .unwrap_or_else(|| "-".to_string());
    let newest = messages
        .iter()
        .rev()
        .find_map(base_key)
        .map(|k| k.short())
        .unwrap_or_else(|| "-".to_string());
    format!("{oldest}|{newest}|{}", messages.len())
}

/// Per-conversation scroll bookkeeping. Created lazily, bounded implicitly
/// by conversation key churn.
#[derive(Default)]
struct ScrollState {
    last_down_at: Option<Instant>,
    last_down_signature: Option<String>,
    last_no_change_at: Option<Instant>,
    last_up_at: Option<Instant>,
    last_up_signature: Option<String>,
}

/// Outcome of one settle cycle, including the best snapshot obtained.
#[derive(Debug)]
pub struct ScrollResult {
    /// The final visible window after all scrolling settled.
    pub snapshot: Vec<RawMessage>,
    /// Scroll-down gestures performed (productive or confirming).
    pub down_steps: u32,
    /// Scroll-up gestures performed.
    pub up_steps: u32,
    /// Whether a scroll-up step surfaced a message matching stored history.
    pub anchor_found: bool,
}

/// Cooldown-gated scroll state machine over a [`ChatSurface`].
pub struct ScrollController {
    config: ScrollConfig,
    states: Mutex<HashMap<String, ScrollState>>,
}

impl ScrollController {
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            config,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Run one settle cycle for a conversation: scroll down to the latest
    /// content if the window changed or the cooldown elapsed, then scroll up
    /// to recover backlog if the visible window shares nothing with stored
    /// history. Returns the best snapshot obtained.
    pub async fn settle(
        &self,
        engine: &Engine,
        surface: &dyn ChatSurface,
        key: &str,
    ) -> Result<ScrollResult, GlimpseError> {
        let mut snapshot = surface.snapshot().await?;
        let signature = snapshot_signature(&snapshot);

        let mut result = ScrollResult {
            snapshot: Vec::new(),
            down_steps: 0,
            up_steps: 0,
            anchor_found: false,
        };

        if self.should_scroll_down(key, &signature).await {
            snapshot = self
                .scroll_down(surface, key, snapshot, signature, &mut result)
                .await?;
        }

        // A jump is only recoverable against prior stored history.
        if engine.has_conversation(key).await {
            let stats = engine.match_stats(key, &snapshot).await;
            if stats.matched == 0
                && stats.gap > 0
                && self
                    .should_scroll_up(key, &snapshot_signature(&snapshot))
                    .await
            {
                info!(key, gap = stats.gap, "visible window shares nothing with history");
                snapshot = self
                    .scroll_up(engine, surface, key, snapshot, stats.gap, &mut result)
                    .await?;
            }
        }

        result.snapshot = snapshot;
        Ok(result)
    }

    /// Scroll-down trigger: the window signature moved since the last sweep,
    /// or the general cooldown elapsed, or the shorter no-change cooldown
    /// elapsed after a sweep that saw no movement.
    async fn should_scroll_down(&self, key: &str, signature: &str) -> bool {
        let down_cooldown = Duration::from_millis(self.config.down_cooldown_ms);
        let no_change_cooldown = Duration::from_millis(self.config.no_change_cooldown_ms);

        let mut states = self.states.lock().await;
        let state = states.entry(key.to_string()).or_default();

        if state.last_down_signature.as_deref() != Some(signature) {
            return true;
        }
        let general_ok = state
            .last_down_at
            .is_none_or(|at| at.elapsed() >= down_cooldown);
        let no_change_ok = state
            .last_no_change_at
            .is_some_and(|at| at.elapsed() >= no_change_cooldown);
        general_ok || no_change_ok
    }

    /// Scroll-up trigger: the up cooldown elapsed, and the window moved
    /// since the last recovery attempt ended. Re-running the same search
    /// from the same window would tread the same ground.
    async fn should_scroll_up(&self, key: &str, signature: &str) -> bool {
        let up_cooldown = Duration::from_millis(self.config.up_cooldown_ms);
        let mut states = self.states.lock().await;
        let state = states.entry(key.to_string()).or_default();
        if state.last_up_signature.as_deref() == Some(signature) {
            return false;
        }
        state.last_up_at.is_none_or(|at| at.elapsed() >= up_cooldown)
    }

    /// Bounded scroll-to-bottom loop: refresh after each step, stop early
    /// once the signature stops changing or the UI stops responding.
    async fn scroll_down(
        &self,
        surface: &dyn ChatSurface,
        key: &str,
        mut snapshot: Vec<RawMessage>,
        mut signature: String,
        result: &mut ScrollResult,
    ) -> Result<Vec<RawMessage>, GlimpseError> {
        let settle = Duration::from_millis(self.config.step_settle_ms);
        let mut progressed = false;

        while result.down_steps < self.config.max_down_steps {
            if !surface.scroll_to_bottom().await? {
                warn!(key, "scroll down got no UI response");
                break;
            }
            result.down_steps += 1;
            sleep(settle).await;

            let next = surface.snapshot().await?;
            let next_signature = snapshot_signature(&next);
            snapshot = next;
            if next_signature == signature {
                debug!(key, steps = result.down_steps, "scroll down settled");
                break;
            }
            signature = next_signature;
            progressed = true;
        }

        // Record signature and timestamps whether progress was made or not.
        let mut states = self.states.lock().await;
        let state = states.entry(key.to_string()).or_default();
        state.last_down_at = Some(Instant::now());
        state.last_down_signature = Some(signature);
        if !progressed {
            state.last_no_change_at = Some(Instant::now());
        }
        Ok(snapshot)
    }

    /// Bounded scroll-up loop: at most `min(gap, max_up_steps)` steps,
    /// stopping as soon as any visible item matches history (anchor found)
    /// or the window stops moving.
    async fn scroll_up(
        &self,
        engine: &Engine,
        surface: &dyn ChatSurface,
        key: &str,
        mut snapshot: Vec<RawMessage>,
        gap: usize,
        result: &mut ScrollResult,
    ) -> Result<Vec<RawMessage>, GlimpseError> {
        let settle = Duration::from_millis(self.config.step_settle_ms);
        let budget = (gap as u32).min(self.config.max_up_steps);
        let mut signature = snapshot_signature(&snapshot);

        while result.up_steps < budget {
            if !surface.scroll_up().await? {
                warn!(key, "scroll up got no UI response");
                break;
            }
            result.up_steps += 1;
            sleep(settle).await;

            let next = surface.snapshot().await?;
            let next_signature = snapshot_signature(&next);
            snapshot = next;
            if next_signature == signature {
                debug!(key, steps = result.up_steps, "scroll up stalled");
                break;
            }
            signature = next_signature;

            let stats = engine.match_stats(key, &snapshot).await;
            if stats.matched > 0 {
                result.anchor_found = true;
                info!(key, steps = result.up_steps, "anchor found in backlog");
                break;
            }
        }

        let mut states = self.states.lock().await;
        let state = states.entry(key.to_string()).or_default();
        state.last_up_at = Some(Instant::now());
        state.last_up_signature = Some(signature);
        Ok(snapshot)
    }
}
