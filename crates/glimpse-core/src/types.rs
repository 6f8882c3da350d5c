// SPDX-FileCopyrightText: 2026 Glimpse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Glimpse workspace.
//!
//! A [`RawMessage`] is one row of a UI snapshot as produced by the external
//! accessibility-tree sampler. It is ephemeral: every poll replaces the whole
//! snapshot wholesale, and the engine never stores raw messages directly.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The kind of message row observed in the chat list.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    Voice,
    Video,
    Sticker,
    System,
    Unknown,
}

/// Approximate on-screen bounds of a message row, in layout pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn center_x(&self) -> i32 {
        (self.left + self.right) / 2
    }

    pub fn center_y(&self) -> i32 {
        (self.top + self.bottom) / 2
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// One raw message observation from a chat-list snapshot.
///
/// Carries only what the sampler can read off the UI tree: direction, row
/// kind, best-effort sender attribution, visible text or content description,
/// approximate bounds, and interaction flags. There is no native message id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    /// `true` for messages received from the remote party.
    pub incoming: bool,
    /// Row kind as classified by the sampler.
    pub kind: MessageKind,
    /// Sender display name, when the UI attributes one. Often lags behind
    /// the message row itself in group chats.
    pub sender: Option<String>,
    /// Visible message text, if any.
    pub text: Option<String>,
    /// Content description (media rows, stickers), if any.
    pub description: Option<String>,
    /// Approximate screen bounds. `None` when the row was only partially laid out.
    pub bounds: Option<Rect>,
    pub clickable: bool,
    pub long_clickable: bool,
}

/// A newly-deliverable message handed to the transport layer.
///
/// Produced at most once per reconciled identity for the lifetime of the
/// conversation's retained history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    /// Conversation key (chat id or title) the message belongs to.
    pub conversation_key: String,
    /// Conversation title as currently displayed.
    pub title: String,
    /// Whether the conversation is a group chat.
    pub is_group: bool,
    /// The raw observation that produced the new entry.
    pub message: RawMessage,
}
