// SPDX-FileCopyrightText: 2026 Glimpse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery sink trait for the off-device transport layer.

use crate::types::Delivery;

/// Receiver for newly-deliverable messages.
///
/// The reconciliation driver calls [`deliver`](DeliverySink::deliver)
/// synchronously, in reconciliation order, for each message that produced a
/// new incoming entry. Implementations must enqueue and return promptly; the
/// transport owns retry and backoff for actually shipping the message, and
/// must not block the driver.
pub trait DeliverySink: Send + Sync {
    fn deliver(&self, delivery: Delivery);
}
