// SPDX-FileCopyrightText: 2026 Glimpse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the two external seams of the engine.
//!
//! The transport layer implements [`DeliverySink`]; the gesture/sampler
//! layer implements [`ChatSurface`]. Both live outside this workspace.

pub mod sink;
pub mod surface;

pub use sink::DeliverySink;
pub use surface::ChatSurface;
