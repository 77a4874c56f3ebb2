// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message is a plain struct implementing `Display` (a human-readable
//! line) and [`StructuredLog`] (the same event with tracing fields
//! attached). Call sites construct the message and invoke `.log()`, keeping
//! log formatting out of engine code.

pub mod engine;
pub mod planner;

use tracing::Span;

/// Emit a message through `tracing` with structured fields.
pub trait StructuredLog {
    /// Log at the message's designated level with its fields attached.
    fn log(&self);

    /// Create a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
