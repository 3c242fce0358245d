// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-event semantic validation with atomic counters.

use crate::frame::Frame;
use crate::payload::EVENT_TYPE_TRADE_CREATED;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Validation counters. All fields use `Relaxed` ordering for minimal
/// overhead; they are eventually consistent across threads.
#[derive(Debug, Default)]
pub struct Validator {
    events_processed: AtomicU64,
    trades_validated: AtomicU64,
    validation_errors: AtomicU64,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply semantic checks to a decoded frame and update counters.
    pub fn validate(&self, frame: &Frame) {
        self.events_processed.fetch_add(1, Ordering::Relaxed);

        if frame.event_type == EVENT_TYPE_TRADE_CREATED {
            if Self::is_valid_trade_created(&frame.payload) {
                self.trades_validated.fetch_add(1, Ordering::Relaxed);
            } else {
                self.validation_errors.fetch_add(1, Ordering::Relaxed);
                warn!(
                    sequence_num = frame.sequence_num,
                    "TRADE_CREATED payload missing required fields"
                );
            }
        }
    }

    fn is_valid_trade_created(payload: &[u8]) -> bool {
        if payload.is_empty() {
            return false;
        }
        let text = String::from_utf8_lossy(payload);
        text.contains("trade_id") && text.contains("symbol") && text.contains("quantity")
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed.load(Ordering::Relaxed)
    }

    pub fn trades_validated(&self) -> u64 {
        self.trades_validated.load(Ordering::Relaxed)
    }

    pub fn validation_errors(&self) -> u64 {
        self.validation_errors.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_payload(event_type: u8, payload: &str) -> Frame {
        Frame {
            sequence_num: 1,
            timestamp_ns: 0,
            event_type,
            payload: payload.as_bytes().to_vec(),
        }
    }

    #[test]
    fn valid_trade_created_increments_trades_validated() {
        let validator = Validator::new();
        let frame = frame_with_payload(
            EVENT_TYPE_TRADE_CREATED,
            r#"{"trade_id":"t1","symbol":"AAPL","quantity":100}"#,
        );
        validator.validate(&frame);
        assert_eq!(validator.events_processed(), 1);
        assert_eq!(validator.trades_validated(), 1);
        assert_eq!(validator.validation_errors(), 0);
    }

    #[test]
    fn missing_field_increments_validation_errors() {
        let validator = Validator::new();
        let frame = frame_with_payload(EVENT_TYPE_TRADE_CREATED, r#"{"trade_id":"t1"}"#);
        validator.validate(&frame);
        assert_eq!(validator.events_processed(), 1);
        assert_eq!(validator.trades_validated(), 0);
        assert_eq!(validator.validation_errors(), 1);
    }

    #[test]
    fn empty_payload_is_invalid() {
        let validator = Validator::new();
        let frame = frame_with_payload(EVENT_TYPE_TRADE_CREATED, "");
        validator.validate(&frame);
        assert_eq!(validator.validation_errors(), 1);
    }

    #[test]
    fn unknown_event_type_only_increments_events_processed() {
        let validator = Validator::new();
        let frame = frame_with_payload(99, "anything");
        validator.validate(&frame);
        assert_eq!(validator.events_processed(), 1);
        assert_eq!(validator.trades_validated(), 0);
        assert_eq!(validator.validation_errors(), 0);
    }
}
