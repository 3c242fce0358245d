// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The `TRADE_CREATED` payload and its stable textual encoding.
//!
//! `serde` serializes struct fields in declaration order, not hash order,
//! so two writer processes serializing the same logical trade produce
//! byte-identical JSON. This is what keeps the frame's trailing CRC
//! reproducible across independent writer runs.

use serde::{Deserialize, Serialize};

/// Event type tag for the frame header's `event_type` byte.
pub const EVENT_TYPE_TRADE_CREATED: u8 = 1;

/// A single trade submission, as recorded in the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeCreated {
    pub trade_id: String,
    pub account_id: String,
    pub symbol: String,
    pub quantity: u64,
    pub price: u64,
    pub side: String,
    pub timestamp_ns: u64,
}

impl TradeCreated {
    /// Serialize to the stable textual form stored as a frame payload.
    pub fn to_payload_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TradeCreated {
        TradeCreated {
            trade_id: "t1".into(),
            account_id: "acct-1".into(),
            symbol: "AAPL".into(),
            quantity: 100,
            price: 19_050,
            side: "BUY".into(),
            timestamp_ns: 42,
        }
    }

    #[test]
    fn encoding_is_stable_across_calls() {
        let a = sample().to_payload_bytes().expect("encode a");
        let b = sample().to_payload_bytes().expect("encode b");
        assert_eq!(a, b);
    }

    #[test]
    fn fields_serialize_in_declaration_order() {
        let bytes = sample().to_payload_bytes().expect("encode");
        let text = String::from_utf8(bytes).expect("utf8");
        let trade_id_pos = text.find("trade_id").unwrap();
        let account_id_pos = text.find("account_id").unwrap();
        let symbol_pos = text.find("symbol").unwrap();
        let quantity_pos = text.find("quantity").unwrap();
        assert!(trade_id_pos < account_id_pos);
        assert!(account_id_pos < symbol_pos);
        assert!(symbol_pos < quantity_pos);
    }
}
