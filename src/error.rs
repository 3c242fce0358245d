// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Crate-wide error taxonomy for the event log.

use thiserror::Error;

/// Errors raised by the frame codec, writer, and reader.
#[derive(Debug, Error)]
pub enum TradeLogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad file header: magic=0x{magic:08x} version={version}")]
    BadHeader { magic: u32, version: u32 },

    #[error("insufficient data: need {need} bytes, have {have}")]
    InsufficientData { need: usize, have: usize },

    #[error("corrupted frame at sequence {sequence_num}: CRC mismatch")]
    CorruptedFrame { sequence_num: u64 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
