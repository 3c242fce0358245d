// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Append-only binary trade event log.
//!
//! A single writer process appends strictly ordered `Frame`s to a
//! growing file (`writer`); a separate reader process memory-maps that
//! file and tails it (`reader` + `tailer`), handing decoded frames to a
//! consumer thread through a lock-free SPSC ring (`ring`), which
//! validates each event (`validator`) and records its latency
//! (`histogram`).
//!
//! # Quick start
//!
//! ```no_run
//! use tradelog::writer::LogWriter;
//! use tradelog::payload::{TradeCreated, EVENT_TYPE_TRADE_CREATED};
//!
//! let writer = LogWriter::open("event_log.bin")?;
//! let trade = TradeCreated {
//!     trade_id: "t1".into(),
//!     account_id: "a1".into(),
//!     symbol: "AAPL".into(),
//!     quantity: 100,
//!     price: 19_050,
//!     side: "BUY".into(),
//!     timestamp_ns: 0,
//! };
//! writer.append(EVENT_TYPE_TRADE_CREATED, trade.to_payload_bytes()?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod frame;
pub mod histogram;
pub mod payload;
pub mod reader;
pub mod ring;
pub mod tailer;
pub mod validator;
pub mod writer;

pub use config::LogPathConfig;
pub use error::TradeLogError;
pub use frame::{FileHeader, Frame};
pub use histogram::LatencyHistogram;
pub use payload::TradeCreated;
pub use reader::LogReader;
pub use ring::SpscRing;
pub use tailer::Tailer;
pub use validator::Validator;
pub use writer::LogWriter;
