// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary event frame and file header codec.
//!
//! # Frame layout
//!
//! ```text
//! +------------------------------------------------------------+
//! | sequence_num (8) | timestamp_ns (8) | event_type (1)       |
//! | reserved (3) | payload_length (4) | payload (N) | crc32 (4)|
//! +------------------------------------------------------------+
//! ```
//!
//! # File header (16 bytes, written once at offset 0)
//!
//! ```text
//! +------------------------------------------------------------+
//! | magic (4) | version (4) | reserved (8)                     |
//! +------------------------------------------------------------+
//! ```

use crate::error::TradeLogError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// Magic value: "TRAD" in little-endian.
pub const MAGIC: u32 = 0x5452_4144;

/// Current file format version.
pub const FORMAT_VERSION: u32 = 1;

/// Fixed frame header size, excluding payload and trailing CRC.
pub const FRAME_HEADER_SIZE: usize = 24;

/// Trailing CRC size.
pub const FRAME_CRC_SIZE: usize = 4;

/// Total frame overhead (header + CRC) around the payload.
pub const FRAME_OVERHEAD: usize = FRAME_HEADER_SIZE + FRAME_CRC_SIZE;

/// File header size.
pub const FILE_HEADER_SIZE: usize = 16;

/// A single decoded event frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub sequence_num: u64,
    pub timestamp_ns: u64,
    pub event_type: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Serialize this frame to its exact on-disk byte representation.
    ///
    /// Allocates exactly `FRAME_OVERHEAD + payload.len()` bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let total = FRAME_OVERHEAD + self.payload.len();
        let mut buf = Vec::with_capacity(total);

        buf.write_u64::<LittleEndian>(self.sequence_num)
            .expect("write to Vec never fails");
        buf.write_u64::<LittleEndian>(self.timestamp_ns)
            .expect("write to Vec never fails");
        buf.push(self.event_type);
        buf.extend_from_slice(&[0u8; 3]); // reserved
        buf.write_u32::<LittleEndian>(self.payload.len() as u32)
            .expect("write to Vec never fails");
        buf.extend_from_slice(&self.payload);

        let crc = crc32fast::hash(&buf);
        buf.write_u32::<LittleEndian>(crc)
            .expect("write to Vec never fails");

        buf
    }

    /// Parse a single frame from a byte slice that is known to contain at
    /// least one complete frame at its start.
    ///
    /// Returns `InsufficientData` if `bytes` is shorter than the frame it
    /// claims to hold, and `CorruptedFrame` if the stored CRC does not match
    /// the recomputed CRC over the frame's bytes.
    pub fn parse(bytes: &[u8]) -> Result<Frame, TradeLogError> {
        if bytes.len() < FRAME_HEADER_SIZE {
            return Err(TradeLogError::InsufficientData {
                need: FRAME_HEADER_SIZE,
                have: bytes.len(),
            });
        }

        let mut cursor = bytes;
        let sequence_num = cursor.read_u64::<LittleEndian>().expect("length checked");
        let timestamp_ns = cursor.read_u64::<LittleEndian>().expect("length checked");
        let event_type = cursor.read_u8().expect("length checked");
        let mut reserved = [0u8; 3];
        std::io::Read::read_exact(&mut cursor, &mut reserved).expect("length checked");
        let payload_length = cursor.read_u32::<LittleEndian>().expect("length checked") as usize;

        let total = FRAME_OVERHEAD + payload_length;
        if bytes.len() < total {
            return Err(TradeLogError::InsufficientData {
                need: total,
                have: bytes.len(),
            });
        }

        let payload_start = FRAME_HEADER_SIZE;
        let payload_end = payload_start + payload_length;
        let payload = bytes[payload_start..payload_end].to_vec();

        let crc_offset = payload_end;
        let stored_crc = (&bytes[crc_offset..crc_offset + FRAME_CRC_SIZE])
            .read_u32::<LittleEndian>()
            .expect("length checked");
        let computed_crc = crc32fast::hash(&bytes[..payload_end]);

        if stored_crc != computed_crc {
            return Err(TradeLogError::CorruptedFrame { sequence_num });
        }

        Ok(Frame {
            sequence_num,
            timestamp_ns,
            event_type,
            payload,
        })
    }
}

/// The 16-byte file header written once at file creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub magic: u32,
    pub version: u32,
}

impl FileHeader {
    pub const SIZE: usize = FILE_HEADER_SIZE;

    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            version: FORMAT_VERSION,
        }
    }

    /// Serialize the header to its exact 16-byte on-disk form.
    pub fn serialize(&self) -> [u8; FILE_HEADER_SIZE] {
        let mut buf = [0u8; FILE_HEADER_SIZE];
        let mut w = &mut buf[..];
        w.write_u32::<LittleEndian>(self.magic)
            .expect("fixed-size buffer");
        w.write_u32::<LittleEndian>(self.version)
            .expect("fixed-size buffer");
        // remaining 8 bytes stay zero (reserved)
        buf
    }

    /// Parse and validate a file header from its leading bytes.
    pub fn parse(bytes: &[u8]) -> Result<FileHeader, TradeLogError> {
        if bytes.len() < FILE_HEADER_SIZE {
            return Err(TradeLogError::InsufficientData {
                need: FILE_HEADER_SIZE,
                have: bytes.len(),
            });
        }

        let mut cursor = bytes;
        let magic = cursor.read_u32::<LittleEndian>().expect("length checked");
        let version = cursor.read_u32::<LittleEndian>().expect("length checked");

        if magic != MAGIC || version != FORMAT_VERSION {
            return Err(TradeLogError::BadHeader { magic, version });
        }

        Ok(FileHeader { magic, version })
    }
}

impl Default for FileHeader {
    fn default() -> Self {
        Self::new()
    }
}
