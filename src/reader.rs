// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Memory-mapped, sequential, tail-following log reader.

use crate::error::TradeLogError;
use crate::frame::{FileHeader, Frame, FRAME_HEADER_SIZE, FRAME_OVERHEAD};
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// Opens a log file read-only and yields frames sequentially.
///
/// Holds exactly one memory mapping at a time; `remap_if_grown` replaces it
/// in place when the file has grown, preserving the read cursor.
pub struct LogReader {
    file: File,
    mmap: Mmap,
    #[allow(dead_code)]
    header: FileHeader,
    offset: usize,
}

impl LogReader {
    /// Open the log read-only, memory-map it, and parse the file header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TradeLogError> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        if (size as usize) < FileHeader::SIZE {
            return Err(TradeLogError::InsufficientData {
                need: FileHeader::SIZE,
                have: size as usize,
            });
        }

        // SAFETY: the file is opened read-only for the duration of this
        // mapping's lifetime; concurrent external truncation is the
        // caller's responsibility to avoid, as with any mmap'd reader.
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        advise_sequential(&mmap);

        let header = FileHeader::parse(&mmap)?;

        Ok(Self {
            file,
            mmap,
            header,
            offset: FileHeader::SIZE,
        })
    }

    /// Read the next frame, advancing the cursor on success.
    ///
    /// Returns `Ok(false)` at EOF or on a torn tail (never an error, per
    /// the "no torn frames visible" invariant). Returns `Err` only for a
    /// CRC mismatch on a fully-present frame.
    pub fn read_next(&mut self) -> Result<Option<Frame>, TradeLogError> {
        let data = &self.mmap[..];
        let file_size = data.len();

        if self.offset >= file_size {
            return Ok(None);
        }
        if self.offset + FRAME_HEADER_SIZE > file_size {
            debug!(offset = self.offset, "torn tail: incomplete frame header");
            return Ok(None);
        }

        let payload_length = u32::from_le_bytes([
            data[self.offset + 20],
            data[self.offset + 21],
            data[self.offset + 22],
            data[self.offset + 23],
        ]) as usize;
        let total = FRAME_OVERHEAD + payload_length;

        if self.offset + total > file_size {
            debug!(offset = self.offset, total, "torn tail: incomplete frame body");
            return Ok(None);
        }

        let frame = Frame::parse(&data[self.offset..self.offset + total])?;
        self.offset += total;
        Ok(Some(frame))
    }

    /// Re-stat the file; if it has grown, unmap and remap the full new
    /// size, preserving the read cursor. Returns whether a remap occurred.
    pub fn remap_if_grown(&mut self) -> Result<bool, TradeLogError> {
        let new_size = self.file.metadata()?.len() as usize;
        if new_size <= self.mmap.len() {
            return Ok(false);
        }

        // SAFETY: same safety contract as the initial mapping in `open`.
        let mmap = unsafe { MmapOptions::new().map(&self.file)? };
        advise_sequential(&mmap);
        self.mmap = mmap;
        debug!(new_size, "remapped log file after growth");
        Ok(true)
    }

    /// Current read cursor, in bytes from the start of the file.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

#[cfg(target_os = "linux")]
fn advise_sequential(mmap: &Mmap) {
    // SAFETY: the pointer and length are exactly those of a live mapping
    // owned by `mmap`; `madvise` with MADV_SEQUENTIAL is a hint only and
    // cannot invalidate the mapping.
    let result = unsafe {
        libc::madvise(
            mmap.as_ptr() as *mut libc::c_void,
            mmap.len(),
            libc::MADV_SEQUENTIAL,
        )
    };
    if result != 0 {
        warn!("madvise(MADV_SEQUENTIAL) failed: {}", std::io::Error::last_os_error());
    }
}

#[cfg(not(target_os = "linux"))]
fn advise_sequential(_mmap: &Mmap) {}
