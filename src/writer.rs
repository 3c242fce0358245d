// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Append-only log writer.
//!
//! Owns the file handle for append, assigns sequence numbers, and
//! guarantees that concurrent appenders never interleave a frame's bytes.

use crate::clock::monotonic_nanos;
use crate::error::TradeLogError;
use crate::frame::{FileHeader, Frame};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Recovery policy applied to a non-empty log on `LogWriter::open`.
///
/// The source writer this log descends from reset its sequence counter to
/// zero on every reopen, which duplicates sequence numbers across restarts.
/// That is treated here as a bug rather than an intentional "log session"
/// boundary: `Resume` scans the tail on open and continues from
/// `last_sequence + 1`, refusing to open a log whose tail frame is corrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryPolicy {
    #[default]
    Resume,
}

/// Owns the append side of the event log.
pub struct LogWriter {
    // Sequence assignment and the file append must happen under the same
    // critical section: if they were split across two locks (or an atomic
    // plus a lock), one thread could win the sequence race but lose the
    // write race, landing a higher sequence number earlier in the file than
    // a lower one. `next_sequence` is folded into the writer's state and
    // only ever touched with `file` held.
    inner: Mutex<WriterState>,
    path: std::path::PathBuf,
}

struct WriterState {
    file: File,
    next_sequence: u64,
}

impl LogWriter {
    /// Open (creating if missing) the log at `path`.
    ///
    /// Writes the 16-byte file header if the file is empty. If the file is
    /// non-empty, scans forward from offset 16 to the last well-formed frame
    /// and resumes the sequence counter from `last_sequence + 1`; a corrupt
    /// tail frame fails the open with `CorruptedFrame`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TradeLogError> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        let size = file.metadata()?.len();
        let next_sequence = if size == 0 {
            info!(path = %path.display(), "creating new event log");
            file.write_all(&FileHeader::new().serialize())?;
            file.flush()?;
            1
        } else {
            let last_sequence = Self::recover_last_sequence(&mut file)?;
            info!(
                path = %path.display(),
                last_sequence,
                "reopened existing event log"
            );
            last_sequence + 1
        };

        Ok(Self {
            inner: Mutex::new(WriterState {
                file,
                next_sequence,
            }),
            path,
        })
    }

    fn recover_last_sequence(file: &mut File) -> Result<u64, TradeLogError> {
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;

        FileHeader::parse(&contents)?;

        let mut offset = FileHeader::SIZE;
        let mut last_sequence = 0u64;
        loop {
            if offset + crate::frame::FRAME_HEADER_SIZE > contents.len() {
                break;
            }
            let payload_length = u32::from_le_bytes([
                contents[offset + 20],
                contents[offset + 21],
                contents[offset + 22],
                contents[offset + 23],
            ]) as usize;
            let total = crate::frame::FRAME_OVERHEAD + payload_length;
            if offset + total > contents.len() {
                // torn tail: stop, not corruption
                break;
            }
            let frame = Frame::parse(&contents[offset..offset + total])?;
            last_sequence = frame.sequence_num;
            offset += total;
        }

        Ok(last_sequence)
    }

    /// Append a frame for `event_type` carrying `payload`, assigning it the
    /// next sequence number and the current monotonic timestamp.
    ///
    /// Sequence assignment and the file write happen under the same lock,
    /// so the order frames land in the file always matches the order their
    /// sequence numbers were handed out in. The counter increment is not
    /// rolled back on write failure: a written sequence number is a
    /// reservation, not a promise of durability.
    pub fn append(&self, event_type: u8, payload: Vec<u8>) -> Result<u64, TradeLogError> {
        let timestamp_ns = monotonic_nanos();

        let mut state = self.inner.lock();
        let sequence_num = state.next_sequence;
        state.next_sequence += 1;

        let frame = Frame {
            sequence_num,
            timestamp_ns,
            event_type,
            payload,
        };
        let bytes = frame.serialize();

        state.file.write_all(&bytes)?;
        state.file.flush()?;
        debug!(sequence_num, len = bytes.len(), "appended frame");

        Ok(sequence_num)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::EVENT_TYPE_TRADE_CREATED;
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn first_open_writes_header_and_starts_at_one() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("log.bin");
        let writer = LogWriter::open(&path).expect("open");
        let seq = writer.append(EVENT_TYPE_TRADE_CREATED, b"x".to_vec()).expect("append");
        assert_eq!(seq, 1);

        let bytes = std::fs::read(&path).expect("read");
        assert_eq!(bytes.len(), FileHeader::SIZE + crate::frame::FRAME_OVERHEAD + 1);
    }

    #[test]
    fn reopen_resumes_sequence_from_tail() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("log.bin");

        {
            let writer = LogWriter::open(&path).expect("open");
            for _ in 0..5 {
                writer.append(EVENT_TYPE_TRADE_CREATED, b"x".to_vec()).expect("append");
            }
        }

        let writer = LogWriter::open(&path).expect("reopen");
        let seq = writer.append(EVENT_TYPE_TRADE_CREATED, b"y".to_vec()).expect("append");
        assert_eq!(seq, 6);
    }

    #[test]
    fn concurrent_appends_produce_unique_contiguous_sequences() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("log.bin");
        let writer = Arc::new(LogWriter::open(&path).expect("open"));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let writer = Arc::clone(&writer);
                thread::spawn(move || {
                    let mut seqs = Vec::with_capacity(1000);
                    for i in 0..1000 {
                        let seq = writer
                            .append(EVENT_TYPE_TRADE_CREATED, format!("{i}").into_bytes())
                            .expect("append");
                        seqs.push(seq);
                    }
                    seqs
                })
            })
            .collect();

        let mut all: Vec<u64> = threads.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_unstable();
        let expected: Vec<u64> = (1..=8000).collect();
        assert_eq!(all, expected);
    }
}
