// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Monotonic nanosecond clock shared by the writer and the consumer.
//!
//! Wall-clock time is not used for event timestamps: it can jump
//! backward on adjustment, which would violate the log's monotonicity
//! invariant and corrupt latency measurements. This derives nanoseconds
//! since an arbitrary process-local epoch from `Instant`, which is
//! guaranteed monotonic, and offsets it once at first use so values look
//! like Unix nanoseconds for log inspection purposes.

use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

static EPOCH: OnceLock<(Instant, u64)> = OnceLock::new();

/// Nanoseconds from a monotonic clock domain, approximately aligned to
/// the Unix epoch at process start.
pub fn monotonic_nanos() -> u64 {
    let (start_instant, start_offset) = *EPOCH.get_or_init(|| {
        let offset = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        (Instant::now(), offset)
    });

    start_offset + start_instant.elapsed().as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_non_decreasing() {
        let a = monotonic_nanos();
        let b = monotonic_nanos();
        assert!(b >= a);
    }
}
