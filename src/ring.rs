// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lock-free, cache-line-isolated, single-producer/single-consumer ring
//! buffer for handing decoded frames from the producer thread to the
//! consumer thread within one process.
//!
//! The in-process analogue of this crate's shared-memory ring: the same
//! acquire/release discipline on `head`/`tail` and the same "one slot
//! wasted to disambiguate full from empty" convention, without the
//! cross-process machinery (no `mmap`, no futex wake) since both ends
//! live in the same address space.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Cache-line size assumed for false-sharing isolation.
const CACHE_LINE: usize = 64;

#[repr(align(64))]
struct CachePadded<T>(T);

/// Fixed-capacity SPSC ring buffer. `SIZE` must be a power of two.
///
/// `head` (consumer-owned), `tail` (producer-owned), and the backing
/// buffer each sit on their own cache line so that producer and
/// consumer writes never invalidate each other's cache lines.
pub struct SpscRing<T, const SIZE: usize> {
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
    buffer: CachePadded<Box<[UnsafeCell<MaybeUninit<T>>]>>,
}

// SAFETY: access to `buffer` slots is disciplined by the acquire/release
// protocol on `head`/`tail`: the producer only ever writes slot `tail` and
// the consumer only ever reads slot `head`, and the two never overlap
// between a push's write and a pop's matching read.
unsafe impl<T: Send, const SIZE: usize> Send for SpscRing<T, SIZE> {}
unsafe impl<T: Send, const SIZE: usize> Sync for SpscRing<T, SIZE> {}

impl<T, const SIZE: usize> SpscRing<T, SIZE> {
    const MASK: usize = SIZE - 1;

    /// Construct an empty ring. Panics if `SIZE` is not a power of two
    /// greater than zero (a `const` assertion, so this is a compile-time
    /// guarantee in practice).
    pub fn new() -> Self {
        assert!(SIZE > 0 && SIZE.is_power_of_two(), "SIZE must be a power of two");
        let mut slots = Vec::with_capacity(SIZE);
        for _ in 0..SIZE {
            slots.push(UnsafeCell::new(MaybeUninit::uninit()));
        }

        Self {
            head: CachePadded(AtomicUsize::new(0)),
            tail: CachePadded(AtomicUsize::new(0)),
            buffer: CachePadded(slots.into_boxed_slice()),
        }
    }

    /// Usable capacity: `SIZE - 1` (exact).
    pub const fn capacity(&self) -> usize {
        SIZE - 1
    }

    /// Push `item` if the ring is not full. Never blocks.
    pub fn try_push(&self, item: T) -> Result<(), T> {
        let tail = self.tail.0.load(Ordering::Relaxed);
        let next = (tail + 1) & Self::MASK;

        let head = self.head.0.load(Ordering::Acquire);
        if next == head {
            return Err(item);
        }

        // SAFETY: only the producer writes slot `tail`; the consumer has
        // not yet advanced past it because `next != head`.
        unsafe {
            (*self.buffer.0[tail].get()).write(item);
        }

        self.tail.0.store(next, Ordering::Release);
        Ok(())
    }

    /// Pop the next item if the ring is not empty. Never blocks.
    pub fn try_pop(&self) -> Option<T> {
        let head = self.head.0.load(Ordering::Relaxed);
        let tail = self.tail.0.load(Ordering::Acquire);
        if head == tail {
            return None;
        }

        // SAFETY: only the consumer reads slot `head`; the producer has
        // published a write to it because `head != tail` under the
        // acquire load above.
        let item = unsafe { (*self.buffer.0[head].get()).assume_init_read() };

        self.head.0.store((head + 1) & Self::MASK, Ordering::Release);
        Some(item)
    }

    /// Advisory: relaxed snapshot, may be stale by the time it's read.
    pub fn is_empty(&self) -> bool {
        self.head.0.load(Ordering::Relaxed) == self.tail.0.load(Ordering::Relaxed)
    }

    /// Advisory: relaxed snapshot of the number of queued items.
    pub fn len(&self) -> usize {
        let head = self.head.0.load(Ordering::Relaxed);
        let tail = self.tail.0.load(Ordering::Relaxed);
        (tail.wrapping_sub(head)) & Self::MASK
    }
}

impl<T, const SIZE: usize> Default for SpscRing<T, SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const SIZE: usize> Drop for SpscRing<T, SIZE> {
    fn drop(&mut self) {
        // Drain any items still queued so `T`'s destructor runs.
        while self.try_pop().is_some() {}
    }
}

const _: () = assert!(std::mem::align_of::<CachePadded<usize>>() == CACHE_LINE);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn capacity_is_size_minus_one() {
        let ring: SpscRing<u64, 8> = SpscRing::new();
        assert_eq!(ring.capacity(), 7);
    }

    #[test]
    fn push_pop_preserves_fifo_order() {
        let ring: SpscRing<u64, 8> = SpscRing::new();
        for i in 0..7 {
            ring.try_push(i).expect("push within capacity");
        }
        assert!(ring.try_push(99).is_err(), "ring should be full");

        for i in 0..7 {
            assert_eq!(ring.try_pop(), Some(i));
        }
        assert_eq!(ring.try_pop(), None);
    }

    #[test]
    fn len_tracks_queued_count() {
        let ring: SpscRing<u64, 8> = SpscRing::new();
        assert_eq!(ring.len(), 0);
        ring.try_push(1).unwrap();
        ring.try_push(2).unwrap();
        assert_eq!(ring.len(), 2);
        ring.try_pop();
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn spsc_stress_preserves_every_item_exactly_once() {
        const N: u64 = 1_000_000;
        let ring: Arc<SpscRing<u64, 512>> = Arc::new(SpscRing::new());

        let producer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                let mut i = 0u64;
                while i < N {
                    if ring.try_push(i).is_ok() {
                        i += 1;
                    } else {
                        thread::yield_now();
                    }
                }
            })
        };

        let consumer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                let mut checksum = 0u128;
                let mut received = 0u64;
                let mut expected = 0u64;
                while received < N {
                    if let Some(v) = ring.try_pop() {
                        assert_eq!(v, expected);
                        expected += 1;
                        checksum += v as u128;
                        received += 1;
                    } else {
                        thread::yield_now();
                    }
                }
                checksum
            })
        };

        producer.join().unwrap();
        let checksum = consumer.join().unwrap();
        let expected_checksum = (N as u128 * (N as u128 - 1)) / 2;
        assert_eq!(checksum, expected_checksum);
    }
}
