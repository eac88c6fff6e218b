//! Globally unique mutation identifiers.
//!
//! Every tracked mutation and initial allele carries a 64-bit id that is
//! unique across the whole run. The allocator is a single atomic counter;
//! mating workers reserve a contiguous range up front and then consume ids
//! from it without further synchronization.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Chunk size an `IdSource` re-reserves when its donated range runs dry.
const REFILL_CHUNK: u64 = 64;

/// Process-wide monotonic id counter.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    /// Create an allocator. Ids start at 1 so 0 never names a mutation.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Atomically reserve `count` consecutive ids and return the range.
    pub fn donate_range(&self, count: u64) -> Range<u64> {
        let start = self.next.fetch_add(count, Ordering::Relaxed);
        start..start + count
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// A worker-local stream of unique ids.
///
/// Consumes the donated range without touching the shared counter; if the
/// range is exhausted (the reservation is sized with headroom, so this is
/// rare) it reserves another small chunk.
#[derive(Debug)]
pub struct IdSource {
    range: Range<u64>,
    allocator: Arc<IdAllocator>,
}

impl IdSource {
    /// Reserve `count` ids from `allocator` for this worker.
    pub fn new(allocator: Arc<IdAllocator>, count: u64) -> Self {
        let range = allocator.donate_range(count);
        Self { range, allocator }
    }

    /// Take the next unique id.
    pub fn next_id(&mut self) -> u64 {
        if let Some(id) = self.range.next() {
            return id;
        }
        self.range = self.allocator.donate_range(REFILL_CHUNK);
        let id = self.range.start;
        self.range.start += 1;
        id
    }
}
