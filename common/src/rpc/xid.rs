use std::sync::atomic::{AtomicU32, Ordering};

use rand::Rng;

// Hands out transaction ids. Starts at a random point so that ids of
// consecutive runs against the same server don't collide in its
// duplicate request cache.
#[derive(Debug)]
pub struct XidGenerator {
    next: AtomicU32,
}

impl XidGenerator {
    pub fn new() -> Self {
        Self::starting_at(rand::thread_rng().gen())
    }

    pub fn starting_at(start: u32) -> Self {
        Self {
            next: AtomicU32::new(start),
        }
    }

    // Distinct for 2^32 consecutive calls, wraps around afterwards
    pub fn next(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for XidGenerator {
    fn default() -> Self {
        Self::new()
    }
}
