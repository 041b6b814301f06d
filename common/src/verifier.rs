// Process wide source of never reused `verifier4` values.
//
// Exclusive create and client id tests need verifiers that differ from any
// handed out before by this process, even when two are minted within the
// same second. The clock is monotonic over the process lifetime, not per
// connection.

use std::sync::Mutex;

use lazy_static::lazy_static;

use crate::{config::NFS4_VERIFIER_SIZE, time::get_current_time_in_seconds};

pub type Verifier = [u8; NFS4_VERIFIER_SIZE];

// Largest value a double holds exactly, higher ones could repeat once encoded
pub const MAX_VERIFIER_VALUE: u64 = 1 << 53;

lazy_static! {
    static ref LAST_VERIFIER: Mutex<u64> = Mutex::new(0);
}

// Raise the floor of the clock, values at or below it are never returned
pub fn init_verifier_clock(floor: u64) {
    let floor = floor.min(MAX_VERIFIER_VALUE);
    let mut last = LAST_VERIFIER.lock().unwrap_or_else(|e| e.into_inner());
    if *last < floor {
        *last = floor;
    }
}

fn advance(last: u64, now: u64) -> u64 {
    now.max(last.saturating_add(1)).min(MAX_VERIFIER_VALUE)
}

// Next verifier value: the current time in seconds, or one past the
// previous value if the clock didn't move
pub fn next_verifier_value() -> u64 {
    let mut last = LAST_VERIFIER.lock().unwrap_or_else(|e| e.into_inner());
    let candidate = advance(*last, get_current_time_in_seconds());
    *last = candidate;
    candidate
}

/// A fresh verifier, encoded as a big endian IEEE 754 double the way the
/// servers under test have always seen it.
pub fn new_verifier() -> Verifier {
    (next_verifier_value() as f64).to_be_bytes()
}
