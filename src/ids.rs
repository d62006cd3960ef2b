//! Process-wide monotonic message-ID generation.
//!
//! Spec treats the ID generator as hidden global state: "initialized before
//! the simulation starts, torn down after." Every message constructor calls
//! `next_msg_id()` directly; tests that care about message identity assert
//! on relative order (monotonicity), not on specific values, since nothing
//! resets the counter between tests in the same process.

use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;

static NEXT_ID: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(1));

/// Returns the next unique message ID from the process-wide counter.
pub fn next_msg_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_unique() {
        let a = next_msg_id();
        let b = next_msg_id();
        assert!(b > a);
    }
}
