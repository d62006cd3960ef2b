//! Core address-translation data types shared by every message and store.

use serde::{Deserialize, Serialize};

/// A process identifier. Opaque beyond equality/ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pid(pub u64);

/// A page-aligned virtual address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VAddr(pub u64);

/// A translated mapping. The payload is opaque to the cache core; only
/// `pid`, `vaddr` and `valid` are interpreted by Set/MSHR/PWQueue logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub pid: Pid,
    pub vaddr: VAddr,
    /// Opaque physical/page payload. Never inspected by the core.
    pub payload: u64,
    pub valid: bool,
}

impl Page {
    pub fn new(pid: Pid, vaddr: VAddr, payload: u64) -> Self {
        Page {
            pid,
            vaddr,
            payload,
            valid: true,
        }
    }

    pub fn key(&self) -> (Pid, VAddr) {
        (self.pid, self.vaddr)
    }
}
