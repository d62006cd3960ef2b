//! Miss-Status Holding Register: coalesces duplicate outstanding fetches
//! (spec §4.2).

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::messages::{TranslationReq, TranslationReqPwc};
use crate::vm::{Page, Pid, VAddr};

/// Most coalescing groups are small; avoid a heap allocation for the common
/// case of one or two waiting requesters.
pub type RequestList = SmallVec<[TranslationReq; 4]>;

/// One outstanding downstream fetch, keyed by `(Pid, VAddr)`.
#[derive(Clone, Debug)]
pub struct MshrEntry {
    /// Coalesced upstream requesters, insertion-ordered.
    pub requests: RequestList,
    /// The downstream request issued for this key, once sent.
    pub req_to_bottom: Option<TranslationReqPwc>,
    /// The page once the downstream response arrives.
    pub page: Option<Page>,
}

impl MshrEntry {
    fn new() -> Self {
        MshrEntry {
            requests: RequestList::new(),
            req_to_bottom: None,
            page: None,
        }
    }
}

/// Fixed-capacity table of outstanding fetches.
#[derive(Debug)]
pub struct Mshr {
    entries: HashMap<(Pid, VAddr), MshrEntry>,
    capacity: usize,
}

impl Mshr {
    pub fn new(capacity: usize) -> Self {
        Mshr {
            entries: HashMap::new(),
            capacity,
        }
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn is_entry_present(&self, pid: Pid, vaddr: VAddr) -> bool {
        self.entries.contains_key(&(pid, vaddr))
    }

    pub fn query(&self, pid: Pid, vaddr: VAddr) -> Option<&MshrEntry> {
        self.entries.get(&(pid, vaddr))
    }

    pub fn query_mut(&mut self, pid: Pid, vaddr: VAddr) -> Option<&mut MshrEntry> {
        self.entries.get_mut(&(pid, vaddr))
    }

    pub fn get_entry(&self, pid: Pid, vaddr: VAddr) -> Option<&MshrEntry> {
        self.query(pid, vaddr)
    }

    /// Allocates a new entry for `(pid, vaddr)`. Callers must `query` first:
    /// calling `add` when an entry already exists for the key silently
    /// overwrites it (spec §4.2: "callers must use Query first and only
    /// Add on miss"). Returns `None` when the table is full.
    pub fn add(&mut self, pid: Pid, vaddr: VAddr) -> Option<&mut MshrEntry> {
        if self.is_full() && !self.entries.contains_key(&(pid, vaddr)) {
            return None;
        }
        Some(self.entries.entry((pid, vaddr)).or_insert_with(MshrEntry::new))
    }

    pub fn remove(&mut self, pid: Pid, vaddr: VAddr) -> Option<MshrEntry> {
        self.entries.remove(&(pid, vaddr))
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(pid: u64, vaddr: u64) -> TranslationReq {
        TranslationReq::new("client", "pwc", 0, Pid(pid), VAddr(vaddr), 0)
    }

    #[test]
    fn add_then_query_round_trips() {
        let mut mshr = Mshr::new(4);
        assert!(mshr.query(Pid(1), VAddr(0x1000)).is_none());
        let entry = mshr.add(Pid(1), VAddr(0x1000)).unwrap();
        entry.requests.push(req(1, 0x1000));
        assert_eq!(mshr.query(Pid(1), VAddr(0x1000)).unwrap().requests.len(), 1);
    }

    #[test]
    fn full_table_denies_new_key() {
        let mut mshr = Mshr::new(1);
        mshr.add(Pid(1), VAddr(0x1000));
        assert!(mshr.is_full());
        assert!(mshr.add(Pid(2), VAddr(0x2000)).is_none());
    }

    #[test]
    fn full_table_still_allows_existing_key() {
        let mut mshr = Mshr::new(1);
        mshr.add(Pid(1), VAddr(0x1000));
        assert!(mshr.add(Pid(1), VAddr(0x1000)).is_some());
    }

    #[test]
    fn remove_clears_entry() {
        let mut mshr = Mshr::new(4);
        mshr.add(Pid(1), VAddr(0x1000));
        assert!(mshr.remove(Pid(1), VAddr(0x1000)).is_some());
        assert!(!mshr.is_entry_present(Pid(1), VAddr(0x1000)));
    }

    #[test]
    fn reset_clears_all_entries() {
        let mut mshr = Mshr::new(4);
        mshr.add(Pid(1), VAddr(0x1000));
        mshr.add(Pid(2), VAddr(0x2000));
        mshr.reset();
        assert!(!mshr.is_entry_present(Pid(1), VAddr(0x1000)));
        assert!(!mshr.is_entry_present(Pid(2), VAddr(0x2000)));
    }
}
