//! Set-associative storage with per-way LRU and valid bits.

use crate::vm::{Page, Pid, VAddr};

#[derive(Clone, Copy, Debug, Default)]
struct Way {
    /// `None` until first written: an empty way, always preferred for eviction.
    page: Option<Page>,
    /// Monotonically increasing recency stamp; higher is more recently used.
    last_used: u64,
}

/// One set: `num_ways` ways, LRU-ordered, tie broken by lowest way index.
#[derive(Clone, Debug)]
pub struct Set {
    ways: Vec<Way>,
    clock: u64,
}

impl Set {
    pub fn new(num_ways: usize) -> Self {
        Set {
            ways: vec![Way::default(); num_ways],
            clock: 0,
        }
    }

    pub fn num_ways(&self) -> usize {
        self.ways.len()
    }

    /// Linear scan for a way tagged with `(pid, vaddr)`. `found` does not
    /// require `Valid` — callers re-check validity themselves.
    pub fn lookup(&self, pid: Pid, vaddr: VAddr) -> Option<(usize, Page)> {
        self.ways.iter().enumerate().find_map(|(way_id, way)| {
            way.page
                .filter(|p| p.pid == pid && p.vaddr == vaddr)
                .map(|p| (way_id, p))
        })
    }

    /// Chooses a way to evict. Empty ways and ways holding an invalidated
    /// tag (e.g. flushed) are both preferred over valid ones; among
    /// equally-eligible ways the lowest index wins, so scenarios are
    /// reproducible. Fails only if the set has zero ways.
    pub fn evict(&self) -> Option<usize> {
        if self.ways.is_empty() {
            return None;
        }
        if let Some(invalid) = self
            .ways
            .iter()
            .position(|w| w.page.map_or(true, |p| !p.valid))
        {
            return Some(invalid);
        }
        self.ways
            .iter()
            .enumerate()
            .min_by_key(|(_, w)| w.last_used)
            .map(|(id, _)| id)
    }

    pub fn update(&mut self, way_id: usize, page: Page) {
        self.ways[way_id].page = Some(page);
    }

    /// Promotes `way_id` to most-recently-used.
    pub fn visit(&mut self, way_id: usize) {
        self.clock += 1;
        self.ways[way_id].last_used = self.clock;
    }

    /// Marks the way holding `(pid, vaddr)` invalid, keeping its tag (spec
    /// §4.4 Flush: "keep the tag, so that subsequent lookups still see
    /// 'found' by tag but callers observe Valid=false").
    pub fn invalidate(&mut self, pid: Pid, vaddr: VAddr) {
        if let Some(way) = self
            .ways
            .iter_mut()
            .find(|w| w.page.is_some_and(|p| p.pid == pid && p.vaddr == vaddr))
        {
            if let Some(page) = way.page.as_mut() {
                page.valid = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(pid: u64, vaddr: u64) -> Page {
        Page::new(Pid(pid), VAddr(vaddr), 0)
    }

    #[test]
    fn evict_prefers_empty_ways_over_valid() {
        let mut set = Set::new(4);
        set.update(1, page(1, 0x1000));
        set.visit(1);
        // Way 0, 2, 3 still empty; way 1 holds a valid, recently-used page.
        assert_eq!(set.evict(), Some(0));
    }

    #[test]
    fn evict_tie_breaks_by_lowest_index() {
        let mut set = Set::new(3);
        for w in 0..3 {
            set.update(w, page(1, 0x1000 * (w as u64 + 1)));
        }
        // No visits yet: all ways tie at last_used=0, lowest index wins.
        assert_eq!(set.evict(), Some(0));
    }

    #[test]
    fn evict_picks_least_recently_used_when_full() {
        let mut set = Set::new(2);
        set.update(0, page(1, 0x1000));
        set.update(1, page(1, 0x2000));
        set.visit(0);
        set.visit(1);
        set.visit(0); // way 0 now most recent, way 1 least recent
        assert_eq!(set.evict(), Some(1));
    }

    #[test]
    fn evict_prefers_invalidated_way_over_recent_valid_one() {
        let mut set = Set::new(2);
        set.update(0, page(1, 0x1000));
        set.visit(0);
        set.invalidate(Pid(1), VAddr(0x1000));
        set.update(1, page(1, 0x2000));
        set.visit(1); // way 1 is valid and more recently used than way 0
        assert_eq!(set.evict(), Some(0));
    }

    #[test]
    fn lookup_finds_invalid_entries_too() {
        let mut set = Set::new(1);
        set.update(0, page(1, 0x1000));
        set.invalidate(Pid(1), VAddr(0x1000));
        let (way_id, found) = set.lookup(Pid(1), VAddr(0x1000)).unwrap();
        assert_eq!(way_id, 0);
        assert!(!found.valid);
    }

    #[test]
    fn invalidate_is_idempotent() {
        let mut set = Set::new(1);
        set.update(0, page(1, 0x1000));
        set.invalidate(Pid(1), VAddr(0x1000));
        set.invalidate(Pid(1), VAddr(0x1000));
        let (_, found) = set.lookup(Pid(1), VAddr(0x1000)).unwrap();
        assert!(!found.valid);
    }
}
