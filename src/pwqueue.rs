//! Bounded FIFO modelling in-flight page walks.

use crate::messages::TranslationReq;
use crate::vm::{Pid, VAddr};

/// One in-flight walk. `hit_level` is 0 (miss) through 3 (L4+L3+L2).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PwQueueEntry {
    pub req: TranslationReq,
    pub cycles_left: u32,
    pub hit_level: u8,
    /// Whether the tag lookup has already been performed for this entry.
    pub in_pwcache: bool,
}

impl PwQueueEntry {
    pub fn new(req: TranslationReq, cycles_left: u32) -> Self {
        PwQueueEntry {
            req,
            cycles_left,
            hit_level: 0,
            in_pwcache: false,
        }
    }
}

/// A bounded FIFO with indexed access; removals from the middle preserve
/// the relative order of the remaining entries.
#[derive(Debug, Default)]
pub struct PwQueue {
    elements: Vec<PwQueueEntry>,
    capacity: usize,
}

impl PwQueue {
    pub fn new(capacity: usize) -> Self {
        PwQueue {
            elements: Vec::new(),
            capacity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.elements.len() >= self.capacity
    }

    pub fn size(&self) -> usize {
        self.elements.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends an entry at the tail. Fails (no mutation) if full.
    pub fn enqueue(&mut self, entry: PwQueueEntry) -> bool {
        if self.is_full() {
            return false;
        }
        self.elements.push(entry);
        true
    }

    /// Removes and returns the entry at index `i`.
    pub fn dequeue_at(&mut self, i: usize) -> Option<PwQueueEntry> {
        if i >= self.elements.len() {
            return None;
        }
        Some(self.elements.remove(i))
    }

    /// Removes the first entry matching `(pid, vaddr)`, if any.
    pub fn remove(&mut self, pid: Pid, vaddr: VAddr) -> Option<PwQueueEntry> {
        let idx = self
            .elements
            .iter()
            .position(|e| e.req.pid == pid && e.req.vaddr == vaddr)?;
        self.dequeue_at(idx)
    }

    pub fn index(&self, i: usize) -> Option<&PwQueueEntry> {
        self.elements.get(i)
    }

    pub fn index_mut(&mut self, i: usize) -> Option<&mut PwQueueEntry> {
        self.elements.get_mut(i)
    }

    pub fn update_hit_level(&mut self, i: usize, level: u8) -> bool {
        match self.elements.get_mut(i) {
            Some(e) => {
                e.hit_level = level;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(pid: u64, vaddr: u64) -> TranslationReq {
        TranslationReq::new("client", "pwc", 0, Pid(pid), VAddr(vaddr), 0)
    }

    #[test]
    fn enqueue_respects_capacity() {
        let mut q = PwQueue::new(1);
        assert!(q.enqueue(PwQueueEntry::new(req(1, 0x1000), 10)));
        assert!(!q.enqueue(PwQueueEntry::new(req(2, 0x2000), 10)));
    }

    #[test]
    fn remove_preserves_order_of_remaining_entries() {
        let mut q = PwQueue::new(4);
        q.enqueue(PwQueueEntry::new(req(1, 0x1000), 10));
        q.enqueue(PwQueueEntry::new(req(2, 0x2000), 10));
        q.enqueue(PwQueueEntry::new(req(3, 0x3000), 10));
        q.remove(Pid(2), VAddr(0x2000));
        assert_eq!(q.index(0).unwrap().req.pid, Pid(1));
        assert_eq!(q.index(1).unwrap().req.pid, Pid(3));
    }

    #[test]
    fn update_hit_level_out_of_range_is_noop_failure() {
        let mut q = PwQueue::new(4);
        assert!(!q.update_hit_level(0, 2));
    }
}
