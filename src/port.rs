//! A minimal bounded, polling message port.
//!
//! Stands in for the simulation kernel's port abstraction; the kernel and
//! routing beyond the PWC are owned externally. `send` and `retrieve`
//! never block; callers observe backpressure as `false`/`None` and retry
//! on a later tick, matching the peek-then-retrieve inbox idiom used
//! elsewhere in this crate's tick-driven components.
use std::collections::VecDeque;

/// A FIFO port with a fixed message capacity.
#[derive(Debug)]
pub struct Port<T> {
    queue: VecDeque<T>,
    capacity: usize,
}

impl<T> Port<T> {
    pub fn new(capacity: usize) -> Self {
        Port {
            queue: VecDeque::new(),
            capacity,
        }
    }

    /// Enqueue a message. Returns `false` (no mutation) if the port is full.
    pub fn send(&mut self, msg: T) -> bool {
        if self.queue.len() >= self.capacity {
            return false;
        }
        self.queue.push_back(msg);
        true
    }

    /// Look at the oldest message without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.queue.front()
    }

    /// Remove and return the oldest message.
    pub fn retrieve(&mut self) -> Option<T> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Discard every message currently queued. Used by Restart to drain
    /// stale port contents accumulated while paused.
    pub fn drain_all(&mut self) {
        self.queue.clear();
    }
}

/// A bidirectional port pair: an inbound mailbox the owning component
/// drains, and an outbound mailbox the owning component fills and the
/// connected peer drains. Models the Top/Bottom/Control ports, where the
/// same named port is both peeked (incoming) and sent-on (outgoing).
#[derive(Debug)]
pub struct DuplexPort<Rx, Tx> {
    pub rx: Port<Rx>,
    pub tx: Port<Tx>,
}

impl<Rx, Tx> DuplexPort<Rx, Tx> {
    pub fn new(capacity: usize) -> Self {
        DuplexPort {
            rx: Port::new(capacity),
            tx: Port::new(capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_respects_capacity() {
        let mut p = Port::new(2);
        assert!(p.send(1));
        assert!(p.send(2));
        assert!(!p.send(3));
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn peek_does_not_remove() {
        let mut p = Port::new(1);
        p.send(42);
        assert_eq!(p.peek(), Some(&42));
        assert_eq!(p.peek(), Some(&42));
        assert_eq!(p.retrieve(), Some(42));
        assert_eq!(p.retrieve(), None);
    }

    #[test]
    fn drain_all_clears_queue() {
        let mut p = Port::new(4);
        p.send(1);
        p.send(2);
        p.drain_all();
        assert!(p.is_empty());
    }
}
