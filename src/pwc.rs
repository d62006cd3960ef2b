//! The PWC tick engine: the per-cycle state machine that looks up, fills,
//! flushes and restarts the page-walk cache.

use std::collections::HashMap;

use serde_json::Value;

use crate::config::Config;
use crate::ids::next_msg_id;
use crate::messages::{
    Control, FlushReq, FlushRsp, RestartReq, RestartRsp, TranslationReq, TranslationReqPwc,
    TranslationRsp,
};
use crate::mshr::{Mshr, MshrEntry};
use crate::port::DuplexPort;
use crate::pwqueue::{PwQueue, PwQueueEntry};
use crate::set::Set;
use crate::trace::{NullTraceSink, TraceSink};
use crate::vm::{Page, Pid, VAddr};

/// Top port: client requests in, translation responses out.
pub type TopPort = DuplexPort<TranslationReq, TranslationRsp>;
/// Bottom port: downstream responses in, downstream fetch requests out.
pub type BottomPort = DuplexPort<TranslationRsp, TranslationReqPwc>;
/// Control port: flush/restart requests in, their acks out.
pub type ControlPort = DuplexPort<Control, ControlRsp>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlRsp {
    Flush(FlushRsp),
    Restart(RestartRsp),
}

/// The page-walk cache cycle-driven tick engine.
pub struct Pwc {
    name: String,
    config: Config,
    sets: Vec<Set>,
    mshr: Mshr,
    pwqueue: PwQueue,
    /// `None` = no response draining; `Some` = a detached MSHR entry being
    /// drained to its coalesced requesters — keyed by `(Pid, VAddr)` with
    /// an explicit in-flight flag, rather than a raw reference into the
    /// MSHR table whose lifetime would otherwise be entangled with the
    /// table's own mutation.
    responding: Option<((Pid, VAddr), MshrEntry)>,
    is_paused: bool,
    pub top: TopPort,
    pub bottom: BottomPort,
    pub control: ControlPort,
    trace: Box<dyn TraceSink>,
}

impl Pwc {
    pub(crate) fn new(name: String, config: Config) -> Self {
        let sets = (0..config.num_sets).map(|_| Set::new(config.num_ways)).collect();
        Pwc {
            top: TopPort::new(config.num_req_per_cycle),
            bottom: BottomPort::new(config.num_req_per_cycle),
            control: ControlPort::new(1),
            name,
            mshr: Mshr::new(config.num_mshr_entry),
            pwqueue: PwQueue::new(config.len_pwqueue),
            sets,
            config,
            responding: None,
            is_paused: false,
            trace: Box::new(NullTraceSink),
        }
    }

    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.trace = sink;
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs one simulated cycle. Returns `true` iff any sub-phase did
    /// useful work.
    pub fn tick(&mut self, now: u64) -> bool {
        let mut progress = self.perform_ctrl_req(now);

        if !self.is_paused {
            for _ in 0..self.config.num_req_per_cycle {
                progress = self.respond_mshr_entry(now) || progress;
            }
            for _ in 0..self.config.num_req_per_cycle {
                progress = self.mshr_lookup(now) || progress;
            }
            for i in 0..self.config.num_walkers {
                progress = self.pw_lookup(i, now) || progress;
            }
            for _ in 0..self.config.num_req_per_cycle {
                progress = self.parse_bottom(now) || progress;
            }
        }

        progress
    }

    // -- address decomposition -----------------------------------------------

    fn l2_index(&self, vaddr: u64) -> u64 {
        vaddr & !((1u64 << (self.config.log2_page_size + 9)) - 1)
    }

    fn l3_index(&self, vaddr: u64) -> u64 {
        vaddr & !((1u64 << (self.config.log2_page_size + 18)) - 1)
    }

    fn l4_index(&self, vaddr: u64) -> u64 {
        vaddr & !((1u64 << (self.config.log2_page_size + 27)) - 1)
    }

    fn set_id(&self, index: u64) -> usize {
        ((index / self.config.page_size) % self.config.num_sets as u64) as usize
    }

    /// Looks up L2, then L3, then L4, returning the deepest level whose
    /// cached tag matches *and* is valid — a tag match alone doesn't imply
    /// validity, so a flushed-but-still-tagged entry must not count as a
    /// hit. Promotes the hit way, if any.
    fn tag_lookup_and_promote(&mut self, pid: Pid, vaddr: VAddr) -> u8 {
        let levels: [(VAddr, u8); 3] = [
            (VAddr(self.l2_index(vaddr.0)), 3),
            (VAddr(self.l3_index(vaddr.0)), 2),
            (VAddr(self.l4_index(vaddr.0)), 1),
        ];
        for (idx_vaddr, hit_level) in levels {
            let set_id = self.set_id(idx_vaddr.0);
            if let Some((way_id, page)) = self.sets[set_id].lookup(pid, idx_vaddr) {
                if page.valid {
                    self.sets[set_id].visit(way_id);
                    return hit_level;
                }
            }
        }
        0
    }

    fn invalidate_vaddr(&mut self, pid: Pid, vaddr: VAddr) {
        for idx_vaddr in [
            VAddr(self.l2_index(vaddr.0)),
            VAddr(self.l3_index(vaddr.0)),
            VAddr(self.l4_index(vaddr.0)),
        ] {
            let set_id = self.set_id(idx_vaddr.0);
            self.sets[set_id].invalidate(pid, idx_vaddr);
        }
    }

    // -- phases --------------------------------------------------------------

    fn perform_ctrl_req(&mut self, now: u64) -> bool {
        let msg = match self.control.rx.peek() {
            Some(m) => m.clone(),
            None => return false,
        };
        let handled = match &msg {
            Control::Flush(req) => self.handle_flush(req, now),
            Control::Restart(req) => self.handle_restart(req, now),
        };
        if handled {
            self.control.rx.retrieve();
        }
        handled
    }

    fn handle_flush(&mut self, req: &FlushReq, now: u64) -> bool {
        let rsp = FlushRsp {
            id: next_msg_id(),
            src: format!("{}.ControlPort", self.name),
            dst: req.src.clone(),
            send_time: now,
            respond_to: req.id,
        };
        if !self.control.tx.send(ControlRsp::Flush(rsp)) {
            return false;
        }
        for &vaddr in &req.vaddr {
            self.invalidate_vaddr(req.pid, vaddr);
        }
        self.mshr.reset();
        self.is_paused = true;
        true
    }

    fn handle_restart(&mut self, req: &RestartReq, now: u64) -> bool {
        let rsp = RestartRsp {
            id: next_msg_id(),
            src: format!("{}.ControlPort", self.name),
            dst: req.src.clone(),
            send_time: now,
            respond_to: req.id,
        };
        if !self.control.tx.send(ControlRsp::Restart(rsp)) {
            return false;
        }
        self.is_paused = false;
        self.top.rx.drain_all();
        self.bottom.rx.drain_all();
        true
    }

    fn respond_mshr_entry(&mut self, now: u64) -> bool {
        let (req, page) = match self.responding.as_ref() {
            Some((_key, entry)) => {
                let req = entry
                    .requests
                    .first()
                    .cloned()
                    .expect("a responding entry always has at least one coalesced requester");
                let page = entry
                    .page
                    .expect("a responding entry always has its page set before draining");
                (req, page)
            }
            None => return false,
        };

        let rsp = TranslationRsp::new(format!("{}.TopPort", self.name), req.src.clone(), now, req.id, page);
        if !self.top.tx.send(rsp) {
            return false;
        }

        let done = {
            let (_key, entry) = self.responding.as_mut().unwrap();
            entry.requests.remove(0);
            entry.requests.is_empty()
        };
        self.emit(
            "req-complete",
            [("req_id".to_string(), Value::from(req.id))].into(),
        );
        if done {
            self.responding = None;
        }
        true
    }

    fn mshr_lookup(&mut self, now: u64) -> bool {
        let _ = now;
        let req = match self.top.rx.peek() {
            Some(r) => r.clone(),
            None => return false,
        };
        let (pid, vaddr) = req.key();

        if self.mshr.query(pid, vaddr).is_some() {
            self.top.rx.retrieve();
            let entry = self.mshr.query_mut(pid, vaddr).unwrap();
            entry.requests.push(req.clone());
            let mut fields: HashMap<String, Value> =
                [("req_id".to_string(), Value::from(req.id))].into();
            if cfg!(feature = "detailed_stats") {
                fields.insert("coalesced_count".to_string(), Value::from(entry.requests.len()));
            }
            self.emit("mshr-hit", fields);
            return true;
        }

        if self.mshr.is_full() {
            return false;
        }
        // Check PWQueue capacity before consuming the TopPort message: if
        // the enqueue would fail, leave the request on the port rather
        // than dropping it on the floor.
        if self.pwqueue.is_full() {
            return false;
        }

        self.top.rx.retrieve();
        let entry = self
            .mshr
            .add(pid, vaddr)
            .expect("capacity already checked above");
        entry.requests.push(req.clone());
        let queued = self
            .pwqueue
            .enqueue(PwQueueEntry::new(req, self.config.pwqueue_latency));
        debug_assert!(queued, "capacity already checked above");
        true
    }

    /// Advances PWQueue entry `i` by one step. `i` ranges over
    /// `0..config.num_walkers`, the number of in-flight walks that can
    /// make progress in a single cycle.
    fn pw_lookup(&mut self, i: usize, now: u64) -> bool {
        let (cycles_left, in_pwcache) = match self.pwqueue.index(i) {
            Some(e) => (e.cycles_left, e.in_pwcache),
            None => return false,
        };

        if cycles_left > 0 {
            self.pwqueue.index_mut(i).unwrap().cycles_left -= 1;
            return true;
        }

        if !in_pwcache {
            let (pid, vaddr) = {
                let e = self.pwqueue.index(i).unwrap();
                (e.req.pid, e.req.vaddr)
            };
            let hit_level = self.tag_lookup_and_promote(pid, vaddr);
            let e = self.pwqueue.index_mut(i).unwrap();
            e.in_pwcache = true;
            e.hit_level = hit_level;
        }

        // Issue (or retry) the downstream fetch. Guarded by whether the
        // MSHR entry already recorded a successful send, rather than purely
        // by `in_pwcache`, so a port-full retry on a later tick can still
        // succeed.
        let e = self.pwqueue.index(i).unwrap();
        let (pid, vaddr, hit_level) = (e.req.pid, e.req.vaddr, e.hit_level);
        let already_sent = self
            .mshr
            .query(pid, vaddr)
            .map(|entry| entry.req_to_bottom.is_some())
            .unwrap_or(true);
        if already_sent {
            return false;
        }

        let req = self.pwqueue.index(i).unwrap().req.clone();
        self.fetch_bottom(req, hit_level, now)
    }

    fn fetch_bottom(&mut self, req: TranslationReq, hit_level: u8, now: u64) -> bool {
        let pwc_req = TranslationReqPwc {
            id: next_msg_id(),
            src: format!("{}.BottomPort", self.name),
            dst: "low-module".to_string(),
            send_time: now,
            pid: req.pid,
            vaddr: req.vaddr,
            device_id: req.device_id,
            latency: TranslationReqPwc::latency_for_hit_level(hit_level),
            inner_req: req.clone(),
        };
        if !self.bottom.tx.send(pwc_req.clone()) {
            return false;
        }
        if let Some(entry) = self.mshr.query_mut(req.pid, req.vaddr) {
            entry.req_to_bottom = Some(pwc_req);
        }
        self.emit(
            "fetch-bottom",
            [
                ("req_id".to_string(), Value::from(req.id)),
                ("hit_level".to_string(), Value::from(hit_level)),
            ]
            .into(),
        );
        true
    }

    fn parse_bottom(&mut self, now: u64) -> bool {
        let _ = now;
        if self.responding.is_some() {
            return false;
        }
        let rsp = match self.bottom.rx.peek() {
            Some(r) => r.clone(),
            None => return false,
        };
        let (pid, vaddr) = rsp.page.key();

        if !self.mshr.is_entry_present(pid, vaddr) {
            // Stale response: its MSHR entry was flushed away already.
            self.bottom.rx.retrieve();
            return true;
        }

        for idx_vaddr in [
            VAddr(self.l4_index(vaddr.0)),
            VAddr(self.l3_index(vaddr.0)),
            VAddr(self.l2_index(vaddr.0)),
        ] {
            let set_id = self.set_id(idx_vaddr.0);
            let way_id = self.sets[set_id]
                .evict()
                .expect("eviction must always succeed when num_ways >= 1");
            let page = Page::new(pid, idx_vaddr, rsp.page.payload);
            self.sets[set_id].update(way_id, page);
            self.sets[set_id].visit(way_id);
        }

        let mut entry = self.mshr.remove(pid, vaddr).expect("checked present above");
        entry.page = Some(rsp.page);
        self.pwqueue.remove(pid, vaddr);
        self.responding = Some(((pid, vaddr), entry));
        self.bottom.rx.retrieve();
        true
    }

    fn emit(&mut self, name: &str, fields: HashMap<String, Value>) {
        self.trace.on_event(name, fields);
    }
}
