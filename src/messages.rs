//! Wire messages exchanged across the PWC's Top, Bottom and Control ports.
//!
//! `src`/`dst` are descriptive endpoint labels rather than live port
//! handles, since routing beyond the PWC itself is an external
//! collaborator's concern.

use serde::{Deserialize, Serialize};

use crate::ids::next_msg_id;
use crate::vm::{Page, Pid, VAddr};

/// Upstream ingress: a client (TLB / coalescer) asking to translate a page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationReq {
    pub id: u64,
    pub src: String,
    pub dst: String,
    pub send_time: u64,
    pub pid: Pid,
    pub vaddr: VAddr,
    pub device_id: u64,
}

impl TranslationReq {
    pub fn new(src: impl Into<String>, dst: impl Into<String>, send_time: u64, pid: Pid, vaddr: VAddr, device_id: u64) -> Self {
        TranslationReq {
            id: next_msg_id(),
            src: src.into(),
            dst: dst.into(),
            send_time,
            pid,
            vaddr,
            device_id,
        }
    }

    pub fn key(&self) -> (Pid, VAddr) {
        (self.pid, self.vaddr)
    }
}

/// Upstream egress: the resolved page, in reply to a `TranslationReq`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRsp {
    pub id: u64,
    pub src: String,
    pub dst: String,
    pub send_time: u64,
    pub respond_to: u64,
    pub page: Page,
}

impl TranslationRsp {
    pub fn new(src: impl Into<String>, dst: impl Into<String>, send_time: u64, respond_to: u64, page: Page) -> Self {
        TranslationRsp {
            id: next_msg_id(),
            src: src.into(),
            dst: dst.into(),
            send_time,
            respond_to,
            page,
        }
    }
}

/// Downstream egress: the unresolved request forwarded to the PTW, carrying
/// the simulated latency hint derived from the deepest cache hit-level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationReqPwc {
    pub id: u64,
    pub src: String,
    pub dst: String,
    pub send_time: u64,
    pub pid: Pid,
    pub vaddr: VAddr,
    pub device_id: u64,
    pub latency: u32,
    pub inner_req: TranslationReq,
}

impl TranslationReqPwc {
    /// `latency = 100 * (4 - hit_level)`: a deeper cache hit charges less
    /// simulated latency to the downstream fetch.
    pub fn latency_for_hit_level(hit_level: u8) -> u32 {
        100 * (4 - hit_level as u32)
    }
}

/// Flush request: invalidate the listed (shared PID) virtual addresses and
/// pause the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushReq {
    pub id: u64,
    pub src: String,
    pub dst: String,
    pub send_time: u64,
    pub pid: Pid,
    pub vaddr: Vec<VAddr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushRsp {
    pub id: u64,
    pub src: String,
    pub dst: String,
    pub send_time: u64,
    pub respond_to: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartReq {
    pub id: u64,
    pub src: String,
    pub dst: String,
    pub send_time: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartRsp {
    pub id: u64,
    pub src: String,
    pub dst: String,
    pub send_time: u64,
    pub respond_to: u64,
}

/// Polymorphic control-port message. An exhaustively-matched enum rather
/// than a dynamically-typed payload, so an unrecognized control kind is a
/// compile-time impossibility instead of a runtime protocol violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Control {
    Flush(FlushReq),
    Restart(RestartReq),
}
