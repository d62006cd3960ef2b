//! Scenario file format and event-loop driver for the `pwcache-sim` binary
//! (SPEC_FULL §6 "Scenario file format").
//!
//! A scenario is a `Config` plus a timeline of events representing the
//! otherwise out-of-scope upstream client and downstream PTW collaborators
//! (spec §9). It does not change tick-engine semantics; it only feeds and
//! drains the PWC's ports at the right simulated times.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::builder::Builder;
use crate::config::Config;
use crate::messages::{Control, FlushReq, RestartReq, TranslationReq, TranslationRsp};
use crate::pwc::Pwc;
use crate::vm::{Page, Pid, VAddr};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ScenarioEvent {
    /// A client sends a translation request at cycle `at`.
    Request {
        at: u64,
        pid: u64,
        vaddr: u64,
        device_id: u64,
    },
    /// The downstream PTW responds to the oldest outstanding fetch that
    /// the scenario has not yet answered, at cycle `at`.
    BottomResponse { at: u64, payload: u64 },
    Flush { at: u64, pid: u64, vaddr: Vec<u64> },
    Restart { at: u64 },
    /// Runs the simulation up to (and including) cycle `at` with no new
    /// external events, useful for observing steady-state drains.
    AdvanceTicks { at: u64 },
}

impl ScenarioEvent {
    fn at(&self) -> u64 {
        match self {
            ScenarioEvent::Request { at, .. } => *at,
            ScenarioEvent::BottomResponse { at, .. } => *at,
            ScenarioEvent::Flush { at, .. } => *at,
            ScenarioEvent::Restart { at } => *at,
            ScenarioEvent::AdvanceTicks { at } => *at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub config: Config,
    pub events: Vec<ScenarioEvent>,
}

/// A `TranslationRsp` observed on the PWC's TopPort during a run, tagged
/// with the cycle it was retrieved at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservedResponse {
    pub cycle: u64,
    pub rsp: TranslationRsp,
}

/// Drives `pwc` through a scenario's events, feeding its ports at the right
/// cycles and draining every `TranslationRsp` it emits. Returns the
/// responses in observation order.
pub fn run(pwc: &mut Pwc, scenario: &Scenario) -> Vec<ObservedResponse> {
    let mut responses = Vec::new();
    let last_cycle = scenario.events.iter().map(|e| e.at()).max().unwrap_or(0);

    let mut events_by_cycle: HashMap<u64, Vec<&ScenarioEvent>> = HashMap::new();
    for event in &scenario.events {
        events_by_cycle.entry(event.at()).or_default().push(event);
    }

    for now in 0..=last_cycle {
        if let Some(events) = events_by_cycle.get(&now) {
            for event in events {
                apply_event(pwc, event);
            }
        }
        pwc.tick(now);
        while let Some(rsp) = pwc.top.tx.retrieve() {
            responses.push(ObservedResponse { cycle: now, rsp });
        }
    }
    responses
}

/// Applies one scenario event. A `BottomResponse` with no outstanding
/// fetch on the PWC's BottomPort is silently dropped — not expected in a
/// well-formed scenario, but harmless.
fn apply_event(pwc: &mut Pwc, event: &ScenarioEvent) {
    match event {
        ScenarioEvent::Request {
            at,
            pid,
            vaddr,
            device_id,
        } => {
            let req = TranslationReq::new("client", format!("{}.TopPort", pwc.name()), *at, Pid(*pid), VAddr(*vaddr), *device_id);
            pwc.top.rx.send(req);
        }
        ScenarioEvent::BottomResponse { payload, .. } => {
            if let Some(fetch) = pwc.bottom.tx.retrieve() {
                let page = Page::new(fetch.pid, fetch.vaddr, *payload);
                let rsp = TranslationRsp::new("low-module", format!("{}.BottomPort", pwc.name()), fetch.send_time, fetch.id, page);
                pwc.bottom.rx.send(rsp);
            }
        }
        ScenarioEvent::Flush { at, pid, vaddr } => {
            let req = FlushReq {
                id: crate::ids::next_msg_id(),
                src: "client".to_string(),
                dst: format!("{}.ControlPort", pwc.name()),
                send_time: *at,
                pid: Pid(*pid),
                vaddr: vaddr.iter().map(|v| VAddr(*v)).collect(),
            };
            pwc.control.rx.send(Control::Flush(req));
        }
        ScenarioEvent::Restart { at } => {
            let req = RestartReq {
                id: crate::ids::next_msg_id(),
                src: "client".to_string(),
                dst: format!("{}.ControlPort", pwc.name()),
                send_time: *at,
            };
            pwc.control.rx.send(Control::Restart(req));
        }
        ScenarioEvent::AdvanceTicks { .. } => {}
    }
}

/// Loads a scenario from a JSON string (SPEC_FULL §6).
pub fn from_json(text: &str) -> anyhow::Result<Scenario> {
    let scenario: Scenario = serde_json::from_str(text)?;
    scenario.config.validate()?;
    Ok(scenario)
}

/// Builds a `Pwc` named `name` from the scenario's configuration.
pub fn build_pwc(scenario: &Scenario, name: impl Into<String>) -> anyhow::Result<Pwc> {
    Builder::new().with_config(scenario.config).build(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let scenario = Scenario {
            config: Config::default(),
            events: vec![ScenarioEvent::Request {
                at: 0,
                pid: 1,
                vaddr: 0x1000,
                device_id: 0,
            }],
        };
        let text = serde_json::to_string(&scenario).unwrap();
        let parsed = from_json(&text).unwrap();
        assert_eq!(parsed.events.len(), 1);
    }

    #[test]
    fn cold_miss_scenario_eventually_responds() {
        let scenario = Scenario {
            config: Config {
                num_sets: 1,
                num_ways: 4,
                ..Config::default()
            },
            events: vec![
                ScenarioEvent::Request {
                    at: 0,
                    pid: 1,
                    vaddr: 0x1000,
                    device_id: 0,
                },
                ScenarioEvent::BottomResponse { at: 20, payload: 0xAAAA },
                ScenarioEvent::AdvanceTicks { at: 25 },
            ],
        };
        let mut pwc = build_pwc(&scenario, "pwc0").unwrap();
        let responses = run(&mut pwc, &scenario);
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].rsp.page.vaddr, VAddr(0x1000));
    }
}
