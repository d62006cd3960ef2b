#[macro_use]
extern crate log;

use std::fs;
use std::fs::File;

use anyhow::{Context, Result};
use clap::Parser;

use pwcache::*;

pub fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let text = fs::read_to_string(&args.scenario)
        .with_context(|| format!("reading scenario file {}", args.scenario))?;
    let scenario = scenario::from_json(&text)
        .with_context(|| format!("parsing scenario file {}", args.scenario))?;

    let mut pwc = scenario::build_pwc(&scenario, args.name.clone())?;
    if let Some(path) = &args.trace_output {
        let file = File::create(path).with_context(|| format!("creating trace output {}", path))?;
        pwc.set_trace_sink(Box::new(JsonlTraceSink::new(file)));
    }

    let responses = run_scenario(&mut pwc, &scenario);
    info!(
        "{}: {} events, {} responses observed",
        args.name,
        scenario.events.len(),
        responses.len()
    );
    for observed in &responses {
        info!(
            "cycle {}: req {} -> page pid={} vaddr=0x{:x}",
            observed.cycle, observed.rsp.respond_to, observed.rsp.page.pid.0, observed.rsp.page.vaddr.0
        );
    }

    Ok(())
}
