//! PWC configuration surface.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Recognized configuration options for a PWC instance.
///
/// The downstream module the PWC fetches from is not part of this struct:
/// it is wired separately, as a port connection, since it is a handle
/// rather than data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub freq_hz: u64,
    pub num_req_per_cycle: usize,
    pub num_sets: usize,
    pub num_ways: usize,
    pub page_size: u64,
    pub log2_page_size: u32,
    pub num_mshr_entry: usize,
    pub len_pwqueue: usize,
    /// Width of the lookup-phase loop, i.e. how many in-flight walks can
    /// advance their tag lookup in a single cycle. Independently
    /// configurable from `num_req_per_cycle`, defaulting to it.
    pub num_walkers: usize,
    /// Fixed simulated PWQueue lookup latency in cycles.
    pub pwqueue_latency: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            freq_hz: 1_000_000_000,
            num_req_per_cycle: 4,
            num_sets: 1,
            num_ways: 32,
            page_size: 4096,
            log2_page_size: 12,
            num_mshr_entry: 4,
            len_pwqueue: 64,
            num_walkers: 4,
            pwqueue_latency: 10,
        }
    }
}

impl Config {
    /// Validates invariants that must hold before a PWC can be built.
    /// Modeled as a setup-time `anyhow::Error`, distinct from the in-engine
    /// panics that model hardware invariant violations once the PWC is
    /// running.
    pub fn validate(&self) -> Result<()> {
        if (1u64 << self.log2_page_size) != self.page_size {
            bail!(
                "log2_page_size {} does not match page_size {}",
                self.log2_page_size,
                self.page_size
            );
        }
        if self.num_req_per_cycle == 0 {
            bail!("num_req_per_cycle must be positive");
        }
        if self.num_sets == 0 {
            bail!("num_sets must be positive");
        }
        if self.num_ways == 0 {
            bail!("num_ways must be positive");
        }
        if self.num_mshr_entry == 0 {
            bail!("num_mshr_entry must be positive");
        }
        if self.len_pwqueue == 0 {
            bail!("len_pwqueue must be positive");
        }
        if self.num_walkers == 0 {
            bail!("num_walkers must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_internally_consistent() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn mismatched_log2_page_size_rejected() {
        let mut cfg = Config::default();
        cfg.log2_page_size = 13;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_ways_rejected() {
        let mut cfg = Config::default();
        cfg.num_ways = 0;
        assert!(cfg.validate().is_err());
    }
}
