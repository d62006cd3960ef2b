//! Fluent builder for wiring up a [`Pwc`], mirroring
//! `original_source/builder.go`'s `With*`/`Build` idiom.

use anyhow::Result;

use crate::config::Config;
use crate::pwc::Pwc;

/// Accumulates configuration, then constructs a fully-wired, reset [`Pwc`].
///
/// `build` returns a `Result` rather than panicking on an invalid
/// configuration: a setup-time mistake is an `anyhow::Error`, distinct
/// from the in-engine panics that model hardware invariant violations.
#[derive(Clone, Copy, Debug, Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Self {
        Builder {
            config: Config::default(),
        }
    }

    pub fn with_freq_hz(mut self, freq_hz: u64) -> Self {
        self.config.freq_hz = freq_hz;
        self
    }

    pub fn with_num_sets(mut self, n: usize) -> Self {
        self.config.num_sets = n;
        self
    }

    pub fn with_num_ways(mut self, n: usize) -> Self {
        self.config.num_ways = n;
        self
    }

    pub fn with_page_size(mut self, n: u64) -> Self {
        self.config.page_size = n;
        self
    }

    pub fn with_log2_page_size(mut self, n: u32) -> Self {
        self.config.log2_page_size = n;
        self
    }

    pub fn with_num_req_per_cycle(mut self, n: usize) -> Self {
        self.config.num_req_per_cycle = n;
        self
    }

    pub fn with_num_mshr_entry(mut self, n: usize) -> Self {
        self.config.num_mshr_entry = n;
        self
    }

    pub fn with_len_pwqueue(mut self, n: usize) -> Self {
        self.config.len_pwqueue = n;
        self
    }

    pub fn with_num_walkers(mut self, n: usize) -> Self {
        self.config.num_walkers = n;
        self
    }

    pub fn with_pwqueue_latency(mut self, n: u32) -> Self {
        self.config.pwqueue_latency = n;
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Validates the accumulated configuration and constructs a `Pwc`
    /// with all ports and internal stores sized accordingly.
    pub fn build(self, name: impl Into<String>) -> Result<Pwc> {
        self.config.validate()?;
        Ok(Pwc::new(name.into(), self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_rejects_inconsistent_config() {
        let err = Builder::new().with_log2_page_size(20).build("pwc0");
        assert!(err.is_err());
    }

    #[test]
    fn build_produces_named_pwc() {
        let pwc = Builder::new().with_num_ways(8).build("pwc0").unwrap();
        assert_eq!(pwc.name(), "pwc0");
    }
}
