#[macro_use]
extern crate log;

pub mod builder;
pub mod cli;
pub mod config;
pub mod ids;
pub mod messages;
pub mod mshr;
pub mod port;
pub mod pwc;
pub mod pwqueue;
pub mod scenario;
pub mod set;
pub mod trace;
pub mod vm;

pub use crate::builder::Builder;
pub use crate::cli::Args;
pub use crate::config::Config;
pub use crate::messages::{
    Control, FlushReq, FlushRsp, RestartReq, RestartRsp, TranslationReq, TranslationReqPwc,
    TranslationRsp,
};
pub use crate::pwc::{ControlRsp, Pwc};
pub use crate::scenario::{run as run_scenario, Scenario, ScenarioEvent};
pub use crate::trace::{JsonlTraceSink, NullTraceSink, TraceSink};
pub use crate::vm::{Page, Pid, VAddr};
