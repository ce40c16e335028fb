pub mod runner;
pub mod state;

pub use runner::{
    DEFAULT_BUILD_SETTLE_DELAY, Outcome, PhaseTiming, RunRequest, TestRunOrchestrator,
};
pub use state::{RunState, StateHistory};
