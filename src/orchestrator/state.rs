use std::fmt;

/// States of a single test-run invocation.
///
/// ```text
/// Created ─┬─> BuildPending ─> BuildStreaming ─> BuildPolling ─┬─> BuildFailed
///          │                                                   └─> TestStreaming
///          └─> TestPending ─────────────────────────────────────> TestStreaming
/// TestStreaming ─> TestPolling ─┬─> TestsPassed
///                               └─> TestsFailed
/// any non-terminal state ─> Errored
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Created,
    BuildPending,
    BuildStreaming,
    BuildPolling,
    BuildFailed,
    TestPending,
    TestStreaming,
    TestPolling,
    TestsPassed,
    TestsFailed,
    Errored,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::BuildFailed | RunState::TestsPassed | RunState::TestsFailed | RunState::Errored
        )
    }

    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::{
            BuildFailed, BuildPending, BuildPolling, BuildStreaming, Created, Errored, TestPending,
            TestPolling, TestStreaming, TestsFailed, TestsPassed,
        };

        if next == Errored {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Created, BuildPending)
                | (Created, TestPending)
                | (BuildPending, BuildStreaming)
                | (BuildStreaming, BuildPolling)
                | (BuildPolling, BuildFailed)
                | (BuildPolling, TestStreaming)
                | (TestPending, TestStreaming)
                | (TestStreaming, TestPolling)
                | (TestPolling, TestsPassed)
                | (TestPolling, TestsFailed)
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Created => "created",
            RunState::BuildPending => "build_pending",
            RunState::BuildStreaming => "build_streaming",
            RunState::BuildPolling => "build_polling",
            RunState::BuildFailed => "build_failed",
            RunState::TestPending => "test_pending",
            RunState::TestStreaming => "test_streaming",
            RunState::TestPolling => "test_polling",
            RunState::TestsPassed => "tests_passed",
            RunState::TestsFailed => "tests_failed",
            RunState::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Ordered record of the states a run went through.
#[derive(Debug, Clone)]
pub struct StateHistory {
    states: Vec<RunState>,
}

impl Default for StateHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHistory {
    pub fn new() -> Self {
        Self {
            states: vec![RunState::Created],
        }
    }

    pub fn current(&self) -> RunState {
        self.states
            .last()
            .copied()
            .unwrap_or(RunState::Created)
    }

    /// Record a transition. Returns false, leaving the history untouched, if
    /// the transition is not allowed from the current state.
    pub fn advance(&mut self, next: RunState) -> bool {
        if !self.current().can_transition_to(next) {
            return false;
        }
        self.states.push(next);
        true
    }

    pub fn states(&self) -> &[RunState] {
        &self.states
    }
}
