use std::time::Duration;

use tracing::{debug, warn};

use super::state::{RunState, StateHistory};
use crate::client::{PendingBuild, RemoteClient, RunCreationResult, Status};
use crate::errors::{RunError, display_chain};
use crate::poll::{RetryPolicy, poll_until_terminal};
use crate::relay::LogRelay;
use crate::telemetry::Diagnostics;
use crate::ui::TestRunUI;

/// Pause between a successful build and attaching to the test logs. The test
/// log producer usually starts several seconds after the build finishes; this
/// is a buffer, not a correctness requirement.
pub const DEFAULT_BUILD_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Retry policies and fixed delays used by one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTiming {
    pub build_policy: RetryPolicy,
    pub run_policy: RetryPolicy,
    pub build_settle_delay: Duration,
}

impl Default for PhaseTiming {
    fn default() -> Self {
        Self {
            build_policy: RetryPolicy::BUILD,
            run_policy: RetryPolicy::RUN,
            build_settle_delay: DEFAULT_BUILD_SETTLE_DELAY,
        }
    }
}

/// What to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub autofix_request_id: Option<String>,
    pub commit_sha: String,
}

/// How a run ended when nothing went wrong operationally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    TestsPassed,
    TestsFailed,
    /// The build failed; tests never ran.
    BuildFailed,
    /// The run status was neither success nor failure. The poller only hands
    /// back terminal statuses, so this is not expected in practice.
    Inconclusive,
}

/// Drives one test run: optional build phase, then the test phase.
pub struct TestRunOrchestrator<C, L, D> {
    client: C,
    relay: L,
    diagnostics: D,
    ui: TestRunUI,
    timing: PhaseTiming,
    history: StateHistory,
}

impl<C, L, D> TestRunOrchestrator<C, L, D>
where
    C: RemoteClient,
    L: LogRelay,
    D: Diagnostics,
{
    pub fn new(client: C, relay: L, diagnostics: D, ui: TestRunUI) -> Self {
        Self {
            client,
            relay,
            diagnostics,
            ui,
            timing: PhaseTiming::default(),
            history: StateHistory::new(),
        }
    }

    pub fn with_timing(mut self, timing: PhaseTiming) -> Self {
        self.timing = timing;
        self
    }

    /// States visited so far, starting with `Created`.
    pub fn history(&self) -> &[RunState] {
        self.history.states()
    }

    pub fn into_relay(self) -> L {
        self.relay
    }

    pub async fn run(&mut self, request: &RunRequest) -> Result<Outcome, RunError> {
        let result = self.drive(request).await;
        if let Err(err) = &result {
            self.advance(RunState::Errored);
            debug!(error = %display_chain(err), "test run errored");
        }
        result
    }

    fn advance(&mut self, next: RunState) {
        let from = self.history.current();
        if self.history.advance(next) {
            debug!(%from, to = %next, "run state");
        } else {
            warn!(%from, to = %next, "ignoring invalid run state transition");
        }
    }

    async fn drive(&mut self, request: &RunRequest) -> Result<Outcome, RunError> {
        debug!(commit = %request.commit_sha, "creating test run");
        let created = self
            .client
            .create_run(request.autofix_request_id.as_deref(), &request.commit_sha)
            .await
            .map_err(RunError::CreateRun)?;
        debug!(run_id = %created.run_id, "test run created");

        match created.pending_build() {
            Some(build) => {
                self.advance(RunState::BuildPending);
                if let Some(outcome) = self.build_phase(&build).await? {
                    return Ok(outcome);
                }
            }
            None => self.advance(RunState::TestPending),
        }

        self.test_phase(&created).await
    }

    /// Returns `Some` when the run ends with the build.
    async fn build_phase(&mut self, build: &PendingBuild) -> Result<Option<Outcome>, RunError> {
        self.advance(RunState::BuildStreaming);
        debug!(url = %build.logstream_url, "streaming build logs");
        self.ui.build_logs_starting();
        if let Err(err) = self.relay.stream(&build.logstream_url).await {
            self.ui.build_logs_failed();
            return Err(RunError::StreamBuildLogs(err));
        }
        debug!("finished streaming build logs");

        self.advance(RunState::BuildPolling);
        debug!(build_id = %build.id, "fetching build");
        let client = &self.client;
        let polled = poll_until_terminal(&self.timing.build_policy, move || {
            client.fetch_build_status(&build.id)
        })
        .await;

        let build_status = match polled {
            Ok(status) => status,
            Err(exhausted) => {
                self.ui.fetch_failed(&display_chain(&exhausted));
                // Builds that never settle point at the control plane, not the user's code.
                self.diagnostics.report(&exhausted);
                return Err(RunError::BuildPoll(exhausted));
            }
        };
        debug!(
            status = %build_status.status,
            is_error = build_status.is_error,
            "finished fetching build"
        );

        match build_status.status {
            Status::Failure => {
                self.ui.build_failed();
                self.advance(RunState::BuildFailed);
                Ok(Some(Outcome::BuildFailed))
            }
            Status::Success => {
                tokio::time::sleep(self.timing.build_settle_delay).await;
                Ok(None)
            }
            Status::Pending(status) => {
                self.ui.build_status_unknown();
                Err(RunError::AmbiguousBuildStatus { status })
            }
        }
    }

    async fn test_phase(&mut self, created: &RunCreationResult) -> Result<Outcome, RunError> {
        self.advance(RunState::TestStreaming);
        self.ui.running_tests();
        debug!(url = %created.logstream_url, "streaming test logs");
        self.relay
            .stream(&created.logstream_url)
            .await
            .map_err(RunError::StreamLogs)?;

        self.advance(RunState::TestPolling);
        debug!(run_id = %created.run_id, "fetching test run");
        let client = &self.client;
        let polled = poll_until_terminal(&self.timing.run_policy, move || {
            client.fetch_run_status(&created.run_id)
        })
        .await;

        let run_status = match polled {
            Ok(status) => status,
            Err(exhausted) => {
                self.ui.fetch_failed(&display_chain(&exhausted));
                return Err(RunError::RunPoll(exhausted));
            }
        };
        debug!(status = %run_status.status, "finished fetching test run");

        let (outcome, terminal) = match &run_status.status {
            Status::Failure => {
                self.ui.tests_failed();
                (Outcome::TestsFailed, Some(RunState::TestsFailed))
            }
            Status::Success => {
                self.ui.tests_passed();
                (Outcome::TestsPassed, Some(RunState::TestsPassed))
            }
            Status::Pending(_) => {
                self.ui.no_verdict();
                (Outcome::Inconclusive, None)
            }
        };

        if run_status.is_error {
            return Err(RunError::Domain(run_status.error_message));
        }
        if let Some(state) = terminal {
            self.advance(state);
        }
        Ok(outcome)
    }
}
