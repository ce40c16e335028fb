//! Typed error hierarchy for the test-run orchestrator.
//!
//! Four enums cover the subsystems:
//! - `ClientError`: a single request against the remote service
//! - `PollExhausted` / `LastAttempt`: a status poll that ran out of attempts
//! - `RelayError`: attaching to or copying a log stream
//! - `RunError`: everything the orchestrator can surface to the caller
//!
//! Messages are written as context segments: an `anyhow` `{:#}` rendering (or
//! [`display_chain`]) joins them with `": "`, so a variant never repeats the
//! text of its `#[source]`.

use thiserror::Error;

/// Boxed error used at the log-source boundary, where the transport is opaque.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from a single request against the remote service.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to {action}")]
    Transport {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to {action}. status code: {status}, body: {body}")]
    HttpStatus {
        action: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to {action}")]
    Decode {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The service parsed the request and rejected it (`is_error: true`).
    #[error("{0}")]
    Domain(String),
}

impl ClientError {
    /// True for authoritative rejections from the service.
    pub fn is_domain(&self) -> bool {
        matches!(self, ClientError::Domain(_))
    }
}

/// The final attempt of an exhausted poll. Earlier attempts are discarded.
#[derive(Debug, Error)]
pub enum LastAttempt {
    #[error(transparent)]
    Failed(ClientError),

    #[error("unexpected {subject} status: {status}")]
    NotTerminal {
        subject: &'static str,
        status: String,
    },
}

/// A poll that never observed a terminal status within its attempt budget.
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempts")]
pub struct PollExhausted {
    pub attempts: u32,
    #[source]
    pub last: LastAttempt,
}

/// Errors from relaying a log stream to the user.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("open log stream {url}")]
    Open {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("read log stream")]
    Read(#[source] BoxError),

    #[error("write logs")]
    Write(#[source] std::io::Error),
}

/// Errors that end a test run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    CreateRun(ClientError),

    #[error("stream build logs")]
    StreamBuildLogs(#[source] RelayError),

    #[error("stream logs")]
    StreamLogs(#[source] RelayError),

    #[error("fetch build status")]
    BuildPoll(#[source] PollExhausted),

    #[error("fetch test run status")]
    RunPoll(#[source] PollExhausted),

    #[error("unexpected build status: {status}")]
    AmbiguousBuildStatus { status: String },

    /// The run finished but the service flagged the result itself as an error.
    #[error("{0}")]
    Domain(String),
}

impl RunError {
    /// True when the service rejected the run, as opposed to the client failing
    /// to reach it or to read its answer.
    pub fn is_domain(&self) -> bool {
        match self {
            RunError::CreateRun(err) => err.is_domain(),
            RunError::Domain(_) => true,
            _ => false,
        }
    }
}

/// Render an error and its sources as `outer: inner: root`.
pub fn display_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
