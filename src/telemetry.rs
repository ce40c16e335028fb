//! Logging setup and crash-style diagnostics.
//!
//! - **Logging**: `tracing` to stderr, filtered by `RUST_LOG` (default `warn`,
//!   or `codecrafters=debug` with `--verbose`). Stdout stays reserved for the
//!   relayed logs and verdicts.
//! - **Diagnostics**: a fire-and-forget sink for conditions that point at the
//!   remote control plane rather than at the user's code. It is an explicit
//!   object handed to the orchestrator, created and finished at the process
//!   boundary by [`DiagnosticsSession`].

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::errors::display_chain;

/// Initialize the tracing subscriber. Safe to call more than once; later calls
/// leave the first subscriber in place.
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose { "codecrafters=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}

/// Sink for exceptional conditions worth a report.
pub trait Diagnostics: Send + Sync {
    fn report(&self, error: &(dyn std::error::Error + 'static));
}

impl<T: Diagnostics + ?Sized> Diagnostics for &T {
    fn report(&self, error: &(dyn std::error::Error + 'static)) {
        (**self).report(error)
    }
}

/// Reports through `tracing` at error level and counts what it saw.
#[derive(Debug, Default)]
pub struct TracingDiagnostics {
    reported: AtomicUsize,
}

impl TracingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reported(&self) -> usize {
        self.reported.load(Ordering::SeqCst)
    }
}

impl Diagnostics for TracingDiagnostics {
    fn report(&self, error: &(dyn std::error::Error + 'static)) {
        self.reported.fetch_add(1, Ordering::SeqCst);
        error!(
            target: "codecrafters::diagnostics",
            error = %display_chain(error),
            "exceptional condition"
        );
    }
}

/// Process-wide diagnostics state, set up at startup and finished before exit.
pub struct DiagnosticsSession {
    diagnostics: TracingDiagnostics,
}

impl DiagnosticsSession {
    pub fn start(verbose: bool) -> Self {
        init_logging(verbose);
        debug!(version = crate::client::version_string(), "diagnostics session started");
        Self {
            diagnostics: TracingDiagnostics::new(),
        }
    }

    pub fn diagnostics(&self) -> &TracingDiagnostics {
        &self.diagnostics
    }

    /// Tear down the session. Returns how many conditions were reported.
    pub fn finish(self) -> usize {
        let reported = self.diagnostics.reported();
        debug!(reported, "diagnostics session finished");
        reported
    }
}
