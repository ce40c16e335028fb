//! Configuration for the CLI.
//!
//! Settings are layered file → environment:
//! - `~/.codecrafters/config.toml` (optional)
//! - `CODECRAFTERS_SERVER_URL` and `CODECRAFTERS_AUTOFIX_REQUEST_ID`
//!
//! `--verbose` only affects logging and is handled by `telemetry`.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! url = "https://app.codecrafters.io"
//!
//! [timing]
//! build_settle_ms = 1000
//!
//! [polling.build]
//! max_attempts = 11
//! initial_delay_ms = 100
//! max_delay_ms = 2000
//!
//! [polling.run]
//! max_attempts = 5
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::orchestrator::PhaseTiming;
use crate::poll::RetryPolicy;

pub const DEFAULT_SERVER_URL: &str = "https://app.codecrafters.io";
pub const SERVER_URL_ENV: &str = "CODECRAFTERS_SERVER_URL";
pub const AUTOFIX_REQUEST_ID_ENV: &str = "CODECRAFTERS_AUTOFIX_REQUEST_ID";
const CONFIG_FILE: &str = "config.toml";

/// `[server]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerSection {
    #[serde(default)]
    pub url: Option<String>,
}

/// `[timing]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingSection {
    /// Pause between a successful build and attaching to the test logs.
    #[serde(default = "default_build_settle_ms")]
    pub build_settle_ms: u64,
}

fn default_build_settle_ms() -> u64 {
    1000
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            build_settle_ms: default_build_settle_ms(),
        }
    }
}

/// Overrides for one retry policy. Unset fields keep the built-in value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyOverride {
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub initial_delay_ms: Option<u64>,
    #[serde(default)]
    pub max_delay_ms: Option<u64>,
}

impl PolicyOverride {
    pub fn apply(&self, base: RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            initial_delay: self
                .initial_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(base.initial_delay),
            max_delay: self
                .max_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(base.max_delay),
        }
    }

    fn validate(&self, name: &str, base: RetryPolicy, warnings: &mut Vec<String>) {
        let policy = self.apply(base);
        if policy.max_attempts == 0 {
            warnings.push(format!(
                "polling.{}.max_attempts is 0; one attempt will still be made",
                name
            ));
        }
        if policy.initial_delay > policy.max_delay {
            warnings.push(format!(
                "polling.{}.initial_delay_ms ({}) exceeds max_delay_ms ({})",
                name,
                policy.initial_delay.as_millis(),
                policy.max_delay.as_millis()
            ));
        }
    }
}

/// `[polling]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollingSection {
    #[serde(default)]
    pub build: PolicyOverride,
    #[serde(default)]
    pub run: PolicyOverride,
}

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliToml {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub timing: TimingSection,
    #[serde(default)]
    pub polling: PollingSection,
}

impl CliToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config.toml")
    }

    /// Load `config.toml` from `config_dir`, or defaults if it doesn't exist.
    pub fn load_or_default(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn timing(&self) -> PhaseTiming {
        PhaseTiming {
            build_policy: self.polling.build.apply(RetryPolicy::BUILD),
            run_policy: self.polling.run.apply(RetryPolicy::RUN),
            build_settle_delay: Duration::from_millis(self.timing.build_settle_ms),
        }
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(url) = &self.server.url
            && !is_http_url(url)
        {
            warnings.push(format!(
                "server.url '{}' should start with http:// or https://",
                url
            ));
        }
        self.polling
            .build
            .validate("build", RetryPolicy::BUILD, &mut warnings);
        self.polling
            .run
            .validate("run", RetryPolicy::RUN, &mut warnings);

        warnings
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Pick the server URL: env → file → default. Empty values count as unset.
pub fn resolve_server_url(env_url: Option<String>, file_url: Option<&str>) -> String {
    env_url
        .filter(|url| !url.trim().is_empty())
        .or_else(|| {
            file_url
                .filter(|url| !url.trim().is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
}

/// Default location of the config directory (`~/.codecrafters`).
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".codecrafters"))
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: String,
    pub autofix_request_id: Option<String>,
    pub timing: PhaseTiming,
    /// Problems found in the config file that didn't stop loading.
    pub warnings: Vec<String>,
}

impl Config {
    /// Load from the default config directory and the process environment.
    pub fn load() -> Result<Self> {
        let toml = match default_config_dir() {
            Some(dir) => CliToml::load_or_default(&dir)?,
            None => CliToml::default(),
        };
        Ok(Self::from_parts(
            toml,
            std::env::var(SERVER_URL_ENV).ok(),
            std::env::var(AUTOFIX_REQUEST_ID_ENV).ok(),
        ))
    }

    pub fn from_parts(
        toml: CliToml,
        env_server_url: Option<String>,
        env_autofix_request_id: Option<String>,
    ) -> Self {
        Self {
            server_url: resolve_server_url(env_server_url, toml.server.url.as_deref()),
            autofix_request_id: env_autofix_request_id.filter(|id| !id.is_empty()),
            timing: toml.timing(),
            warnings: toml.validate(),
        }
    }
}
