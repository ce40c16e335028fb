//! Remote service client.
//!
//! Three single-shot calls: create a test run, fetch a build's status, fetch a
//! test run's status. Retrying is the poller's job, so nothing here sleeps or
//! loops.

mod types;

pub use types::{BuildStatus, HasStatus, PendingBuild, RunCreationResult, RunStatus, Status};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::ClientError;
use types::CreateRunRequest;

/// Header that tells the service which CLI version is calling.
pub const VERSION_HEADER: &str = "X-Codecrafters-CLI-Version";

pub const CREATE_TEST_RUN_PATH: &str = "/services/coderbot/create_test_run";
pub const FETCH_BUILD_PATH: &str = "/services/coderbot/fetch_test_runner_build";
pub const FETCH_TEST_RUN_PATH: &str = "/services/coderbot/fetch_test_run";

const CREATE_ACTION: &str = "create test run";
const FETCH_BUILD_ACTION: &str = "fetch build result from CodeCrafters";
const FETCH_RUN_ACTION: &str = "fetch test run result from CodeCrafters";

/// Version string sent with every request and printed by `--version`.
pub fn version_string() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn create_run(
        &self,
        autofix_request_id: Option<&str>,
        commit_sha: &str,
    ) -> Result<RunCreationResult, ClientError>;

    async fn fetch_build_status(&self, build_id: &str) -> Result<BuildStatus, ClientError>;

    async fn fetch_run_status(&self, run_id: &str) -> Result<RunStatus, ClientError>;
}

/// JSON-over-HTTPS implementation of [`RemoteClient`].
pub struct HttpClient {
    server_url: String,
    http: reqwest::Client,
}

impl HttpClient {
    pub fn new(server_url: impl Into<String>, http: reqwest::Client) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self { server_url, http }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }

    async fn fetch_status<T: DeserializeOwned>(
        &self,
        path: &str,
        id_param: &str,
        id: &str,
        action: &'static str,
    ) -> Result<T, ClientError> {
        let resp = self
            .http
            .get(self.endpoint(path))
            .header(VERSION_HEADER, version_string())
            .query(&[(id_param, id)])
            .send()
            .await
            .map_err(|source| ClientError::Transport { action, source })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|source| ClientError::Transport { action, source })?;

        if !status.is_success() {
            return Err(ClientError::HttpStatus {
                action,
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| ClientError::Decode { action, source })
    }
}

#[async_trait]
impl RemoteClient for HttpClient {
    async fn create_run(
        &self,
        autofix_request_id: Option<&str>,
        commit_sha: &str,
    ) -> Result<RunCreationResult, ClientError> {
        let action = CREATE_ACTION;
        let resp = self
            .http
            .post(self.endpoint(CREATE_TEST_RUN_PATH))
            .header(VERSION_HEADER, version_string())
            .json(&CreateRunRequest {
                autofix_request_id: autofix_request_id.unwrap_or_default(),
                commit_sha,
            })
            .send()
            .await
            .map_err(|source| ClientError::Transport { action, source })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|source| ClientError::Transport { action, source })?;

        // 403 carries the denial reason inside a regular JSON body.
        if !status.is_success() && status != StatusCode::FORBIDDEN {
            return Err(ClientError::HttpStatus {
                action,
                status: status.as_u16(),
                body,
            });
        }

        let created: RunCreationResult = serde_json::from_str(&body)
            .map_err(|source| ClientError::Decode { action, source })?;
        debug!(
            run_id = %created.run_id,
            http_status = status.as_u16(),
            is_error = created.is_error,
            "create test run response"
        );

        if created.is_error {
            return Err(ClientError::Domain(created.error_message));
        }

        Ok(created)
    }

    async fn fetch_build_status(&self, build_id: &str) -> Result<BuildStatus, ClientError> {
        self.fetch_status(
            FETCH_BUILD_PATH,
            "test_runner_build_id",
            build_id,
            FETCH_BUILD_ACTION,
        )
        .await
    }

    async fn fetch_run_status(&self, run_id: &str) -> Result<RunStatus, ClientError> {
        self.fetch_status(FETCH_TEST_RUN_PATH, "test_run_id", run_id, FETCH_RUN_ACTION)
            .await
    }
}
