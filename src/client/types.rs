use serde::{Deserialize, Deserializer, Serialize};

/// Status of a build or test run, translated from the wire string.
///
/// Only `"success"` and `"failure"` are terminal. Every other string,
/// including ones the service may introduce later, is `Pending` and keeps the
/// raw value for error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
    Pending(String),
}

impl Status {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "success" => Status::Success,
            "failure" => Status::Failure,
            other => Status::Pending(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Success | Status::Failure)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Status::Success => "success",
            Status::Failure => "failure",
            Status::Pending(raw) => raw,
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Pending(String::new())
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Status::from_wire(raw.as_deref().unwrap_or_default()))
    }
}

/// Treat an explicit JSON `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Anything the poller can inspect for terminality.
pub trait HasStatus {
    /// Noun used in "unexpected ... status" messages.
    const SUBJECT: &'static str;

    fn status(&self) -> &Status;
}

/// Body sent to the create-run endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct CreateRunRequest<'a> {
    pub autofix_request_id: &'a str,
    pub commit_sha: &'a str,
}

/// Response of the create-run endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunCreationResult {
    #[serde(rename = "id", default, deserialize_with = "null_as_default")]
    pub run_id: String,

    /// Set when the run is waiting on a build.
    #[serde(default)]
    pub pending_build_id: Option<String>,
    #[serde(default)]
    pub pending_build_logstream_url: Option<String>,

    /// Test logs.
    #[serde(default, deserialize_with = "null_as_default")]
    pub logstream_url: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub error_message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_error: bool,
}

/// The build a run is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBuild {
    pub id: String,
    pub logstream_url: String,
}

impl RunCreationResult {
    /// The pending build, if the service reported a non-empty build id.
    pub fn pending_build(&self) -> Option<PendingBuild> {
        let id = self.pending_build_id.as_deref().filter(|id| !id.is_empty())?;
        Some(PendingBuild {
            id: id.to_string(),
            logstream_url: self.pending_build_logstream_url.clone().unwrap_or_default(),
        })
    }
}

/// Response of the fetch-build endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildStatus {
    #[serde(default)]
    pub status: Status,
    #[serde(default, deserialize_with = "null_as_default")]
    pub error_message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_error: bool,
}

impl HasStatus for BuildStatus {
    const SUBJECT: &'static str = "build";

    fn status(&self) -> &Status {
        &self.status
    }
}

/// Response of the fetch-test-run endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunStatus {
    #[serde(default)]
    pub status: Status,
    #[serde(default, deserialize_with = "null_as_default")]
    pub error_message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_error: bool,
}

impl HasStatus for RunStatus {
    const SUBJECT: &'static str = "test run";

    fn status(&self) -> &Status {
        &self.status
    }
}
