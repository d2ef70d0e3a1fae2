use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Terminal result of a build, serialized as the host's uppercase strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
}

impl BuildStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Unstable => "UNSTABLE",
            Self::Failure => "FAILURE",
            Self::NotBuilt => "NOT_BUILT",
            Self::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildStatus {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let status = [
            Self::Success,
            Self::Unstable,
            Self::Failure,
            Self::NotBuilt,
            Self::Aborted,
        ]
        .into_iter()
        .find(|status| text.eq_ignore_ascii_case(status.as_str()));

        status.ok_or_else(|| {
            format!("unknown build result {text:?} (expected SUCCESS, UNSTABLE, FAILURE, NOT_BUILT, or ABORTED)")
        })
    }
}

/// The canonical payload for one completed build. Built fresh per build,
/// serialized, sent, discarded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRecord {
    pub repository: String,
    pub status: BuildStatus,
    pub build_number: String,
    pub branch: String,
    pub commit: String,
    pub workflow_content: String,
    pub jobs: Vec<JobRecord>,
}

/// One job inside a build. Always a single synthetic entry named "Build"
/// until real sub-job tracking exists.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub name: String,
    pub status: BuildStatus,
    pub logs: String,
}
