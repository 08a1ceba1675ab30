use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Lifecycle state of a pull request as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    Open,
    Closed,
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrState::Open => write!(f, "open"),
            PrState::Closed => write!(f, "closed"),
        }
    }
}

/// Records that carry a creation timestamp, used for window filtering while paginating.
pub trait Timestamped {
    fn created_at(&self) -> DateTime<Utc>;
}

/// Login reference embedded in pull request payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    pub login: String,
}

/// One entry of `GET /repos/{owner}/{repo}/pulls`.
/// The list endpoint carries no diff statistics; `url` points at the detail record.
#[derive(Debug, Clone, Deserialize)]
pub struct PullSummary {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: PrState,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub user: UserRef,
    pub url: String,
}

impl Timestamped for PullSummary {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Diff statistics from `GET /repos/{owner}/{repo}/pulls/{number}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PullDetail {
    pub commits: u64,
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
}

/// Public profile counters from `GET /users/{login}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub login: String,
    pub followers: u64,
    pub following: u64,
    pub public_repos: u64,
    pub public_gists: u64,
}

/// The account behind a token, from `GET /user`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticatedUser {
    pub login: String,
}
