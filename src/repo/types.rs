use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::github::{PrState, PullDetail, PullSummary, UserProfile};

/// Identifies a repository as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = String;

    /// Parse `owner/name`, rejecting empty halves and extra path segments.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        match parts.as_slice() {
            [owner, name] if !owner.trim().is_empty() && !name.trim().is_empty() => {
                Ok(RepoId::new(owner.trim(), name.trim()))
            }
            _ => Err(format!("expected OWNER/REPO, got '{s}'")),
        }
    }
}

/// How far back pull requests are fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeWindow {
    /// Trailing window ending now.
    Days(i64),
    /// Inclusive calendar range in UTC.
    Range { start: NaiveDate, end: NaiveDate },
    /// No cutoff: every pull request the API returns.
    All,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("You must input an integer greater than 0, got {0}")]
    NotPositive(i64),

    #[error("A window of {0} days reaches past the earliest supported date")]
    OutOfRange(i64),

    #[error("Range start {start} is after its end {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

impl TimeWindow {
    /// Reject windows that would select nothing or cannot be represented.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), WindowError> {
        match self {
            TimeWindow::Days(days) if *days <= 0 => Err(WindowError::NotPositive(*days)),
            TimeWindow::Days(days) => days_before(now, *days)
                .map(|_| ())
                .ok_or(WindowError::OutOfRange(*days)),
            TimeWindow::Range { start, end } if start > end => Err(WindowError::Inverted {
                start: *start,
                end: *end,
            }),
            _ => Ok(()),
        }
    }

    /// Earliest creation time to keep, relative to `now`.
    ///
    /// A window reaching past the earliest representable instant has no cutoff.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeWindow::Days(days) => days_before(now, *days),
            TimeWindow::Range { start, .. } => Some(start.and_hms_opt(0, 0, 0)?.and_utc()),
            TimeWindow::All => None,
        }
    }

    /// Exclusive upper bound on creation time, for explicit ranges.
    pub fn upper_bound(&self) -> Option<DateTime<Utc>> {
        match self {
            TimeWindow::Range { end, .. } => Some(end.succ_opt()?.and_hms_opt(0, 0, 0)?.and_utc()),
            _ => None,
        }
    }
}

fn days_before(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(TimeDelta::try_days(days)?)
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeWindow::Days(days) => write!(f, "last {days} days"),
            TimeWindow::Range { start, end } => write!(f, "{start} to {end}"),
            TimeWindow::All => write!(f, "all time"),
        }
    }
}

/// A pull request with its diff statistics.
/// Only built once both the list record and its detail record have been fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequest {
    pub title: String,
    pub number: u64,
    pub body: Option<String>,
    pub state: PrState,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Author's GitHub login
    pub author: String,
    pub commits: u64,
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
}

impl PullRequest {
    pub fn from_api(summary: PullSummary, detail: PullDetail) -> Self {
        Self {
            title: summary.title,
            number: summary.number,
            body: summary.body,
            state: summary.state,
            created_at: summary.created_at,
            closed_at: summary.closed_at,
            author: summary.user.login,
            commits: detail.commits,
            additions: detail.additions,
            deletions: detail.deletions,
            changed_files: detail.changed_files,
        }
    }
}

/// A contributor to one repository.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Login, unique within a repository
    pub name: String,
    pub followers: u64,
    pub following: u64,
    pub public_repos: u64,
    pub public_gists: u64,
    /// Pull requests authored in the repository
    pub contributions: u64,
}

impl User {
    /// First sighting of an author: one contribution so far.
    pub fn from_profile(name: &str, profile: UserProfile) -> Self {
        Self {
            name: name.to_string(),
            followers: profile.followers,
            following: profile.following,
            public_repos: profile.public_repos,
            public_gists: profile.public_gists,
            contributions: 1,
        }
    }
}
