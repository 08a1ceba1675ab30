use chrono::{NaiveDate, TimeDelta};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::repo::{RepoId, Repository};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No pull requests found in list of repos")]
    NoPullRequests,

    #[error("Session window must be a positive number of days that stays in the calendar, got {0}")]
    InvalidWindow(i64),
}

/// Repositories downloaded during one run, in download order.
#[derive(Debug, Default)]
pub struct Session {
    repositories: Vec<Repository>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a repository. The caller is responsible for not adding the same one twice.
    pub fn push(&mut self, repository: Repository) {
        self.repositories.push(repository);
    }

    pub fn contains(&self, id: &RepoId) -> bool {
        self.repositories.iter().any(|r| r.id() == id)
    }

    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    pub fn total_pull_requests(&self) -> usize {
        total_pull_requests(&self.repositories)
    }
}

/// Pull requests opened and closed on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub opened: usize,
    pub closed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoUserCount {
    pub repository: String,
    pub users: usize,
}

/// Cross-repository aggregates over an inclusive day range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_pull_requests: usize,
    /// One entry per day from `start` to `end`
    pub daily: Vec<DailyCount>,
    pub users_per_repository: Vec<RepoUserCount>,
}

pub fn total_pull_requests(repositories: &[Repository]) -> usize {
    repositories.iter().map(|r| r.pull_requests().len()).sum()
}

/// Aggregate all repositories of a session.
///
/// With `window_days` the range is the trailing `window_days` ending `today`;
/// otherwise it spans the earliest to the latest creation date of any pull request.
#[instrument(skip(repositories), fields(repositories = repositories.len()))]
pub fn analyze(
    repositories: &[Repository],
    window_days: Option<i64>,
    today: NaiveDate,
) -> Result<SessionReport, SessionError> {
    let total = total_pull_requests(repositories);
    if total == 0 {
        return Err(SessionError::NoPullRequests);
    }

    let (start, end) = match window_days {
        Some(days) => (trailing_start(today, days)?, today),
        None => created_range(repositories).ok_or(SessionError::NoPullRequests)?,
    };
    debug!(%start, %end, "analysis window");

    Ok(SessionReport {
        start,
        end,
        total_pull_requests: total,
        daily: daily_counts(repositories, start, end),
        users_per_repository: users_per_repository(repositories),
    })
}

/// First day of a trailing window of `days` days ending `today`.
pub fn trailing_start(today: NaiveDate, days: i64) -> Result<NaiveDate, SessionError> {
    if days <= 0 {
        return Err(SessionError::InvalidWindow(days));
    }
    TimeDelta::try_days(days)
        .and_then(|delta| today.checked_sub_signed(delta))
        .ok_or(SessionError::InvalidWindow(days))
}

fn created_range(repositories: &[Repository]) -> Option<(NaiveDate, NaiveDate)> {
    let dates = repositories
        .iter()
        .flat_map(|r| r.pull_requests())
        .map(|p| p.created_at.date_naive());
    let start = dates.clone().min()?;
    let end = dates.max()?;
    Some((start, end))
}

/// Daily opened/closed tallies; days without activity are present with zero counts.
pub fn daily_counts(repositories: &[Repository], start: NaiveDate, end: NaiveDate) -> Vec<DailyCount> {
    let mut daily: Vec<DailyCount> = start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|date| DailyCount {
            date,
            opened: 0,
            closed: 0,
        })
        .collect();

    let slot = |date: NaiveDate| -> Option<usize> {
        if date < start || date > end {
            return None;
        }
        usize::try_from((date - start).num_days()).ok()
    };

    for pull in repositories.iter().flat_map(|r| r.pull_requests()) {
        if let Some(i) = slot(pull.created_at.date_naive()) {
            daily[i].opened += 1;
        }
        if let Some(i) = pull.closed_at.and_then(|at| slot(at.date_naive())) {
            daily[i].closed += 1;
        }
    }
    daily
}

pub fn users_per_repository(repositories: &[Repository]) -> Vec<RepoUserCount> {
    repositories
        .iter()
        .map(|r| RepoUserCount {
            repository: r.id().name.clone(),
            users: r.users().len(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::PrState;
    use crate::repo::tests::{pull, repository};

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_session() -> Session {
        let mut session = Session::new();
        session.push(repository(
            "widgets",
            vec![
                pull(3, "alice", PrState::Open, "2024-01-05", [1, 1, 1, 1]),
                pull(2, "bob", PrState::Closed, "2024-01-02", [1, 1, 1, 1]),
            ],
        ));
        session.push(repository(
            "gadgets",
            vec![pull(7, "carol", PrState::Closed, "2024-01-02", [1, 1, 1, 1])],
        ));
        session
    }

    #[test]
    fn test_no_pull_requests_is_reported() {
        let mut session = Session::new();
        session.push(repository("empty", vec![]));
        let result = analyze(session.repositories(), None, day("2024-01-10"));
        assert!(matches!(result, Err(SessionError::NoPullRequests)));
        assert!(matches!(
            analyze(&[], Some(30), day("2024-01-10")),
            Err(SessionError::NoPullRequests)
        ));
    }

    #[test]
    fn test_range_derived_from_created_dates() {
        let session = sample_session();
        let report = analyze(session.repositories(), None, day("2030-01-01")).unwrap();
        assert_eq!(report.start, day("2024-01-02"));
        assert_eq!(report.end, day("2024-01-05"));
        assert_eq!(report.total_pull_requests, 3);
        assert_eq!(report.daily.len(), 4);

        let opened: Vec<usize> = report.daily.iter().map(|d| d.opened).collect();
        assert_eq!(opened, vec![2, 0, 0, 1]);
        // Closed pull requests close the day after they open.
        let closed: Vec<usize> = report.daily.iter().map(|d| d.closed).collect();
        assert_eq!(closed, vec![0, 2, 0, 0]);
    }

    #[test]
    fn test_explicit_window_ends_today() {
        let session = sample_session();
        let report = analyze(session.repositories(), Some(2), day("2024-01-05")).unwrap();
        assert_eq!(report.start, day("2024-01-03"));
        assert_eq!(report.end, day("2024-01-05"));
        let opened: Vec<usize> = report.daily.iter().map(|d| d.opened).collect();
        assert_eq!(opened, vec![0, 0, 1]);
        let closed: Vec<usize> = report.daily.iter().map(|d| d.closed).collect();
        assert_eq!(closed, vec![2, 0, 0]);
    }

    #[test]
    fn test_invalid_session_window_is_rejected() {
        let session = sample_session();
        let today = day("2024-01-05");
        for days in [0, -3, 200_000_000, i64::MAX] {
            assert!(matches!(
                analyze(session.repositories(), Some(days), today),
                Err(SessionError::InvalidWindow(d)) if d == days
            ));
        }
        assert_eq!(trailing_start(today, 1).unwrap(), day("2024-01-04"));
    }

    #[test]
    fn test_users_per_repository() {
        let session = sample_session();
        let counts = users_per_repository(session.repositories());
        assert_eq!(
            counts,
            vec![
                RepoUserCount { repository: "widgets".to_string(), users: 2 },
                RepoUserCount { repository: "gadgets".to_string(), users: 1 },
            ]
        );
    }

    #[test]
    fn test_contains_and_totals() {
        let session = sample_session();
        assert!(session.contains(&RepoId::new("acme", "widgets")));
        assert!(!session.contains(&RepoId::new("acme", "other")));
        assert_eq!(session.total_pull_requests(), 3);
    }
}
