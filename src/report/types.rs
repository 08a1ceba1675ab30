use chrono::NaiveDate;

use crate::repo::{CorrelationMatrix, Repository};
use crate::session::{RepoUserCount, SessionReport};

/// Printed in place of a date when a repository has no pull requests.
pub const NOT_AVAILABLE: &str = "NA";

/// Headline statistics for one downloaded repository.
#[derive(Debug, Clone)]
pub struct RepoSummary {
    /// `owner/name`
    pub repository: String,
    /// Human-readable time window
    pub window: String,
    pub pull_requests: usize,
    pub users: usize,
    pub open: usize,
    pub closed: usize,
    /// Oldest creation date, or `None` without pull requests
    pub oldest: Option<NaiveDate>,
    pub pull_request_correlations: Option<CorrelationMatrix>,
    pub user_correlations: Option<CorrelationMatrix>,
}

impl RepoSummary {
    pub fn from_repository(repository: &Repository) -> Self {
        Self {
            repository: repository.id().to_string(),
            window: repository.window().to_string(),
            pull_requests: repository.pull_requests().len(),
            users: repository.total_distinct_authors(),
            open: repository.total_open(),
            closed: repository.total_closed(),
            oldest: repository.oldest_created_at().map(|at| at.date_naive()),
            pull_request_correlations: repository.pull_request_correlations(),
            user_correlations: repository.user_correlations(),
        }
    }

    pub fn oldest_display(&self) -> String {
        self.oldest
            .map(|date| date.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

/// Cross-repository totals for the session.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_pull_requests: usize,
    pub busiest_day: Option<(NaiveDate, usize)>,
    pub users_per_repository: Vec<RepoUserCount>,
}

impl SessionSummary {
    pub fn from_report(report: &SessionReport) -> Self {
        let busiest_day = report
            .daily
            .iter()
            .filter(|d| d.opened > 0)
            // Earliest day wins ties.
            .fold(None, |best: Option<(NaiveDate, usize)>, d| match best {
                Some((_, count)) if count >= d.opened => best,
                _ => Some((d.date, d.opened)),
            });
        Self {
            start: report.start,
            end: report.end,
            total_pull_requests: report.total_pull_requests,
            busiest_day,
            users_per_repository: report.users_per_repository.clone(),
        }
    }
}

/// Everything printed at the end of a run.
#[derive(Debug)]
pub struct Report {
    pub repositories: Vec<RepoSummary>,
    /// `None` when the session has no pull requests at all
    pub session: Option<SessionSummary>,
}
