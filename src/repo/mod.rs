pub mod progress;
pub mod pulls;
pub mod stats;
pub mod types;
pub mod users;

pub use stats::CorrelationMatrix;
pub use types::{PullRequest, RepoId, TimeWindow, User};

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{info, instrument};

use crate::github::{FetchError, GitHubClient, PrState};
use progress::DownloadProgress;

/// Pull requests and contributors of one repository inside a time window.
///
/// Only produced by a completed download (or [`Repository::from_parts`]), and
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct Repository {
    id: RepoId,
    window: TimeWindow,
    pull_requests: Vec<PullRequest>,
    users: Vec<User>,
}

impl Repository {
    /// Download every pull request in `window`, then every contributing user.
    ///
    /// Any fetch failure aborts the download; nothing partial is returned.
    #[instrument(skip_all, fields(repo = %id))]
    pub async fn download(
        client: &GitHubClient,
        id: RepoId,
        window: TimeWindow,
    ) -> Result<Repository, FetchError> {
        Self::download_at(client, id, window, Utc::now()).await
    }

    /// Same as [`Repository::download`] with an explicit "now" for the window cutoff.
    pub async fn download_at(
        client: &GitHubClient,
        id: RepoId,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<Repository, FetchError> {
        let summaries = pulls::fetch_summaries(client, &id, &window, now).await?;
        let mut progress = DownloadProgress::new(summaries.len());

        info!(count = summaries.len(), "downloading pull request details");
        let pull_requests = pulls::collect_pull_requests(client, summaries, &mut progress).await?;

        info!("downloading contributor profiles");
        let users = users::collect_users(client, &pull_requests, &mut progress).await?;
        progress.finish();

        info!(pull_requests = pull_requests.len(), users = users.len(), "repository downloaded");
        Ok(Self::from_parts(id, window, pull_requests, users))
    }

    /// Assemble a repository from already-aggregated parts.
    pub(crate) fn from_parts(
        id: RepoId,
        window: TimeWindow,
        pull_requests: Vec<PullRequest>,
        users: Vec<User>,
    ) -> Self {
        debug_assert_eq!(
            pull_requests.iter().map(|p| p.author.as_str()).collect::<HashSet<_>>(),
            users.iter().map(|u| u.name.as_str()).collect::<HashSet<_>>(),
            "users must be exactly the pull request authors"
        );
        Self {
            id,
            window,
            pull_requests,
            users,
        }
    }

    pub fn id(&self) -> &RepoId {
        &self.id
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// Pull requests in API order (newest first).
    pub fn pull_requests(&self) -> &[PullRequest] {
        &self.pull_requests
    }

    /// Contributors in first-seen order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn total_distinct_authors(&self) -> usize {
        self.pull_requests
            .iter()
            .map(|p| p.author.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn total_open(&self) -> usize {
        self.count_state(PrState::Open)
    }

    pub fn total_closed(&self) -> usize {
        self.count_state(PrState::Closed)
    }

    fn count_state(&self, state: PrState) -> usize {
        self.pull_requests.iter().filter(|p| p.state == state).count()
    }

    /// Creation time of the oldest pull request; `None` when there are none.
    pub fn oldest_created_at(&self) -> Option<DateTime<Utc>> {
        self.pull_requests.iter().map(|p| p.created_at).min()
    }

    /// Correlations among commits, additions, deletions and changed files.
    pub fn pull_request_correlations(&self) -> Option<CorrelationMatrix> {
        let column = |f: fn(&PullRequest) -> u64| -> Vec<f64> {
            self.pull_requests.iter().map(|p| f(p) as f64).collect()
        };
        CorrelationMatrix::from_columns(&[
            ("commits", column(|p| p.commits)),
            ("additions", column(|p| p.additions)),
            ("deletions", column(|p| p.deletions)),
            ("changed_files", column(|p| p.changed_files)),
        ])
    }

    /// Correlations among followers, following, public repos and contributions.
    pub fn user_correlations(&self) -> Option<CorrelationMatrix> {
        let column = |f: fn(&User) -> u64| -> Vec<f64> {
            self.users.iter().map(|u| f(u) as f64).collect()
        };
        CorrelationMatrix::from_columns(&[
            ("followers", column(|u| u.followers)),
            ("following", column(|u| u.following)),
            ("public_repos", column(|u| u.public_repos)),
            ("contributions", column(|u| u.contributions)),
        ])
    }

    /// (additions, deletions) per pull request with outliers beyond 3σ removed.
    pub fn addition_deletion_scatter(&self) -> Vec<(f64, f64)> {
        let points: Vec<(f64, f64)> = self
            .pull_requests
            .iter()
            .map(|p| (p.additions as f64, p.deletions as f64))
            .collect();
        stats::trim_outliers(&points)
    }

    /// (state, commits) rows for a box plot grouped by state.
    pub fn commits_by_state(&self) -> Vec<(PrState, u64)> {
        self.pull_requests.iter().map(|p| (p.state, p.commits)).collect()
    }

    /// (state, additions, deletions) rows for a box plot grouped by state.
    pub fn additions_deletions_by_state(&self) -> Vec<(PrState, u64, u64)> {
        self.pull_requests
            .iter()
            .map(|p| (p.state, p.additions, p.deletions))
            .collect()
    }

    /// (author, changed files) rows for a box plot grouped by author.
    pub fn changed_files_by_author(&self) -> Vec<(&str, u64)> {
        self.pull_requests
            .iter()
            .map(|p| (p.author.as_str(), p.changed_files))
            .collect()
    }
}
