use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use super::progress::DownloadProgress;
use super::types::{PullRequest, RepoId, TimeWindow};
use crate::github::{FetchError, GitHubClient, PullDetail, PullSummary};

/// Largest page size the pulls endpoint accepts.
const PAGE_SIZE: u32 = 100;

/// List every pull request of `repo` inside `window`, newest first.
#[instrument(skip_all, fields(repo = %repo))]
pub async fn fetch_summaries(
    client: &GitHubClient,
    repo: &RepoId,
    window: &TimeWindow,
    now: DateTime<Utc>,
) -> Result<Vec<PullSummary>, FetchError> {
    let url = client.endpoint(&format!("repos/{}/{}/pulls", repo.owner, repo.name));
    // sort=created&direction=desc is the ordering the window cutoff relies on.
    let params = [
        ("state", "all".to_string()),
        ("sort", "created".to_string()),
        ("direction", "desc".to_string()),
        ("per_page", PAGE_SIZE.to_string()),
    ];

    let mut summaries: Vec<PullSummary> = client
        .get_paginated(&url, &params, window.cutoff(now))
        .await?;
    if let Some(end) = window.upper_bound() {
        summaries.retain(|s| s.created_at < end);
    }
    info!(count = summaries.len(), %window, "found pull requests in window");
    Ok(summaries)
}

/// Enrich each summary with its diff statistics, one detail request per pull request.
///
/// Any failed detail request aborts the whole collection.
pub async fn collect_pull_requests(
    client: &GitHubClient,
    summaries: Vec<PullSummary>,
    progress: &mut DownloadProgress,
) -> Result<Vec<PullRequest>, FetchError> {
    let mut pull_requests = Vec::with_capacity(summaries.len());
    for summary in summaries {
        let detail: PullDetail = client.get_one(&summary.url).await?;
        debug!(
            number = summary.number,
            commits = detail.commits,
            additions = detail.additions,
            deletions = detail.deletions,
            "fetched pull request detail"
        );
        pull_requests.push(PullRequest::from_api(summary, detail));
        progress.pull_done();
    }
    Ok(pull_requests)
}
