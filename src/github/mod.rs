pub mod link;
pub mod types;

pub use types::{
    AuthenticatedUser, PrState, PullDetail, PullSummary, Timestamped, UserProfile,
};

use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, LINK};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(
        "GitHub API denied access (status {status}). The token may be missing, expired or rate limited; \
         create a new one at https://github.com/settings/tokens?type=beta. Response: {body}"
    )]
    Authorization { status: u16, body: String },

    #[error("No data found at {url}")]
    NotFound { url: String },

    #[error("GitHub API request failed with status {status}: {body}")]
    Transport { status: u16, body: String },

    #[error("Unexpected response shape: {0}")]
    DataShape(String),

    #[error("GitHub API request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Coarse classification of a [`FetchError`], for callers that branch on the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Authorization,
    NotFound,
    Transport,
    DataShape,
}

impl FetchError {
    /// Map a non-success HTTP status to its error kind.
    pub fn from_status(status: u16, url: &str, body: String) -> Self {
        match status {
            401 | 403 => FetchError::Authorization { status, body },
            404 => FetchError::NotFound {
                url: url.to_string(),
            },
            _ => FetchError::Transport { status, body },
        }
    }

    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Authorization { .. } => FetchErrorKind::Authorization,
            FetchError::NotFound { .. } => FetchErrorKind::NotFound,
            FetchError::Transport { .. } | FetchError::Request(_) => FetchErrorKind::Transport,
            FetchError::DataShape(_) => FetchErrorKind::DataShape,
        }
    }
}

/// Authenticated (or anonymous) client for the GitHub REST API.
///
/// Requests are issued one at a time; paginated reads await each page before
/// following the next link.
pub struct GitHubClient {
    api_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl GitHubClient {
    /// Create a client against an API root such as [`DEFAULT_API_URL`].
    pub fn with_api_url(api_url: impl Into<String>, token: Option<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().user_agent("gitdata").build()?;
        Ok(Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            client,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Absolute URL for an API path such as `repos/{owner}/{repo}/pulls`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    async fn send(&self, url: &str, params: &[(&str, String)]) -> Result<reqwest::Response, FetchError> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json");
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), url, "GitHub API returned an error status");
        Err(FetchError::from_status(status.as_u16(), url, body))
    }

    /// Fetch a single JSON object (user profile, pull request detail).
    #[instrument(skip(self))]
    pub async fn get_one<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let text = self.send(url, &[]).await?.text().await?;
        serde_json::from_str(&text).map_err(|e| FetchError::DataShape(format!("{url}: {e}")))
    }

    /// Fetch every page of a list endpoint, following `Link: rel="next"`.
    ///
    /// With a `cutoff`, the endpoint must return records newest-first: pagination
    /// stops once the oldest record fetched so far predates the cutoff, and the
    /// result keeps only records created at or after it. Out-of-order pages are
    /// logged but not corrected.
    #[instrument(skip(self, params))]
    pub async fn get_paginated<T>(
        &self,
        url: &str,
        params: &[(&str, String)],
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<Vec<T>, FetchError>
    where
        T: DeserializeOwned + Timestamped,
    {
        let mut records: Vec<T> = Vec::new();
        let mut next = Some(url.to_string());
        let mut page = 0usize;

        while let Some(page_url) = next.take() {
            // Next links already carry the original query string.
            let query: &[(&str, String)] = if page == 0 { params } else { &[] };
            let response = self.send(&page_url, query).await?;
            let next_link = response
                .headers()
                .get(LINK)
                .and_then(|value| value.to_str().ok())
                .and_then(link::next_link);
            let text = response.text().await?;
            let batch: Vec<T> = parse_page(&page_url, &text)?;
            page += 1;
            debug!(page, records = batch.len(), has_next = next_link.is_some(), "fetched page");

            if cutoff.is_some() && !is_newest_first(records.last(), &batch) {
                warn!(page, url = %page_url, "records are not newest-first; window cutoff may under-fetch");
            }
            records.extend(batch);

            if let Some(cutoff) = cutoff {
                if records.last().is_some_and(|r| r.created_at() < cutoff) {
                    debug!(page, %cutoff, "reached window cutoff");
                    break;
                }
            }
            next = next_link;
        }

        if let Some(cutoff) = cutoff {
            records.retain(|r| r.created_at() >= cutoff);
        }
        Ok(records)
    }

    /// Confirm a token is accepted by the API and return the account it belongs to.
    pub async fn validate_token(&self) -> Result<AuthenticatedUser, FetchError> {
        self.get_one(&self.endpoint("user")).await
    }
}

fn parse_page<T: DeserializeOwned>(url: &str, text: &str) -> Result<Vec<T>, FetchError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| FetchError::DataShape(format!("{url}: {e}")))?;
    if !value.is_array() {
        return Err(FetchError::DataShape(format!(
            "{url}: expected a JSON list for a paginated request"
        )));
    }
    serde_json::from_value(value).map_err(|e| FetchError::DataShape(format!("{url}: {e}")))
}

fn is_newest_first<T: Timestamped>(previous: Option<&T>, batch: &[T]) -> bool {
    let ordered_within = batch
        .windows(2)
        .all(|pair| pair[0].created_at() >= pair[1].created_at());
    let ordered_across = match (previous, batch.first()) {
        (Some(prev), Some(first)) => prev.created_at() >= first.created_at(),
        _ => true,
    };
    ordered_within && ordered_across
}
