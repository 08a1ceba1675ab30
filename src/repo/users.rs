use std::collections::HashMap;
use tracing::debug;

use super::progress::DownloadProgress;
use super::types::{PullRequest, User};
use crate::github::{FetchError, GitHubClient, UserProfile};

/// Build the contributor set of a repository from its pull requests.
///
/// Users come out in first-seen order. Each distinct author's profile is
/// fetched exactly once, on first sight; later pull requests by the same
/// author only bump the contribution count.
pub async fn collect_users(
    client: &GitHubClient,
    pull_requests: &[PullRequest],
    progress: &mut DownloadProgress,
) -> Result<Vec<User>, FetchError> {
    let mut users: Vec<User> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for pull in pull_requests {
        match index.get(pull.author.as_str()) {
            Some(&i) => users[i].contributions += 1,
            None => {
                let url = client.endpoint(&format!("users/{}", pull.author));
                let profile: UserProfile = client.get_one(&url).await?;
                debug!(user = %profile.login, followers = profile.followers, "fetched user profile");
                index.insert(pull.author.as_str(), users.len());
                users.push(User::from_profile(&pull.author, profile));
            }
        }
        progress.user_done();
    }

    Ok(users)
}
