mod config;
mod credentials;
mod export;
mod github;
mod report;
mod repo;
mod session;

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use github::{FetchError, FetchErrorKind, GitHubClient};
use repo::{RepoId, Repository, TimeWindow};
use session::SessionError;

/// gitdata: download pull request and contributor data for GitHub
/// repositories and summarize it.
#[derive(Parser, Debug)]
#[command(name = "gitdata", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download one or more repositories and summarize them
    Fetch(FetchArgs),
    /// Validate a GitHub token and store it for later runs
    Login {
        /// Personal access token
        token: String,
    },
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Repositories as OWNER/REPO
    #[arg(required = true)]
    repos: Vec<RepoId>,

    /// Only pull requests created in the last N days (default from config, 365)
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..), conflicts_with_all = ["since", "all"])]
    days: Option<i64>,

    /// Start of an explicit date range (YYYY-MM-DD)
    #[arg(long, requires = "until", conflicts_with = "all")]
    since: Option<NaiveDate>,

    /// End of an explicit date range (YYYY-MM-DD, inclusive)
    #[arg(long, requires = "since")]
    until: Option<NaiveDate>,

    /// Download every pull request regardless of age
    #[arg(long)]
    all: bool,

    /// Window for the cross-repository time series, in days back from today
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
    session_days: Option<i64>,

    /// Identifier for this run's output directory (default: current UTC timestamp)
    #[arg(long)]
    run_id: Option<String>,

    /// Root directory for CSV files and chart tables
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the summary as markdown to this file instead of the terminal
    #[arg(long)]
    markdown: Option<PathBuf>,

    /// GitHub token (overrides config, GITHUB_TOKEN and the stored token)
    #[arg(long)]
    token: Option<String>,
}

impl FetchArgs {
    fn window(&self, default_days: i64) -> TimeWindow {
        match (self.all, self.since, self.until) {
            (true, _, _) => TimeWindow::All,
            (false, Some(start), Some(end)) => TimeWindow::Range { start, end },
            _ => TimeWindow::Days(self.days.unwrap_or(default_days)),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = config::Config::load()?;
    let store = credentials::TokenStore::new(config.token_file());

    match cli.command {
        Command::Login { token } => {
            let login = credentials::login(&store, config.api_url(), &token).await?;
            println!("Token for {} saved to {}", login, store.path().display());
            Ok(())
        }
        Command::Fetch(args) => fetch(args, &config, &store).await,
    }
}

async fn fetch(
    args: FetchArgs,
    config: &config::Config,
    store: &credentials::TokenStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();
    let window = args.window(config.window_days());
    window.validate(now)?;
    let today = now.date_naive();
    if let Some(days) = args.session_days {
        session::trailing_start(today, days)?;
    }

    let token = match args.token.clone().or_else(|| config.github_token()) {
        Some(token) => Some(token),
        None => credentials::load_validated(store, config.api_url()).await?,
    };
    let client = GitHubClient::with_api_url(config.api_url(), token)?;
    if !client.is_authenticated() {
        warn!("no GitHub token configured; unauthenticated requests are heavily rate limited");
    }

    let run_id = args
        .run_id
        .clone()
        .unwrap_or_else(|| now.format("%Y%m%d%H%M%S").to_string());
    let layout = export::OutputLayout::new(
        args.output.clone().unwrap_or_else(|| config.data_dir()),
        run_id,
    );
    layout.reset_session_files()?;

    let (session, aborted) = download_repositories(&client, &args.repos, &window, &layout).await?;

    let session_report = match session::analyze(session.repositories(), args.session_days, today) {
        Ok(session_report) => {
            let dir = export::write_session_charts(&layout, &session_report)?;
            info!(dir = %dir.display(), "wrote session chart tables");
            Some(session_report)
        }
        Err(SessionError::NoPullRequests) => {
            info!(total = session.total_pull_requests(), "no session aggregate");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let built_report = report::build(session.repositories(), session_report.as_ref());
    report::output(&built_report, args.markdown.as_deref())?;
    info!(repositories = session.repositories().len(), "done");

    match aborted {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Download and save each repository in turn.
///
/// A failed repository is logged and skipped. An authorization failure stops
/// the loop, since every later request would fail too; it is handed back
/// alongside the repositories downloaded before it.
async fn download_repositories(
    client: &GitHubClient,
    repos: &[RepoId],
    window: &TimeWindow,
    layout: &export::OutputLayout,
) -> Result<(session::Session, Option<FetchError>), export::ExportError> {
    let mut session = session::Session::new();
    for id in repos {
        if session.contains(id) {
            warn!(repo = %id, "repository listed twice; skipping");
            continue;
        }

        info!(repo = %id, %window, "downloading repository");
        match Repository::download(client, id.clone(), window.clone()).await {
            Ok(repository) => {
                export::save_repository(layout, &repository)?;
                let dir = export::write_repository_charts(layout, &repository)?;
                info!(repo = %id, dir = %dir.display(), "wrote chart tables");
                session.push(repository);
            }
            Err(e) if e.kind() == FetchErrorKind::Authorization => {
                error!(repo = %id, error = %e, "authorization failed; stopping downloads");
                return Ok((session, Some(e)));
            }
            Err(e) => {
                error!(repo = %id, kind = ?e.kind(), error = %e, "download failed; skipping repository");
            }
        }
    }
    Ok((session, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_cli_parses_fetch() {
        let cli = Cli::try_parse_from(["gitdata", "fetch", "acme/widgets", "rust-lang/cargo", "--days", "30"]).unwrap();
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.repos.len(), 2);
        assert_eq!(args.repos[1], RepoId::new("rust-lang", "cargo"));
        assert_eq!(args.window(365), TimeWindow::Days(30));
    }

    #[test]
    fn test_cli_window_variants() {
        let cli = Cli::try_parse_from(["gitdata", "fetch", "a/b"]).unwrap();
        let Command::Fetch(args) = cli.command else { panic!("expected fetch") };
        assert_eq!(args.window(90), TimeWindow::Days(90));

        let cli = Cli::try_parse_from(["gitdata", "fetch", "a/b", "--all"]).unwrap();
        let Command::Fetch(args) = cli.command else { panic!("expected fetch") };
        assert_eq!(args.window(90), TimeWindow::All);

        let cli = Cli::try_parse_from([
            "gitdata", "fetch", "a/b", "--since", "2024-01-01", "--until", "2024-02-01",
        ])
        .unwrap();
        let Command::Fetch(args) = cli.command else { panic!("expected fetch") };
        assert_eq!(
            args.window(90),
            TimeWindow::Range {
                start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            }
        );
    }

    #[test]
    fn test_cli_rejects_bad_input() {
        assert!(Cli::try_parse_from(["gitdata", "fetch", "not-a-repo"]).is_err());
        assert!(Cli::try_parse_from(["gitdata", "fetch"]).is_err());
        assert!(Cli::try_parse_from(["gitdata", "fetch", "a/b", "--since", "2024-01-01"]).is_err());
        assert!(Cli::try_parse_from(["gitdata", "fetch", "a/b", "--days", "3", "--all"]).is_err());
    }

    #[test]
    fn test_cli_rejects_non_positive_days() {
        assert!(Cli::try_parse_from(["gitdata", "fetch", "a/b", "--days", "0"]).is_err());
        assert!(Cli::try_parse_from(["gitdata", "fetch", "a/b", "--days=-5"]).is_err());
        assert!(Cli::try_parse_from(["gitdata", "fetch", "a/b", "--session-days", "0"]).is_err());
        assert!(Cli::try_parse_from(["gitdata", "fetch", "a/b", "--session-days=-3"]).is_err());
        assert!(Cli::try_parse_from(["gitdata", "fetch", "a/b", "--days", "1", "--session-days", "1"]).is_ok());
    }

    #[test]
    fn test_inverted_range_fails_validation() {
        let cli = Cli::try_parse_from([
            "gitdata", "fetch", "a/b", "--since", "2024-03-01", "--until", "2024-02-01",
        ])
        .unwrap();
        let Command::Fetch(args) = cli.command else { panic!("expected fetch") };
        assert!(matches!(
            args.window(90).validate(Utc::now()),
            Err(repo::types::WindowError::Inverted { .. })
        ));
    }

    #[tokio::test]
    async fn test_authorization_failure_keeps_earlier_repositories() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/acme/quiet/pulls");
                then.status(200).json_body(serde_json::json!([]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/acme/locked/pulls");
                then.status(403).body("API rate limit exceeded");
            })
            .await;
        let never = server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/acme/later/pulls");
                then.status(200).json_body(serde_json::json!([]));
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let layout = export::OutputLayout::new(dir.path(), "1");
        let client = GitHubClient::with_api_url(server.base_url(), Some("t".to_string())).unwrap();
        let repos = [
            RepoId::new("acme", "quiet"),
            RepoId::new("acme", "locked"),
            RepoId::new("acme", "later"),
        ];

        let (session, aborted) = download_repositories(&client, &repos, &TimeWindow::All, &layout)
            .await
            .unwrap();

        never.assert_calls_async(0).await;
        assert_eq!(session.repositories().len(), 1);
        assert!(session.contains(&RepoId::new("acme", "quiet")));
        assert_eq!(aborted.map(|e| e.kind()), Some(FetchErrorKind::Authorization));
        assert!(layout.repositories_csv().exists());

        // The summary still covers what was downloaded.
        let built = report::build(session.repositories(), None);
        assert_eq!(built.repositories.len(), 1);
    }

    #[tokio::test]
    async fn test_other_failures_skip_the_repository() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/acme/gone/pulls");
                then.status(404);
            })
            .await;
        let next = server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/acme/quiet/pulls");
                then.status(200).json_body(serde_json::json!([]));
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let layout = export::OutputLayout::new(dir.path(), "1");
        let client = GitHubClient::with_api_url(server.base_url(), None).unwrap();
        let repos = [RepoId::new("acme", "gone"), RepoId::new("acme", "quiet")];

        let (session, aborted) = download_repositories(&client, &repos, &TimeWindow::All, &layout)
            .await
            .unwrap();

        next.assert_async().await;
        assert!(aborted.is_none());
        assert_eq!(session.repositories().len(), 1);
    }
}
