pub mod csv;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::repo::Repository;
use crate::session::SessionReport;
use self::csv::{append_records, write_table};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write export file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Directory naming for one run's output. The run id keeps session output of
/// different runs apart.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    run_id: String,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            run_id: run_id.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn repos_dir(&self) -> PathBuf {
        self.root.join("repos")
    }

    /// Remove the CSV files a previous run appended to, so rows start fresh.
    /// Chart directories are left alone; they are overwritten or keyed by run id.
    pub fn reset_session_files(&self) -> Result<(), ExportError> {
        for file in [self.repositories_csv(), self.users_csv()] {
            match fs::remove_file(&file) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
                _ => {}
            }
        }
        match fs::remove_dir_all(self.repos_dir()) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
        debug!(root = %self.root.display(), "reset session CSV files");
        Ok(())
    }

    pub fn repositories_csv(&self) -> PathBuf {
        self.root.join("repositories.csv")
    }

    pub fn users_csv(&self) -> PathBuf {
        self.root.join("users.csv")
    }

    pub fn pull_requests_csv(&self, repository: &Repository) -> PathBuf {
        let id = repository.id();
        self.repos_dir().join(format!("{}-{}.csv", id.owner, id.name))
    }

    pub fn repository_dir(&self, repository: &Repository) -> PathBuf {
        self.root
            .join("figures")
            .join(format!("repo_summary_{}", repository.id().name))
    }

    pub fn session_dir(&self) -> PathBuf {
        self.root
            .join("figures")
            .join(format!("all_repos_analysis_{}", self.run_id))
    }
}

/// Append a downloaded repository's rows to the session CSV files.
#[instrument(skip_all, fields(repo = %repository.id()))]
pub fn save_repository(layout: &OutputLayout, repository: &Repository) -> Result<(), ExportError> {
    append_records(&layout.repositories_csv(), std::slice::from_ref(repository))?;
    append_records(&layout.users_csv(), repository.users())?;
    append_records(&layout.pull_requests_csv(repository), repository.pull_requests())?;
    debug!(root = %layout.root().display(), "saved repository CSV records");
    Ok(())
}

/// Write the chart-ready tables for one repository.
#[instrument(skip_all, fields(repo = %repository.id()))]
pub fn write_repository_charts(layout: &OutputLayout, repository: &Repository) -> Result<PathBuf, ExportError> {
    let dir = layout.repository_dir(repository);

    let scatter: Vec<Vec<String>> = repository
        .addition_deletion_scatter()
        .into_iter()
        .map(|(additions, deletions)| vec![additions.to_string(), deletions.to_string()])
        .collect();
    write_table(&dir.join("scatter_addition_deletion.csv"), &["addition", "deletion"], &scatter)?;

    let commits: Vec<Vec<String>> = repository
        .commits_by_state()
        .into_iter()
        .map(|(state, commits)| vec![commits.to_string(), state.to_string()])
        .collect();
    write_table(&dir.join("box_closed_open_commit.csv"), &["commit", "state"], &commits)?;

    let diff: Vec<Vec<String>> = repository
        .additions_deletions_by_state()
        .into_iter()
        .map(|(state, additions, deletions)| {
            vec![additions.to_string(), deletions.to_string(), state.to_string()]
        })
        .collect();
    write_table(
        &dir.join("box_addition_deletion.csv"),
        &["addition", "deletion", "state"],
        &diff,
    )?;

    let files: Vec<Vec<String>> = repository
        .changed_files_by_author()
        .into_iter()
        .map(|(author, changed)| vec![author.to_string(), changed.to_string()])
        .collect();
    write_table(&dir.join("file_changes_per_user.csv"), &["user", "num_changed_files"], &files)?;

    Ok(dir)
}

/// Write the chart-ready tables for the whole session.
#[instrument(skip_all)]
pub fn write_session_charts(layout: &OutputLayout, report: &SessionReport) -> Result<PathBuf, ExportError> {
    let dir = layout.session_dir();

    let per_day: Vec<Vec<String>> = report
        .daily
        .iter()
        .map(|d| vec![d.date.to_string(), d.opened.to_string()])
        .collect();
    write_table(&dir.join("pulls_per_day.csv"), &["date", "tally"], &per_day)?;

    let open_closed: Vec<Vec<String>> = report
        .daily
        .iter()
        .map(|d| vec![d.date.to_string(), d.opened.to_string(), d.closed.to_string()])
        .collect();
    write_table(
        &dir.join("open_vs_closed_per_day.csv"),
        &["date", "open_tally", "close_tally"],
        &open_closed,
    )?;

    let users: Vec<Vec<String>> = report
        .users_per_repository
        .iter()
        .map(|r| vec![r.repository.clone(), r.users.to_string()])
        .collect();
    write_table(&dir.join("users_per_repository.csv"), &["repo_name", "users"], &users)?;

    Ok(dir)
}
