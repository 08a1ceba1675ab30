pub mod types;

pub use types::{RepoSummary, Report, SessionSummary};

use crate::repo::{CorrelationMatrix, Repository};
use crate::session::SessionReport;
use colored::Colorize;
use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Build a Report from the session's repositories and its cross-repository aggregate.
pub fn build(repositories: &[Repository], session: Option<&SessionReport>) -> Report {
    Report {
        repositories: repositories.iter().map(RepoSummary::from_repository).collect(),
        session: session.map(SessionSummary::from_report),
    }
}

/// Output the report to terminal (default) or to a markdown file.
#[instrument(skip(report), fields(repositories = report.repositories.len()))]
pub fn output(report: &Report, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing report to terminal");
            print_terminal_report(report);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing report to file");
            write_markdown_report(report, path)
        }
    }
}

/// Terminal layout:
///
/// ═══ octo/widgets (last 365 days) ═══
/// Pull requests: 12 | Users: 4 | Open: 3 | Closed: 9
/// Oldest pull request: 2024-01-01
fn print_terminal_report(report: &Report) {
    println!();
    for repo in &report.repositories {
        println!("═══ {} ({}) ═══", repo.repository.bold(), repo.window);
        println!(
            "Pull requests: {} | Users: {} | Open: {} | Closed: {}",
            repo.pull_requests,
            repo.users,
            repo.open.to_string().green(),
            repo.closed.to_string().red()
        );
        println!("Oldest pull request: {}", repo.oldest_display());
        println!();
        print_matrix("Pull request correlations", repo.pull_request_correlations.as_ref());
        print_matrix("User correlations", repo.user_correlations.as_ref());
    }

    match &report.session {
        Some(session) => {
            println!("═══ {} ═══", "All repositories".bold());
            println!(
                "Window: {} to {} | Pull requests: {}",
                session.start, session.end, session.total_pull_requests
            );
            if let Some((day, count)) = session.busiest_day {
                println!("Busiest day: {} ({} opened)", day, count);
            }
            for row in &session.users_per_repository {
                println!("  • {}: {} users", row.repository, row.users);
            }
        }
        None => println!("{}", "No pull requests found in list of repos".yellow()),
    }
    println!();
}

fn print_matrix(title: &str, matrix: Option<&CorrelationMatrix>) {
    println!("{}", title.bold());
    match matrix {
        Some(matrix) => print!("{}", format_matrix(matrix)),
        None => println!("  {}", "unavailable (fewer than 2 data points)".dimmed()),
    }
    println!();
}

/// Fixed-width text table of a correlation matrix; undefined cells print as `-`.
fn format_matrix(matrix: &CorrelationMatrix) -> String {
    let width = matrix.fields.iter().map(|f| f.len()).max().unwrap_or(0).max(6);
    let mut out = String::new();
    let _ = write!(out, "  {:width$}", "");
    for field in &matrix.fields {
        let _ = write!(out, " {:>width$}", field);
    }
    out.push('\n');
    for (field, row) in matrix.fields.iter().zip(&matrix.values) {
        let _ = write!(out, "  {:width$}", field);
        for value in row {
            let cell = value.map(|v| format!("{v:.3}")).unwrap_or_else(|| "-".to_string());
            let _ = write!(out, " {:>width$}", cell);
        }
        out.push('\n');
    }
    out
}

fn markdown_matrix(md: &mut String, title: &str, matrix: Option<&CorrelationMatrix>) {
    md.push_str(&format!("### {}\n\n", title));
    let Some(matrix) = matrix else {
        md.push_str("Unavailable (fewer than 2 data points).\n\n");
        return;
    };
    md.push_str(&format!("| | {} |\n", matrix.fields.join(" | ")));
    md.push_str(&format!("|---|{}\n", "---|".repeat(matrix.fields.len())));
    for (field, row) in matrix.fields.iter().zip(&matrix.values) {
        let cells: Vec<String> = row
            .iter()
            .map(|v| v.map(|v| format!("{v:.3}")).unwrap_or_else(|| "-".to_string()))
            .collect();
        md.push_str(&format!("| {} | {} |\n", field, cells.join(" | ")));
    }
    md.push('\n');
}

fn write_markdown_report(report: &Report, path: &Path) -> Result<(), ReportError> {
    let mut md = String::new();
    for repo in &report.repositories {
        md.push_str(&format!("## {} ({})\n\n", repo.repository, repo.window));
        md.push_str(&format!(
            "**Pull requests:** {} | **Users:** {} | **Open:** {} | **Closed:** {}\n\n",
            repo.pull_requests, repo.users, repo.open, repo.closed
        ));
        md.push_str(&format!("**Oldest pull request:** {}\n\n", repo.oldest_display()));
        markdown_matrix(&mut md, "Pull request correlations", repo.pull_request_correlations.as_ref());
        markdown_matrix(&mut md, "User correlations", repo.user_correlations.as_ref());
    }

    md.push_str("## All repositories\n\n");
    match &report.session {
        Some(session) => {
            md.push_str(&format!(
                "**Window:** {} to {} | **Pull requests:** {}\n\n",
                session.start, session.end, session.total_pull_requests
            ));
            if let Some((day, count)) = session.busiest_day {
                md.push_str(&format!("**Busiest day:** {} ({} opened)\n\n", day, count));
            }
            for row in &session.users_per_repository {
                md.push_str(&format!("- {}: {} users\n", row.repository, row.users));
            }
        }
        None => md.push_str("No pull requests found in list of repos.\n"),
    }

    std::fs::write(path, md)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::PrState;
    use crate::repo::tests::{pull, repository};
    use crate::session;
    use chrono::NaiveDate;

    fn sample_repos() -> Vec<Repository> {
        vec![repository(
            "widgets",
            vec![
                pull(3, "carol", PrState::Open, "2024-01-03", [2, 40, 4, 3]),
                pull(2, "bob", PrState::Closed, "2024-01-02", [1, 5, 0, 1]),
                pull(1, "alice", PrState::Open, "2024-01-01", [3, 10, 2, 1]),
            ],
        )]
    }

    #[test]
    fn test_build_without_session() {
        let report = build(&sample_repos(), None);
        assert_eq!(report.repositories.len(), 1);
        assert!(report.session.is_none());
    }

    #[test]
    fn test_format_matrix_marks_undefined_cells() {
        let matrix = CorrelationMatrix::from_columns(&[
            ("a", vec![1.0, 2.0]),
            ("b", vec![3.0, 3.0]),
        ])
        .unwrap();
        let text = format_matrix(&matrix);
        assert!(text.contains("1.000"));
        assert!(text.contains(" -"));
    }

    #[test]
    fn test_write_markdown_report() {
        let repos = sample_repos();
        let today = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let session_report = session::analyze(&repos, None, today).unwrap();
        let report = build(&repos, Some(&session_report));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        write_markdown_report(&report, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("## acme/widgets (all time)"));
        assert!(content.contains("**Open:** 2 | **Closed:** 1"));
        assert!(content.contains("**Oldest pull request:** 2024-01-01"));
        assert!(content.contains("| | commits | additions | deletions | changed_files |"));
        assert!(content.contains("### User correlations"));
        assert!(content.contains("- widgets: 3 users"));
        // Ties go to the earliest day.
        assert!(content.contains("**Busiest day:** 2024-01-01 (1 opened)"));
    }

    #[test]
    fn test_markdown_without_session_data() {
        let report = build(&[repository("empty", vec![])], None);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.md");
        output(&report, Some(&path)).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Unavailable (fewer than 2 data points)."));
        assert!(content.contains("No pull requests found in list of repos."));
    }

    #[test]
    fn test_output_to_terminal() {
        let report = build(&sample_repos(), None);
        // Should not panic
        output(&report, None).unwrap();
    }
}
