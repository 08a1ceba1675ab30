use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use super::ExportError;
use crate::repo::{PullRequest, Repository, User};

/// A value that can be written as one CSV row under a fixed header.
pub trait CsvRecord {
    fn header() -> &'static [&'static str];
    fn record(&self) -> Vec<String>;
}

impl CsvRecord for Repository {
    fn header() -> &'static [&'static str] {
        &["owner_name", "repo_name", "n_pull_requests", "n_users"]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.id().owner.clone(),
            self.id().name.clone(),
            self.pull_requests().len().to_string(),
            self.users().len().to_string(),
        ]
    }
}

impl CsvRecord for PullRequest {
    fn header() -> &'static [&'static str] {
        &[
            "title",
            "number",
            "body",
            "state",
            "created_at",
            "closed_at",
            "user",
            "num_commits",
            "num_additions",
            "num_deletions",
            "num_changed_files",
        ]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.number.to_string(),
            self.body.clone().unwrap_or_default(),
            self.state.to_string(),
            iso8601(&self.created_at),
            self.closed_at.as_ref().map(iso8601).unwrap_or_default(),
            self.author.clone(),
            self.commits.to_string(),
            self.additions.to_string(),
            self.deletions.to_string(),
            self.changed_files.to_string(),
        ]
    }
}

impl CsvRecord for User {
    fn header() -> &'static [&'static str] {
        &["name", "followers", "following", "public_repos", "public_gists", "contributions"]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.followers.to_string(),
            self.following.to_string(),
            self.public_repos.to_string(),
            self.public_gists.to_string(),
            self.contributions.to_string(),
        ]
    }
}

fn iso8601(at: &chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Format one CSV line (excel dialect, CRLF), dropping non-ASCII characters.
pub fn format_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields
        .iter()
        .map(|field| escape(&ascii_only(field.as_ref())))
        .collect::<Vec<_>>()
        .join(",");
    line.push_str("\r\n");
    line
}

fn ascii_only(value: &str) -> String {
    value.chars().filter(char::is_ascii).collect()
}

fn escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Append `items` to `path`, writing the header first if the file is new.
pub fn append_records<T: CsvRecord>(path: &Path, items: &[T]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let is_new = !path.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut out = String::new();
    if is_new {
        out.push_str(&format_row(T::header()));
    }
    for item in items {
        out.push_str(&format_row(&item.record()));
    }
    file.write_all(out.as_bytes())?;
    Ok(())
}

/// Overwrite `path` with a header and rows.
pub fn write_table(path: &Path, header: &[&str], rows: &[Vec<String>]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = format_row(header);
    for row in rows {
        out.push_str(&format_row(row));
    }
    fs::write(path, out)?;
    Ok(())
}
