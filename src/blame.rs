//! `git blame` annotation for project frames.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use crate::backtrace::display_frame;
use crate::notice::StackFrame;

/// Who last touched a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlameInfo {
    pub commit: String,
    pub author: String,
    pub authored_at: Option<DateTime<Utc>>,
    pub summary: String,
}

impl BlameInfo {
    /// Short one-line form for terminal output
    pub fn short(&self) -> String {
        let date = self
            .authored_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let commit: String = self.commit.chars().take(8).collect();
        format!("{commit} {} {date} {}", self.author, self.summary)
    }
}

/// Path of a project frame relative to the repository root.
///
/// Only frames with a project root marker map into the repository.
pub fn repository_path(frame: &StackFrame, root: &Path) -> Option<PathBuf> {
    let rendered = display_frame(frame);
    let relative = rendered.strip_prefix("./")?;
    let file = relative
        .rsplit_once(':')
        .map_or(relative, |(file, _)| file);
    Some(root.join(file))
}

/// Run `git blame` for the frame's line; `None` when git has nothing to say
pub async fn blame_frame(frame: &StackFrame, root: &Path) -> Option<BlameInfo> {
    let path = repository_path(frame, root)?;
    let range = format!("{0},{0}", frame.line_number);
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(["blame", "--porcelain", "-L", &range, "--"])
        .arg(&path)
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        debug!(
            path = %path.display(),
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "git blame failed"
        );
        return None;
    }

    parse_porcelain(&String::from_utf8_lossy(&output.stdout))
}

/// Parse the header of `git blame --porcelain` output for a single line
pub fn parse_porcelain(output: &str) -> Option<BlameInfo> {
    let mut lines = output.lines();
    let commit = lines.next()?.split_whitespace().next()?.to_string();

    let mut author = String::new();
    let mut authored_at = None;
    let mut summary = String::new();

    for line in lines {
        if line.starts_with('\t') {
            break;
        }
        if let Some(value) = line.strip_prefix("author ") {
            author = value.to_string();
        } else if let Some(value) = line.strip_prefix("author-time ") {
            authored_at = value
                .parse::<i64>()
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0));
        } else if let Some(value) = line.strip_prefix("summary ") {
            summary = value.to_string();
        }
    }

    Some(BlameInfo {
        commit,
        author,
        authored_at,
        summary,
    })
}
