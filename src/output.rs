//! Terminal output formatting.

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::backtrace::{display_frame, BacktraceCluster};
use crate::notice::ErrorGroup;

/// Ids listed per backtrace cluster
const EXAMPLE_IDS: usize = 6;

/// Width of the hot/new sparkline column
const SPARKLINE_COLUMN: usize = 61;

pub fn format_error(message: &str, tip: Option<&str>) -> String {
    let mut output = format!("{} {}", "Error:".red().bold(), message);
    if let Some(tip) = tip {
        output.push('\n');
        output.push_str(&format!("{} {}", "Tip:".blue().bold(), tip));
    }
    output
}

/// One row of the hot/new listings
#[derive(Debug, Serialize)]
pub struct RateRow<'a> {
    pub rank: usize,
    pub rate: f64,
    pub sparkline: String,
    #[serde(flatten)]
    pub error: &'a ErrorGroup,
}

/// `#1    12.5/hour total:1234     ▁▂▅█ -- id:.. -- first:.. -- Class -- message`
pub fn format_rate_row(row: &RateRow<'_>) -> String {
    format!(
        "#{:<2} {}/hour total:{:<8} {:<width$} -- {}",
        row.rank,
        format!("{:>6.2}", row.rate).yellow().bold(),
        row.error.count,
        row.sparkline,
        row.error.summary_line(),
        width = SPARKLINE_COLUMN
    )
}

pub fn print_rate_rows(rows: &[RateRow<'_>]) {
    for row in rows {
        println!();
        println!("{}", format_rate_row(row));
    }
}

/// `id -- class -- message -- created_at`, the grep-friendly list format
pub fn format_list_line(error: &ErrorGroup) -> String {
    format!(
        "{} -- {} -- {} -- {}",
        error.id,
        error.error_class,
        error.error_message,
        error.created_at.to_rfc3339()
    )
}

/// Whole hours between a timestamp and now, rounded
pub fn hours_ago(at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ((now - at).num_seconds() as f64 / 3600.0).round() as i64
}

/// Header and frames of a backtrace cluster
pub fn format_cluster(index: usize, cluster: &BacktraceCluster) -> Vec<String> {
    let ids: Vec<&str> = cluster
        .members
        .iter()
        .take(EXAMPLE_IDS)
        .map(|n| n.id.as_str())
        .collect();

    let mut lines = vec![format!(
        "{} occurred {} times e.g. {}",
        format!("Trace {}:", index + 1).magenta().bold(),
        cluster.len(),
        ids.join(", ")
    )];
    if let Some(first) = cluster.members.first() {
        let message = if first.error_class.is_empty() {
            first.error_message.clone()
        } else {
            format!("{}: {}", first.error_class, first.error_message)
        };
        let width = textwrap::termwidth().min(120);
        lines.extend(textwrap::wrap(&message, width).into_iter().map(|l| l.bold().to_string()));
    }
    lines.extend(cluster.key.iter().map(display_frame));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::{Notice, StackFrame};
    use chrono::TimeZone;

    fn group() -> ErrorGroup {
        ErrorGroup {
            id: "42".to_string(),
            project_id: 1,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            most_recent: None,
            count: 1234,
            error_class: "RuntimeError".to_string(),
            error_message: "boom".to_string(),
            environment: Some("production".to_string()),
        }
    }

    #[test]
    fn test_format_error_with_tip() {
        colored::control::set_override(false);
        let output = format_error("missing token", Some("set AIRBRAKE_TOKEN"));
        assert_eq!(output, "Error: missing token\nTip: set AIRBRAKE_TOKEN");
    }

    #[test]
    fn test_format_rate_row() {
        colored::control::set_override(false);
        let error = group();
        let row = RateRow {
            rank: 1,
            rate: 12.5,
            sparkline: "▁▂█".to_string(),
            error: &error,
        };
        let line = format_rate_row(&row);
        assert!(line.starts_with("#1   12.50/hour total:1234     ▁▂█"));
        assert!(line.ends_with(
            " -- id:42 -- first:2024-05-01 12:00:00 UTC -- RuntimeError -- boom"
        ));
    }

    #[test]
    fn test_rate_row_serializes_flat() {
        let error = group();
        let row = RateRow {
            rank: 2,
            rate: 1.0,
            sparkline: String::new(),
            error: &error,
        };
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"rank\":2"));
        assert!(json.contains("\"error_class\":\"RuntimeError\""));
        assert!(json.contains("\"count\":1234"));
    }

    #[test]
    fn test_format_list_line() {
        assert_eq!(
            format_list_line(&group()),
            "42 -- RuntimeError -- boom -- 2024-05-01T12:00:00+00:00"
        );
    }

    #[test]
    fn test_hours_ago() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(hours_ago(now, now), 0);
        assert_eq!(hours_ago(now - chrono::Duration::minutes(90), now), 2);
        assert_eq!(hours_ago(now - chrono::Duration::hours(30), now), 30);
    }

    #[test]
    fn test_format_cluster() {
        colored::control::set_override(false);
        let members = (1..=8)
            .map(|i| {
                Notice::new(i.to_string(), Utc::now())
                    .with_error("RuntimeError", "boom")
                    .with_backtrace(vec![StackFrame::new("/PROJECT_ROOT/app/a.rb", 3)])
            })
            .collect();
        let cluster = BacktraceCluster {
            key: vec![
                StackFrame::new("/PROJECT_ROOT/app/a.rb", 3),
                StackFrame::new("[GEM_ROOT]/rack.rb", 9),
            ],
            members,
        };

        let lines = format_cluster(0, &cluster);
        assert_eq!(lines[0], "Trace 1: occurred 8 times e.g. 1, 2, 3, 4, 5, 6");
        assert_eq!(lines[1], "RuntimeError: boom");
        assert_eq!(lines[2], "./app/a.rb:3");
        assert_eq!(lines[3], "[GEM_ROOT]/rack.rb:9");
    }
}
