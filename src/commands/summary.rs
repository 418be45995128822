//! `summary`: occurrences, trends and backtrace origins of one error.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use colored::Colorize;
use futures::future::BoxFuture;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

use super::Session;
use crate::backtrace::{adaptive_compare_depth, cluster, sort_for_display, BacktraceCluster, ClusterOptions};
use crate::blame::blame_frame;
use crate::buckets::{bucketize_at, BucketSeries};
use crate::cli::Command;
use crate::config::Config;
use crate::graph::{render_image, save_png};
use crate::notice::Notice;
use crate::output::{format_cluster, hours_ago};
use crate::source::{EventSource, SourceError, NOTICES_PER_PAGE};
use crate::sparkline::render_inline;

/// Last two hours, two minutes per slot
const RECENT_SLOTS: usize = 60;
const RECENT_INTERVAL_SECS: i64 = 120;

/// Last day, one hour per slot
const DAY_SLOTS: usize = 24;
const DAY_INTERVAL_SECS: i64 = 3600;

/// Everything `summary` reports, also its JSON form
#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub error_id: String,
    pub notices: usize,
    pub oldest_notice: Option<DateTime<Utc>>,
    pub compare_depth: usize,
    pub last_two_hours: BucketSeries,
    pub last_day: BucketSeries,
    pub clusters: Vec<BacktraceCluster>,
}

impl SummaryReport {
    /// Bucket and cluster a notice sample
    pub fn build(
        error_id: &str,
        notices: &[Notice],
        compare_depth: Option<usize>,
        config: &Config,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let matcher = config
            .frame_matcher()
            .context("Invalid frame pattern in configuration")?;
        let depth = compare_depth.unwrap_or_else(|| {
            adaptive_compare_depth(
                notices.iter().filter(|n| n.has_backtrace()),
                &matcher,
                config.compare_margin,
            )
        });
        debug!(depth, "comparing backtraces");

        let options = ClusterOptions {
            compare_depth: Some(depth),
            margin: config.compare_margin,
            matcher,
        };
        let mut clusters = cluster(notices, &options);
        sort_for_display(&mut clusters);

        Ok(Self {
            error_id: error_id.to_string(),
            notices: notices.len(),
            oldest_notice: notices.iter().map(|n| n.created_at).min(),
            compare_depth: depth,
            last_two_hours: bucketize_at(notices, RECENT_SLOTS, RECENT_INTERVAL_SECS, now),
            last_day: bucketize_at(notices, DAY_SLOTS, DAY_INTERVAL_SECS, now),
            clusters,
        })
    }
}

pub fn run<'a>(session: &'a Session, command: &'a Command) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let Command::Summary {
            error_id,
            compare_depth,
            graph,
            blame,
            repo,
        } = command
        else {
            bail!("summary handler called for {}", command.name());
        };

        let notices = fetch_notices(
            session.source.as_ref(),
            session.project_id,
            error_id,
            session.config.summary_pages,
        )
        .await
        .with_context(|| format!("Failed to fetch notices for error {error_id}"))?;

        let now = Utc::now();
        let report = SummaryReport::build(error_id, &notices, *compare_depth, &session.config, now)?;

        if session.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report, now);
        }

        if *blame && !session.json {
            let root = match repo {
                Some(path) => path.clone(),
                None => std::env::current_dir().context("Failed to read current directory")?,
            };
            print_blame(&report, &session.config, &root).await?;
        }

        if let Some(path) = graph {
            write_graph(&report.last_day, now, path)?;
        }

        Ok(())
    })
}

/// Fetch up to `pages` pages of notices, newest first.
///
/// The first page must succeed. A transient failure on a later page keeps
/// what was already fetched; a short page means there is nothing more.
pub async fn fetch_notices(
    source: &dyn EventSource,
    project_id: u64,
    error_id: &str,
    pages: u32,
) -> Result<Vec<Notice>, SourceError> {
    let mut notices = Vec::new();
    for page in 1..=pages.max(1) {
        let batch = match source.list_notices(project_id, error_id, page).await {
            Ok(batch) => batch,
            Err(err) if page > 1 && err.is_transient() => {
                warn!(error_id, page, %err, "stopping early, keeping notices fetched so far");
                break;
            }
            Err(err) => return Err(err),
        };
        let short = batch.len() < NOTICES_PER_PAGE;
        notices.extend(batch);
        if short {
            break;
        }
    }
    Ok(notices)
}

fn print_report(report: &SummaryReport, now: DateTime<Utc>) {
    let Some(oldest) = report.oldest_notice else {
        println!("No notices recorded for error {}", report.error_id);
        return;
    };

    println!(
        "Last retrieved notice: {} hours ago at {}",
        hours_ago(oldest, now),
        oldest.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "{} {}",
        "Last 2 hours:".bold(),
        render_inline(&report.last_two_hours)
    );
    println!("{} {}", "Last day:    ".bold(), render_inline(&report.last_day));

    if report.clusters.is_empty() {
        println!();
        println!("None of the {} notices has a backtrace", report.notices);
        return;
    }
    for (i, cluster) in report.clusters.iter().enumerate() {
        println!();
        for line in format_cluster(i, cluster) {
            println!("{line}");
        }
    }
}

async fn print_blame(report: &SummaryReport, config: &Config, root: &Path) -> Result<()> {
    let matcher = config
        .frame_matcher()
        .context("Invalid frame pattern in configuration")?;
    println!();
    for (i, cluster) in report.clusters.iter().enumerate() {
        let Some(index) = matcher.first_project_frame(&cluster.key) else {
            continue;
        };
        let frame = &cluster.key[index];
        match blame_frame(frame, root).await {
            Some(info) => println!("Trace {}: {} {}", i + 1, frame, info.short().dimmed()),
            None => debug!(frame = %frame, "no blame information"),
        }
    }
    Ok(())
}

/// `MM-DD HH:MM` of the first slot's start, and `NOW`
pub fn graph_labels(now: DateTime<Utc>) -> (String, String) {
    let start = now - Duration::seconds(DAY_INTERVAL_SECS * DAY_SLOTS as i64);
    (start.format("%m-%d %H:%M").to_string(), "NOW".to_string())
}

fn write_graph(series: &BucketSeries, now: DateTime<Utc>, path: &Path) -> Result<()> {
    let (left, right) = graph_labels(now);
    let image = render_image(series, &left, &right);
    save_png(&image, path)?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}
