//! `hot` and `new`: error listings with estimated rates and sparklines.

use anyhow::{bail, Result};
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, warn};

use super::{fetch_errors, Session};
use crate::buckets::bucketize;
use crate::cli::Command;
use crate::frequency::estimate_hourly_rate;
use crate::notice::{ErrorGroup, Notice};
use crate::output::{print_rate_rows, RateRow};
use crate::source::{EventSource, SourceError, NOTICES_PER_PAGE};
use crate::sparkline::render_inline;

/// Slots in the hot/new sparkline: the last hour, minute by minute
const SPARKLINE_SLOTS: usize = 60;
const SPARKLINE_INTERVAL_SECS: i64 = 60;

/// An error with its most recent notices and estimated rate
#[derive(Debug, Clone)]
pub struct RatedError {
    pub error: ErrorGroup,
    pub notices: Vec<Notice>,
    /// Estimated occurrences per hour
    pub rate: f64,
}

/// Fetch the first notice page of every error and estimate its rate.
///
/// Up to `concurrency` fetches run at once. Errors whose notices fail for
/// that error alone (transient failures, a group that is gone) are logged
/// and left out; any other failure aborts.
pub async fn rate_errors(
    source: &dyn EventSource,
    project_id: u64,
    errors: Vec<ErrorGroup>,
    concurrency: usize,
) -> Result<Vec<RatedError>, SourceError> {
    let rated: Vec<Option<RatedError>> = stream::iter(errors)
        .map(|error| async move {
            match source.list_notices(project_id, &error.id, 1).await {
                Ok(notices) => {
                    let rate = estimate_hourly_rate(&notices, NOTICES_PER_PAGE);
                    debug!(error_id = %error.id, notices = notices.len(), rate, "rated error");
                    Ok(Some(RatedError {
                        error,
                        notices,
                        rate,
                    }))
                }
                Err(err) if err.is_item_level() => {
                    warn!(error_id = %error.id, %err, "ignoring error, could not fetch notices");
                    Ok(None)
                }
                Err(err) => Err(err),
            }
        })
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await?;

    Ok(rated.into_iter().flatten().collect())
}

/// Highest rate first
pub fn sort_by_rate(errors: &mut [RatedError]) {
    errors.sort_by(|a, b| b.rate.total_cmp(&a.rate));
}

/// Most recently first seen first
pub fn sort_by_first_seen(errors: &mut [RatedError]) {
    errors.sort_by(|a, b| b.error.created_at.cmp(&a.error.created_at));
}

pub fn run_hot<'a>(session: &'a Session, command: &'a Command) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let Command::Hot { pages } = command else {
            bail!("hot handler called for {}", command.name());
        };
        let mut errors = collect(session, *pages).await?;
        sort_by_rate(&mut errors);
        print(session, &errors)
    })
}

pub fn run_new<'a>(session: &'a Session, command: &'a Command) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let Command::New { pages } = command else {
            bail!("new handler called for {}", command.name());
        };
        let mut errors = collect(session, *pages).await?;
        sort_by_first_seen(&mut errors);
        print(session, &errors)
    })
}

async fn collect(session: &Session, pages: u32) -> Result<Vec<RatedError>> {
    let source = session.source.as_ref();
    let errors = fetch_errors(
        source,
        session.project_id,
        pages,
        session.config.environment_filter(),
    )
    .await?;
    debug!(count = errors.len(), "fetched errors");

    Ok(rate_errors(source, session.project_id, errors, session.config.concurrency).await?)
}

fn print(session: &Session, errors: &[RatedError]) -> Result<()> {
    let rows: Vec<RateRow<'_>> = errors
        .iter()
        .enumerate()
        .map(|(i, rated)| RateRow {
            rank: i + 1,
            rate: rated.rate,
            sparkline: render_inline(&bucketize(
                &rated.notices,
                SPARKLINE_SLOTS,
                SPARKLINE_INTERVAL_SECS,
            )),
            error: &rated.error,
        })
        .collect();

    if session.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print_rate_rows(&rows);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::*;
    use chrono::{Duration, Utc};

    fn source() -> MemorySource {
        let now = Utc::now();
        let mut source = MemorySource {
            error_pages: vec![vec![
                error_group("slow", "production", now - Duration::days(3)),
                error_group("fast", "production", now - Duration::days(9)),
                error_group("broken", "production", now - Duration::days(1)),
            ]],
            transient_failures: vec!["broken".to_string()],
            ..Default::default()
        };
        // full pages: 20 notices an hour apart vs. 20 notices a minute apart
        source.notices.insert("slow".to_string(), notices("slow", 20, 3600));
        source.notices.insert("fast".to_string(), notices("fast", 20, 60));
        source
    }

    #[tokio::test]
    async fn test_rate_errors_skips_transient_failures() {
        let source = source();
        let errors = source.error_pages[0].clone();

        let rated = rate_errors(&source, 1, errors, 10).await.unwrap();
        let mut ids: Vec<&str> = rated.iter().map(|r| r.error.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["fast", "slow"]);
    }

    #[tokio::test]
    async fn test_rate_errors_aborts_on_fatal_failure() {
        let mut source = source();
        source.fatal_failures.push("slow".to_string());
        let errors = source.error_pages[0].clone();

        let err = rate_errors(&source, 1, errors, 2).await.unwrap_err();
        assert!(!err.is_item_level());
    }

    #[tokio::test]
    async fn test_rate_errors_skips_missing_groups() {
        let mut source = source();
        source.missing.push("slow".to_string());
        let errors = source.error_pages[0].clone();

        let rated = rate_errors(&source, 1, errors, 3).await.unwrap();
        let ids: Vec<&str> = rated.iter().map(|r| r.error.id.as_str()).collect();
        assert_eq!(ids, vec!["fast"]);
    }

    #[tokio::test]
    async fn test_rate_errors_with_zero_concurrency() {
        let source = source();
        let errors = vec![source.error_pages[0][0].clone()];
        let rated = rate_errors(&source, 1, errors, 0).await.unwrap();
        assert_eq!(rated.len(), 1);
    }

    #[tokio::test]
    async fn test_hot_sorts_by_rate() {
        let source = source();
        let errors = source.error_pages[0].clone();
        let mut rated = rate_errors(&source, 1, errors, 3).await.unwrap();

        sort_by_rate(&mut rated);
        assert_eq!(rated[0].error.id, "fast");
        assert!(rated[0].rate > rated[1].rate);
    }

    #[tokio::test]
    async fn test_new_sorts_by_first_seen() {
        let source = source();
        let errors = source.error_pages[0].clone();
        let mut rated = rate_errors(&source, 1, errors, 3).await.unwrap();

        sort_by_first_seen(&mut rated);
        assert_eq!(rated[0].error.id, "slow");
        assert_eq!(rated[1].error.id, "fast");
    }

    #[tokio::test]
    async fn test_run_hot_succeeds_with_partial_results() {
        let session = session(source());
        let result = run_hot(&session, &Command::Hot { pages: 1 }).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_run_hot_rejects_other_commands() {
        let session = session(source());
        assert!(run_hot(&session, &Command::List).await.is_err());
    }
}
