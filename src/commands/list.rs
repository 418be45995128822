//! `list`: every error of the project, page by page.

use anyhow::{Context, Result};
use futures::future::BoxFuture;

use super::Session;
use crate::cli::Command;
use crate::notice::ErrorGroup;
use crate::output::format_list_line;
use crate::source::EventSource;

pub fn run<'a>(session: &'a Session, _command: &'a Command) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let environment = session.config.environment_filter();
        let total = for_each_page(session.source.as_ref(), session.project_id, |page, errors| {
            eprintln!("Page {page} ----------");
            for error in errors.iter().filter(|e| e.matches_environment(environment)) {
                println!("{}", format_list_line(error));
            }
        })
        .await?;
        tracing::debug!(total, "listed errors");
        Ok(())
    })
}

/// Walk error pages from the first until an empty one, returning how many
/// errors were seen
pub async fn for_each_page<F>(source: &dyn EventSource, project_id: u64, mut visit: F) -> Result<usize>
where
    F: FnMut(u32, &[ErrorGroup]),
{
    let mut total = 0;
    for page in 1.. {
        let errors = source
            .list_errors(project_id, page)
            .await
            .with_context(|| format!("Failed to fetch error page {page}"))?;
        if errors.is_empty() {
            break;
        }
        total += errors.len();
        visit(page, &errors);
    }
    Ok(total)
}
