//! Report generators and their dispatch table.
//!
//! Every command is an independent, read-only report with the same handler
//! signature; `main` picks one by name and turns its outcome into an exit
//! code.

pub mod hot;
pub mod list;
pub mod open;
pub mod summary;

use anyhow::{anyhow, Context, Result};
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::debug;

use crate::cli::Command;
use crate::config::Config;
use crate::notice::ErrorGroup;
use crate::projects::ProjectCache;
use crate::source::{EventSource, SourceError};

/// Everything a command needs: the event source, settings and the project
pub struct Session {
    pub source: Arc<dyn EventSource>,
    pub config: Config,
    pub project_id: u64,
    pub json: bool,
}

impl Session {
    /// Resolve the configured project and build a session around it
    pub async fn connect(
        source: Arc<dyn EventSource>,
        config: Config,
        projects: &mut ProjectCache,
        json: bool,
    ) -> Result<Self> {
        let project_id = projects
            .resolve(source.as_ref(), config.project.as_deref())
            .await
            .context("Failed to select a project")?;
        debug!(project_id, "resolved project");

        Ok(Self {
            source,
            config,
            project_id,
            json,
        })
    }
}

/// Uniform command handler signature
pub type Handler = for<'a> fn(&'a Session, &'a Command) -> BoxFuture<'a, Result<()>>;

/// A named entry of the dispatch table
pub struct CommandEntry {
    pub name: &'static str,
    pub handler: Handler,
}

pub static COMMANDS: &[CommandEntry] = &[
    CommandEntry {
        name: "hot",
        handler: hot::run_hot,
    },
    CommandEntry {
        name: "new",
        handler: hot::run_new,
    },
    CommandEntry {
        name: "list",
        handler: list::run,
    },
    CommandEntry {
        name: "summary",
        handler: summary::run,
    },
    CommandEntry {
        name: "open",
        handler: open::run,
    },
];

/// Look up the handler for a command name
pub fn handler_for(name: &str) -> Option<Handler> {
    COMMANDS.iter().find(|c| c.name == name).map(|c| c.handler)
}

/// Run a command through the dispatch table
pub async fn dispatch(session: &Session, command: &Command) -> Result<()> {
    let handler =
        handler_for(command.name()).ok_or_else(|| anyhow!("Unknown command {}", command.name()))?;
    handler(session, command).await
}

/// Fetch `pages` pages of errors, keeping those of the wanted environment
pub async fn fetch_errors(
    source: &dyn EventSource,
    project_id: u64,
    pages: u32,
    environment: Option<&str>,
) -> Result<Vec<ErrorGroup>, SourceError> {
    let mut errors = Vec::new();
    for page in 1..=pages {
        let batch = source.list_errors(project_id, page).await?;
        if batch.is_empty() {
            break;
        }
        errors.extend(batch);
    }
    errors.retain(|e| e.matches_environment(environment));
    Ok(errors)
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory event source for command tests.

    use super::*;
    use crate::notice::{Notice, Project};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct MemorySource {
        pub projects: Vec<Project>,
        pub error_pages: Vec<Vec<ErrorGroup>>,
        pub notices: HashMap<String, Vec<Notice>>,
        pub transient_failures: Vec<String>,
        pub fatal_failures: Vec<String>,
        /// Groups whose notices answer 404
        pub missing: Vec<String>,
    }

    #[async_trait]
    impl EventSource for MemorySource {
        async fn list_projects(&self) -> Result<Vec<Project>, SourceError> {
            Ok(self.projects.clone())
        }

        async fn list_errors(
            &self,
            _project_id: u64,
            page: u32,
        ) -> Result<Vec<ErrorGroup>, SourceError> {
            Ok(self
                .error_pages
                .get(page as usize - 1)
                .cloned()
                .unwrap_or_default())
        }

        async fn list_notices(
            &self,
            _project_id: u64,
            error_id: &str,
            page: u32,
        ) -> Result<Vec<Notice>, SourceError> {
            if self.transient_failures.iter().any(|id| id == error_id) {
                return Err(SourceError::Server {
                    url: format!("memory://{error_id}"),
                    status: 500,
                });
            }
            if self.fatal_failures.iter().any(|id| id == error_id) {
                return Err(SourceError::Unauthorized { status: 401 });
            }
            if self.missing.iter().any(|id| id == error_id) {
                return Err(SourceError::NotFound(format!("groups/{error_id}/notices")));
            }
            let all = self.notices.get(error_id).cloned().unwrap_or_default();
            let per_page = crate::source::NOTICES_PER_PAGE;
            Ok(all
                .into_iter()
                .skip((page as usize - 1) * per_page)
                .take(per_page)
                .collect())
        }
    }

    pub fn error_group(id: &str, environment: &str, created_at: DateTime<Utc>) -> ErrorGroup {
        ErrorGroup {
            id: id.to_string(),
            project_id: 1,
            created_at,
            most_recent: None,
            count: 100,
            error_class: "RuntimeError".to_string(),
            error_message: format!("error {id}"),
            environment: Some(environment.to_string()),
        }
    }

    /// `count` notices spaced `spacing_secs` apart, newest first
    pub fn notices(prefix: &str, count: usize, spacing_secs: i64) -> Vec<Notice> {
        let now = Utc::now();
        (0..count)
            .map(|i| {
                Notice::new(
                    format!("{prefix}-{i}"),
                    now - Duration::seconds(spacing_secs * i as i64 + 1),
                )
            })
            .collect()
    }

    pub fn session(source: MemorySource) -> Session {
        Session {
            source: Arc::new(source),
            config: Config::default(),
            project_id: 1,
            json: false,
        }
    }
}
