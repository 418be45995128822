//! Project name resolution.

use std::collections::HashMap;

use crate::notice::Project;
use crate::source::{EventSource, SourceError};

/// Error types for project resolution
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("Unknown project \"{name}\". Known projects: {}", known.join(", "))]
    Unknown { name: String, known: Vec<String> },

    #[error("Several projects are available, pick one with --project: {}", known.join(", "))]
    Ambiguous { known: Vec<String> },

    #[error("No projects are visible to this API token")]
    NoProjects,

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Name to id lookup, filled from the event source on first use
#[derive(Debug, Default)]
pub struct ProjectCache {
    projects: Option<Vec<Project>>,
}

impl ProjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the project list has been fetched yet
    pub fn is_loaded(&self) -> bool {
        self.projects.is_some()
    }

    async fn load(&mut self, source: &dyn EventSource) -> Result<&[Project], SourceError> {
        if self.projects.is_none() {
            self.projects = Some(source.list_projects().await?);
        }
        Ok(self.projects.as_deref().unwrap_or_default())
    }

    /// Resolve a project selector to an id.
    ///
    /// Numeric selectors are used as ids without a lookup. Without a
    /// selector the account must have exactly one project.
    pub async fn resolve(
        &mut self,
        source: &dyn EventSource,
        selector: Option<&str>,
    ) -> Result<u64, ProjectError> {
        if let Some(id) = selector.and_then(|s| s.trim().parse::<u64>().ok()) {
            return Ok(id);
        }

        let projects = self.load(source).await?;
        let by_name: HashMap<&str, u64> = projects.iter().map(|p| (p.name.as_str(), p.id)).collect();
        let known = || projects.iter().map(|p| p.name.clone()).collect::<Vec<_>>();

        match selector {
            Some(name) => by_name
                .get(name)
                .copied()
                .ok_or_else(|| ProjectError::Unknown {
                    name: name.to_string(),
                    known: known(),
                }),
            None => match projects {
                [] => Err(ProjectError::NoProjects),
                [only] => Ok(only.id),
                _ => Err(ProjectError::Ambiguous { known: known() }),
            },
        }
    }
}
