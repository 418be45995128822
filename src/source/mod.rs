//! Event source abstraction.
//!
//! Commands only talk to the error-monitoring service through the
//! [`EventSource`] trait, so the reports can run against Airbrake or against
//! an in-memory source in tests.

pub mod airbrake;

use async_trait::async_trait;

use crate::notice::{ErrorGroup, Notice, Project};

/// Number of notices requested per page
pub const NOTICES_PER_PAGE: usize = 20;

/// Number of error groups requested per page
pub const ERRORS_PER_PAGE: usize = 20;

/// Error types for event source operations
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Authentication failed (HTTP {status}). Check your API token.")]
    Unauthorized { status: u16 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cannot reach {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("Server error from {url}: HTTP {status}")]
    Server { url: String, status: u16 },

    #[error("Rate limited by the API. Please wait and try again.")]
    RateLimited,

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    #[error("Request to {url} was interrupted: {message}")]
    Interrupted { url: String, message: String },
}

impl SourceError {
    /// Whether the failure only affects the item being fetched.
    ///
    /// Transient failures are skipped by batch operations; everything else
    /// (bad credentials, unknown project, no connectivity) aborts the run.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SourceError::Server { .. }
                | SourceError::RateLimited
                | SourceError::Timeout { .. }
                | SourceError::InvalidResponse { .. }
                | SourceError::Interrupted { .. }
        )
    }

    /// Whether a batch over many error groups may drop the one item and go on.
    ///
    /// Besides transient failures this covers a group that disappeared
    /// between listing and fetching its notices.
    pub fn is_item_level(&self) -> bool {
        self.is_transient() || matches!(self, SourceError::NotFound(_))
    }
}

/// Read access to an error-monitoring service
#[async_trait]
pub trait EventSource: Send + Sync {
    /// All projects visible to the configured token
    async fn list_projects(&self) -> Result<Vec<Project>, SourceError>;

    /// One page (1-based) of error groups, most recently seen first
    async fn list_errors(&self, project_id: u64, page: u32)
        -> Result<Vec<ErrorGroup>, SourceError>;

    /// One page (1-based) of notices for an error group, newest first
    async fn list_notices(
        &self,
        project_id: u64,
        error_id: &str,
        page: u32,
    ) -> Result<Vec<Notice>, SourceError>;
}
