//! Airbrake API v4 event source.
//!
//! Authenticates with a user or project API key passed as the `key` query
//! parameter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::debug;

use super::{EventSource, SourceError, ERRORS_PER_PAGE, NOTICES_PER_PAGE};
use crate::notice::{ErrorGroup, Notice, Project, StackFrame};

/// Airbrake API endpoint
pub const DEFAULT_API_URL: &str = "https://api.airbrake.io/api/v4";

/// Airbrake client
pub struct AirbrakeSource {
    /// HTTP client
    client: Client,
    /// API base URL without trailing slash
    base_url: String,
    /// API key
    token: String,
}

impl AirbrakeSource {
    /// Create a new client with the given request timeout
    pub fn new(base_url: &str, token: String, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("airbrake-tools/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Unreachable {
                url: base_url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Full URL for an API path
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let url = self.url(path);
        debug!(%url, ?query, "GET");

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.token.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|e| request_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(&url, status));
        }

        let body = response.text().await.map_err(|e| request_error(&url, e))?;
        serde_json::from_str(&body).map_err(|e| SourceError::InvalidResponse {
            url,
            message: e.to_string(),
        })
    }
}

fn request_error(url: &str, error: reqwest::Error) -> SourceError {
    if error.is_timeout() {
        SourceError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_decode() || error.is_body() {
        SourceError::InvalidResponse {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else if error.is_connect() || error.is_builder() {
        SourceError::Unreachable {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        SourceError::Interrupted {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

fn status_error(url: &str, status: StatusCode) -> SourceError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SourceError::Unauthorized {
            status: status.as_u16(),
        },
        StatusCode::NOT_FOUND => SourceError::NotFound(url.to_string()),
        StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimited,
        _ => SourceError::Server {
            url: url.to_string(),
            status: status.as_u16(),
        },
    }
}

fn page_query(page: u32, limit: usize) -> Vec<(&'static str, String)> {
    vec![("page", page.to_string()), ("limit", limit.to_string())]
}

#[async_trait]
impl EventSource for AirbrakeSource {
    async fn list_projects(&self) -> Result<Vec<Project>, SourceError> {
        let response: ProjectsResponse = self.get("projects", &[]).await?;
        Ok(response.projects.into_iter().map(Project::from).collect())
    }

    async fn list_errors(
        &self,
        project_id: u64,
        page: u32,
    ) -> Result<Vec<ErrorGroup>, SourceError> {
        let path = format!("projects/{project_id}/groups");
        let response: GroupsResponse = self.get(&path, &page_query(page, ERRORS_PER_PAGE)).await?;
        Ok(response
            .groups
            .into_iter()
            .map(|g| g.into_error_group(project_id))
            .collect())
    }

    async fn list_notices(
        &self,
        project_id: u64,
        error_id: &str,
        page: u32,
    ) -> Result<Vec<Notice>, SourceError> {
        let path = format!("projects/{project_id}/groups/{error_id}/notices");
        let response: NoticesResponse =
            self.get(&path, &page_query(page, NOTICES_PER_PAGE)).await?;
        Ok(response.notices.into_iter().map(Notice::from).collect())
    }
}

// API types

/// Ids arrive as numbers or strings depending on the endpoint
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

#[derive(Debug, Deserialize)]
struct ProjectsResponse {
    #[serde(default)]
    projects: Vec<ProjectBody>,
}

#[derive(Debug, Deserialize)]
struct ProjectBody {
    id: u64,
    name: String,
}

impl From<ProjectBody> for Project {
    fn from(body: ProjectBody) -> Self {
        Project {
            id: body.id,
            name: body.name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GroupsResponse {
    #[serde(default)]
    groups: Vec<GroupBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupBody {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(default)]
    errors: Vec<ErrorBody>,
    #[serde(default)]
    context: ContextBody,
    created_at: DateTime<Utc>,
    #[serde(default)]
    last_notice_at: Option<DateTime<Utc>>,
    #[serde(default)]
    notice_count: u64,
}

impl GroupBody {
    fn into_error_group(self, project_id: u64) -> ErrorGroup {
        let first = self.errors.into_iter().next().unwrap_or_default();
        ErrorGroup {
            id: self.id,
            project_id,
            created_at: self.created_at,
            most_recent: self.last_notice_at,
            count: self.notice_count,
            error_class: first.error_type,
            error_message: first.message,
            environment: self.context.environment,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NoticesResponse {
    #[serde(default)]
    notices: Vec<NoticeBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoticeBody {
    #[serde(deserialize_with = "id_string")]
    id: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    errors: Vec<ErrorBody>,
    #[serde(default)]
    params: Option<serde_json::Map<String, serde_json::Value>>,
}

impl From<NoticeBody> for Notice {
    fn from(body: NoticeBody) -> Self {
        let first = body.errors.into_iter().next().unwrap_or_default();
        let backtrace = first
            .backtrace
            .into_iter()
            .map(|frame| {
                let base = StackFrame::new(frame.file, frame.line);
                match frame.function {
                    Some(function) if !function.is_empty() => base.with_function(function),
                    _ => base,
                }
            })
            .collect();

        Notice {
            id: body.id,
            created_at: body.created_at,
            error_class: first.error_type,
            error_message: first.message,
            backtrace,
            params: body.params.filter(|p| !p.is_empty()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type", default)]
    error_type: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    backtrace: Vec<FrameBody>,
}

#[derive(Debug, Deserialize)]
struct FrameBody {
    #[serde(default)]
    file: String,
    #[serde(default)]
    line: u32,
    #[serde(default)]
    function: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContextBody {
    #[serde(default)]
    environment: Option<String>,
}
