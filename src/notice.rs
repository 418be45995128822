//! Core data types shared by the analysis and rendering modules.
//!
//! Notices (single occurrences of an error), error groups and projects are
//! owned by the event source; everything downstream only reads them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A single frame of a recorded backtrace
#[derive(Debug, Clone, Serialize)]
pub struct StackFrame {
    /// Source file path as reported by the notifier
    pub file_path: String,
    /// Line number in the source file
    pub line_number: u32,
    /// Function or method name (if reported)
    pub function: Option<String>,
}

impl StackFrame {
    /// Create a frame for the given file and line
    pub fn new(file_path: impl Into<String>, line_number: u32) -> Self {
        Self {
            file_path: file_path.into(),
            line_number,
            function: None,
        }
    }

    /// Set the function name for this frame
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }
}

// Frames compare by location only: two notices hitting the same line through
// differently named (e.g. generated) methods still share a cause.
impl PartialEq for StackFrame {
    fn eq(&self, other: &Self) -> bool {
        self.file_path == other.file_path && self.line_number == other.line_number
    }
}

impl Eq for StackFrame {}

impl std::hash::Hash for StackFrame {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.file_path.hash(state);
        self.line_number.hash(state);
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file_path, self.line_number)
    }
}

/// One recorded occurrence of an error
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Exception class (e.g. "ActiveRecord::RecordNotFound")
    pub error_class: String,
    pub error_message: String,
    /// Frames ordered innermost first; empty when no backtrace was recorded
    pub backtrace: Vec<StackFrame>,
    /// Request parameters, when the notifier sent any
    pub params: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Notice {
    /// Create a notice without backtrace or params
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_at,
            error_class: String::new(),
            error_message: String::new(),
            backtrace: Vec::new(),
            params: None,
        }
    }

    /// Set the error class and message
    pub fn with_error(mut self, class: impl Into<String>, message: impl Into<String>) -> Self {
        self.error_class = class.into();
        self.error_message = message.into();
        self
    }

    /// Set the backtrace
    pub fn with_backtrace(mut self, backtrace: Vec<StackFrame>) -> Self {
        self.backtrace = backtrace;
        self
    }

    pub fn has_backtrace(&self) -> bool {
        !self.backtrace.is_empty()
    }
}

/// The persistent identity of a recurring error
#[derive(Debug, Clone, Serialize)]
pub struct ErrorGroup {
    pub id: String,
    pub project_id: u64,
    /// When the error was first seen
    pub created_at: DateTime<Utc>,
    /// When the error was last seen
    pub most_recent: Option<DateTime<Utc>>,
    /// Total number of notices recorded for this error
    pub count: u64,
    pub error_class: String,
    pub error_message: String,
    pub environment: Option<String>,
}

impl ErrorGroup {
    /// One-line description used by the hot/new listings
    pub fn summary_line(&self) -> String {
        format!(
            "id:{} -- first:{} -- {} -- {}",
            self.id,
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.error_class,
            self.error_message
        )
    }

    /// Whether this error belongs to the given environment.
    /// `None` and `"all"` match every environment.
    pub fn matches_environment(&self, environment: Option<&str>) -> bool {
        match environment {
            None | Some("all") => true,
            Some(wanted) => self.environment.as_deref() == Some(wanted),
        }
    }
}

/// A project on the error-monitoring service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
}
