//! Backtrace clustering.
//!
//! Notices of the same error group often reach the failing line through
//! different call paths. Grouping them by a prefix of their backtrace shows
//! which paths actually matter:
//! - Classification of frames into project code vs. vendored/library code
//! - Adaptive choice of the compare depth from the first project frame
//! - Grouping by structurally identical truncated stacks

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

use crate::notice::{Notice, StackFrame};

/// Frames compared past the average first project frame
pub const DEFAULT_COMPARE_MARGIN: usize = 3;

/// Markers Airbrake notifiers substitute for the application root
pub const DEFAULT_PROJECT_FRAME_PATTERNS: &[&str] = &[r"^/PROJECT_ROOT/", r"^\[PROJECT_ROOT\]"];

/// Paths below the project root that still hold third-party code
pub const DEFAULT_LIBRARY_FRAME_PATTERNS: &[&str] = &[r"/vendor/", r"/node_modules/"];

const PROJECT_ROOT_MARKERS: &[&str] = &["/PROJECT_ROOT/", "[PROJECT_ROOT]/"];

// ============================================================================
// Frame Classification
// ============================================================================

/// Decides whether a frame belongs to the application or to a dependency
#[derive(Debug, Clone)]
pub struct ProjectFrameMatcher {
    project: Vec<Regex>,
    library: Vec<Regex>,
}

impl ProjectFrameMatcher {
    /// Build a matcher from regex patterns matched against the file path.
    /// A frame is project code if it matches a `project` pattern and no
    /// `library` pattern.
    pub fn new<S: AsRef<str>>(project: &[S], library: &[S]) -> Result<Self, regex::Error> {
        Ok(Self {
            project: compile(project)?,
            library: compile(library)?,
        })
    }

    /// Check if a frame is project code
    pub fn is_project_frame(&self, frame: &StackFrame) -> bool {
        let path = frame.file_path.as_str();
        self.project.iter().any(|p| p.is_match(path)) && !self.library.iter().any(|p| p.is_match(path))
    }

    /// Index of the first project frame in a backtrace
    pub fn first_project_frame(&self, backtrace: &[StackFrame]) -> Option<usize> {
        backtrace.iter().position(|f| self.is_project_frame(f))
    }
}

impl ProjectFrameMatcher {
    /// Matcher for the built-in project root markers and library paths
    pub fn builtin() -> Result<Self, regex::Error> {
        Self::new(DEFAULT_PROJECT_FRAME_PATTERNS, DEFAULT_LIBRARY_FRAME_PATTERNS)
    }
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|p| Regex::new(p.as_ref())).collect()
}

/// Render a frame with the project root marker replaced by `./`
pub fn display_frame(frame: &StackFrame) -> String {
    let rendered = frame.to_string();
    PROJECT_ROOT_MARKERS
        .iter()
        .find_map(|marker| rendered.strip_prefix(marker))
        .map(|rest| format!("./{rest}"))
        .unwrap_or(rendered)
}

// ============================================================================
// Compare Depth
// ============================================================================

/// Average index of the first project frame across notices.
///
/// Notices without any project frame are left out of the average; when no
/// notice has one (or there are no notices) the result is 0.
pub fn average_first_project_line<'a>(
    notices: impl IntoIterator<Item = &'a Notice>,
    matcher: &ProjectFrameMatcher,
) -> usize {
    let indices: Vec<usize> = notices
        .into_iter()
        .filter_map(|n| matcher.first_project_frame(&n.backtrace))
        .collect();
    if indices.is_empty() {
        return 0;
    }
    indices.iter().sum::<usize>() / indices.len()
}

/// Compare depth derived from where project code starts, plus a margin
pub fn adaptive_compare_depth<'a>(
    notices: impl IntoIterator<Item = &'a Notice>,
    matcher: &ProjectFrameMatcher,
    margin: usize,
) -> usize {
    average_first_project_line(notices, matcher) + margin
}

// ============================================================================
// Clustering
// ============================================================================

/// Notices whose truncated backtraces are identical
#[derive(Debug, Clone, Serialize)]
pub struct BacktraceCluster {
    /// The shared leading frames
    pub key: Vec<StackFrame>,
    /// Notices in the order they were seen
    pub members: Vec<Notice>,
}

impl BacktraceCluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Options for [`cluster`]
#[derive(Debug, Clone)]
pub struct ClusterOptions {
    /// Fixed compare depth; computed from the notices when `None`
    pub compare_depth: Option<usize>,
    /// Margin added to the average first project frame
    pub margin: usize,
    pub matcher: ProjectFrameMatcher,
}

impl ClusterOptions {
    /// Adaptive depth with the default margin
    pub fn new(matcher: ProjectFrameMatcher) -> Self {
        Self {
            compare_depth: None,
            margin: DEFAULT_COMPARE_MARGIN,
            matcher,
        }
    }
}

/// Group notices by their first `compare_depth + 1` frames.
///
/// Notices without a backtrace are skipped. Clusters come back in the order
/// their first member was seen; use [`sort_for_display`] to rank them.
pub fn cluster(notices: &[Notice], options: &ClusterOptions) -> Vec<BacktraceCluster> {
    let traced: Vec<&Notice> = notices.iter().filter(|n| n.has_backtrace()).collect();

    let depth = options.compare_depth.unwrap_or_else(|| {
        adaptive_compare_depth(traced.iter().copied(), &options.matcher, options.margin)
    });

    let mut index: HashMap<&[StackFrame], usize> = HashMap::new();
    let mut clusters: Vec<BacktraceCluster> = Vec::new();

    for notice in traced {
        let end = (depth + 1).min(notice.backtrace.len());
        let key = &notice.backtrace[..end];
        match index.get(key) {
            Some(&i) => clusters[i].members.push(notice.clone()),
            None => {
                index.insert(key, clusters.len());
                clusters.push(BacktraceCluster {
                    key: key.to_vec(),
                    members: vec![notice.clone()],
                });
            }
        }
    }

    clusters
}

/// Largest clusters first; equal sizes keep their first-seen order
pub fn sort_for_display(clusters: &mut [BacktraceCluster]) {
    clusters.sort_by(|a, b| b.len().cmp(&a.len()));
}

// ============================================================================
// Tests
// ============================================================================
