//! airbrake-tools - Power tools for Airbrake
//!
//! This library provides the analysis behind the `airbrake-tools` CLI:
//! hourly rate estimation, backtrace clustering, time-bucket trends with
//! sparkline and PNG rendering, and the Airbrake event source.

pub mod backtrace;
pub mod blame;
pub mod buckets;
pub mod cli;
pub mod commands;
pub mod config;
pub mod frequency;
pub mod graph;
pub mod notice;
pub mod output;
pub mod projects;
pub mod source;
pub mod sparkline;

// Re-export commonly used types
pub use backtrace::{cluster, BacktraceCluster, ClusterOptions, ProjectFrameMatcher};
pub use buckets::{bucketize, BucketSeries};
pub use cli::{Cli, Command};
pub use config::Config;
pub use frequency::estimate_hourly_rate;
pub use notice::{ErrorGroup, Notice, Project, StackFrame};
pub use source::{EventSource, SourceError};
