//! `open`: show an error in the Airbrake web UI.

use anyhow::{anyhow, bail, Result};
use futures::future::BoxFuture;
use tracing::{debug, warn};

use super::Session;
use crate::cli::Command;

/// Browser URL of an error, or of one of its notices
pub fn error_url(subdomain: &str, project_id: u64, error_id: &str, notice_id: Option<&str>) -> String {
    let mut url = format!("https://{subdomain}.airbrake.io/projects/{project_id}/groups/{error_id}");
    if let Some(notice_id) = notice_id {
        url.push_str(&format!("/notices/{notice_id}"));
    }
    url
}

/// Platform command that opens a URL in the default browser
fn opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

pub fn run<'a>(session: &'a Session, command: &'a Command) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let Command::Open {
            error_id,
            notice_id,
        } = command
        else {
            bail!("open handler called for {}", command.name());
        };

        let subdomain = session.config.subdomain.as_deref().ok_or_else(|| {
            anyhow!(
                "No Airbrake subdomain configured. Pass --subdomain, set AIRBRAKE_SUBDOMAIN, \
                 or add `subdomain` to the config file"
            )
        })?;

        let url = error_url(subdomain, session.project_id, error_id, notice_id.as_deref());
        println!("{url}");

        match tokio::process::Command::new(opener()).arg(&url).status().await {
            Ok(status) if status.success() => debug!(%url, "opened browser"),
            Ok(status) => warn!(%status, "{} exited unsuccessfully", opener()),
            Err(err) => warn!(%err, "Could not run {}", opener()),
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::*;

    #[test]
    fn test_error_url() {
        assert_eq!(
            error_url("acme", 12, "345", None),
            "https://acme.airbrake.io/projects/12/groups/345"
        );
    }

    #[test]
    fn test_error_url_with_notice() {
        assert_eq!(
            error_url("acme", 12, "345", Some("678")),
            "https://acme.airbrake.io/projects/12/groups/345/notices/678"
        );
    }

    #[tokio::test]
    async fn test_open_requires_subdomain() {
        let session = session(MemorySource::default());
        let command = Command::Open {
            error_id: "345".to_string(),
            notice_id: None,
        };
        let err = run(&session, &command).await.unwrap_err();
        assert!(err.to_string().contains("subdomain"));
    }
}
