use crate::{Result, capture_diagnostics, selectors};
use keepfresh_browser::{BrowserSession, RetryPolicy};
use keepfresh_core::{Outcome, RunConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The lower profile sections render lazily; give them a moment after
/// each scroll.
const LAZY_LOAD_SETTLE: Duration = Duration::from_secs(2);

/// Re-submit the resume file so the portal refreshes its upload date.
///
/// Verification is best-effort: the portal shows no reliable
/// confirmation element, so success is assumed once the settle interval
/// after submission elapses.
pub async fn refresh_resume(session: &BrowserSession, config: &RunConfig) -> Result<Outcome> {
    let Some(resume) = usable_resume_file(config.resume_path.as_deref()) else {
        return Ok(Outcome::Skipped);
    };
    let resume = resume?;

    // Walk the page so the upload section actually exists in the DOM.
    session.scroll_to_bottom().await?;
    tokio::time::sleep(LAZY_LOAD_SETTLE).await;
    session.scroll_to_top().await?;
    tokio::time::sleep(LAZY_LOAD_SETTLE).await;

    let policy = RetryPolicy::from_budget(&config.waits);
    let Some(input) = session.find(&selectors::resume_upload_input(), policy).await else {
        capture_diagnostics(session, config, "resume").await;
        return Ok(Outcome::NotFound);
    };

    session.force_interactable(&input).await?;
    session.set_file_input(&input, &resume).await?;
    tracing::info!("Resume file submitted: {}", resume.display());

    // Let the upload sync server-side before the session goes away.
    tokio::time::sleep(config.waits.upload_settle).await;
    tracing::info!("Profile resume refreshed");
    Ok(Outcome::Success)
}

/// Absolute path of the configured resume file, or `None` when the
/// precondition is missing and the stage should be skipped.
fn usable_resume_file(configured: Option<&Path>) -> Option<Result<PathBuf>> {
    let path = match configured {
        Some(path) => path,
        None => {
            tracing::info!("No resume path configured; skipping resume refresh");
            return None;
        }
    };

    if !path.exists() {
        tracing::info!(
            "Resume file not found at {}; skipping resume refresh",
            path.display()
        );
        return None;
    }

    Some(
        std::fs::canonicalize(path)
            .map_err(|e| crate::Error::Browser(keepfresh_browser::Error::Io(e))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_skips() {
        assert!(usable_resume_file(Some(Path::new("/nonexistent/Resume.pdf"))).is_none());
    }

    #[test]
    fn test_unconfigured_path_skips() {
        assert!(usable_resume_file(None).is_none());
    }

    #[test]
    fn test_existing_file_resolves_to_absolute_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.4").unwrap();

        let resolved = usable_resume_file(Some(file.path())).unwrap().unwrap();
        assert!(resolved.is_absolute());
    }
}
