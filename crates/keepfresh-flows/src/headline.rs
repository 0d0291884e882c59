use crate::{Result, capture_diagnostics, selectors};
use keepfresh_browser::{BrowserSession, RetryPolicy};
use keepfresh_core::{Outcome, RunConfig};
use std::time::{Duration, Instant};

const MARKER: char = '.';
const VERIFY_POLL: Duration = Duration::from_secs(2);

/// Append the trailing marker if absent, strip it if present.
///
/// Involutive on purpose: consecutive runs undo each other, so the
/// headline only ever oscillates between two known states while the
/// portal still registers an edit each time.
pub fn toggle_marker(text: &str) -> String {
    match text.strip_suffix(MARKER) {
        Some(base) => base.to_string(),
        None => format!("{text}{MARKER}"),
    }
}

/// Open the inline headline editor, write the toggled text back, and
/// confirm the portal recorded it.
pub async fn toggle_headline(session: &BrowserSession, config: &RunConfig) -> Result<Outcome> {
    let policy = RetryPolicy::from_budget(&config.waits);

    let Some(edit) = session.find(&selectors::headline_edit(), policy).await else {
        capture_diagnostics(session, config, "headline").await;
        return Ok(Outcome::NotFound);
    };
    session.click(&edit).await?;

    let Some(field) = session.find(&selectors::headline_input(), policy).await else {
        capture_diagnostics(session, config, "headline").await;
        return Ok(Outcome::NotFound);
    };

    let current = session.read_value(&field).await?;
    let next = toggle_marker(&current);
    tracing::info!("Toggling headline ({} chars)", next.len());

    session.clear_value(&field).await?;
    session.type_into(&field, &next).await?;

    let Some(save) = session.find(&selectors::headline_save(), policy).await else {
        capture_diagnostics(session, config, "headline").await;
        return Ok(Outcome::NotFound);
    };
    session.click(&save).await?;

    verify_saved(session, config, &next).await
}

/// Re-read the rendered headline until it shows the new text or the
/// verify budget runs out. A mismatch is reported, not escalated; the
/// edit may still have landed.
async fn verify_saved(
    session: &BrowserSession,
    config: &RunConfig,
    expected: &str,
) -> Result<Outcome> {
    let deadline = Instant::now() + config.waits.verify_wait;

    loop {
        if let Some(display) = session
            .find(&selectors::headline_display(), RetryPolicy::single_pass())
            .await
        {
            if let Ok(text) = session.read_value(&display).await {
                if text.trim() == expected.trim() {
                    tracing::info!("Headline update confirmed");
                    return Ok(Outcome::Success);
                }
            }
        }

        if Instant::now() >= deadline {
            tracing::warn!("Headline update not confirmed within budget");
            return Ok(Outcome::VerificationFailed);
        }
        tokio::time::sleep(VERIFY_POLL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_appends_marker_when_absent() {
        assert_eq!(toggle_marker("Senior Engineer"), "Senior Engineer.");
    }

    #[test]
    fn test_toggle_strips_marker_when_present() {
        assert_eq!(toggle_marker("Senior Engineer."), "Senior Engineer");
    }

    #[test]
    fn test_toggle_is_involutive() {
        for text in ["Senior Engineer", "Senior Engineer.", "", "X", "X."] {
            assert_eq!(toggle_marker(&toggle_marker(text)), text);
        }
    }

    #[test]
    fn test_toggle_only_touches_the_tail() {
        assert_eq!(toggle_marker("a.b.c"), "a.b.c.");
        assert_eq!(toggle_marker("a.b.c."), "a.b.c");
    }
}
