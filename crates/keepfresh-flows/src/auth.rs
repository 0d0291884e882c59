use crate::{Result, capture_diagnostics, selectors};
use keepfresh_browser::{BrowserSession, RetryPolicy};
use keepfresh_core::{Outcome, RunConfig};
use std::time::{Duration, Instant};

const URL_POLL: Duration = Duration::from_secs(1);

/// Drive the login form and confirm arrival on the profile page.
///
/// After submitting, the flow navigates straight to the profile URL
/// instead of following in-page links; that sidesteps whatever
/// dashboard or security interstitial the portal decides to show that
/// week. Success means the current URL matches the configured
/// logged-in pattern within the auth wait budget.
pub async fn sign_in(session: &BrowserSession, config: &RunConfig) -> Result<Outcome> {
    let waits = &config.waits;
    let policy = RetryPolicy::from_budget(waits);

    session
        .goto(config.urls.login.as_str(), waits.auth_wait)
        .await?;

    dismiss_interstitials(session).await;

    let Some(user_field) = session.find(&selectors::username_field(), policy).await else {
        capture_diagnostics(session, config, "auth").await;
        return Ok(Outcome::AuthFailed);
    };
    session
        .type_into(&user_field, &config.credentials.username)
        .await?;

    let Some(pass_field) = session.find(&selectors::password_field(), policy).await else {
        capture_diagnostics(session, config, "auth").await;
        return Ok(Outcome::AuthFailed);
    };
    session
        .type_into(&pass_field, &config.credentials.password)
        .await?;

    let Some(submit) = session.find(&selectors::login_submit(), policy).await else {
        capture_diagnostics(session, config, "auth").await;
        return Ok(Outcome::AuthFailed);
    };
    session.click(&submit).await?;
    tracing::info!("Login credentials submitted");

    tokio::time::sleep(waits.submit_settle).await;
    dismiss_interstitials(session).await;

    tracing::info!("Navigating directly to the profile page");
    session
        .goto(config.urls.profile.as_str(), waits.auth_wait)
        .await?;

    let deadline = Instant::now() + waits.auth_wait;
    loop {
        let url = session.current_url().await?;
        if config.urls.logged_in_pattern.is_match(&url) {
            tracing::info!("Landed on profile page: {url}");
            return Ok(Outcome::Success);
        }
        if Instant::now() >= deadline {
            tracing::warn!("Profile page never appeared; current URL: {url}");
            capture_diagnostics(session, config, "auth").await;
            return Ok(Outcome::AuthFailed);
        }
        tokio::time::sleep(URL_POLL).await;
    }
}

/// Click away whatever transient screens are present. Absence of any
/// of them is the normal case and not an error.
async fn dismiss_interstitials(session: &BrowserSession) {
    for query in selectors::interstitials() {
        if let Some(target) = session.find(&query, RetryPolicy::single_pass()).await {
            match session.click(&target).await {
                Ok(()) => tracing::debug!("Dismissed interstitial '{}'", query.label),
                Err(err) => {
                    tracing::debug!("Interstitial '{}' would not dismiss: {err}", query.label)
                }
            }
        }
    }
}
