use crate::{Error, Result, auth, headline, resume, selectors};
use async_trait::async_trait;
use keepfresh_browser::{BrowserSession, RetryPolicy};
use keepfresh_core::{Action, Outcome, RunConfig};

/// The operations the pipeline drives, in order.
///
/// The pipeline only ever talks to this trait; the live implementation
/// wraps a browser session, and tests fabricate stage behavior.
#[async_trait]
pub trait Portal: Send {
    async fn sign_in(&mut self) -> Result<Outcome>;
    async fn mutate(&mut self) -> Result<Outcome>;
    async fn sign_out(&mut self) -> Result<Outcome>;
    async fn release(&mut self) -> Result<Outcome>;
}

/// Live portal over one browser session.
pub struct PortalSession {
    session: Option<BrowserSession>,
    config: RunConfig,
}

impl PortalSession {
    pub fn new(session: BrowserSession, config: RunConfig) -> Self {
        Self {
            session: Some(session),
            config,
        }
    }

    fn session(&self) -> Result<&BrowserSession> {
        self.session
            .as_ref()
            .ok_or_else(|| Error::Session("browser session already released".into()))
    }
}

#[async_trait]
impl Portal for PortalSession {
    async fn sign_in(&mut self) -> Result<Outcome> {
        auth::sign_in(self.session()?, &self.config).await
    }

    async fn mutate(&mut self) -> Result<Outcome> {
        let session = self.session()?;
        match self.config.action {
            Action::Resume => resume::refresh_resume(session, &self.config).await,
            Action::Headline => headline::toggle_headline(session, &self.config).await,
        }
    }

    /// Best-effort logout; a portal that hid its logout link this week
    /// is reported as `NotFound` and the run moves on to release.
    async fn sign_out(&mut self) -> Result<Outcome> {
        let session = self.session()?;
        match session
            .find(&selectors::logout_affordances(), RetryPolicy::single_pass())
            .await
        {
            Some(target) => {
                session.click(&target).await?;
                tracing::info!("Logged out");
                Ok(Outcome::Success)
            }
            None => Ok(Outcome::NotFound),
        }
    }

    async fn release(&mut self) -> Result<Outcome> {
        match self.session.take() {
            Some(session) => {
                session.close().await?;
                tracing::info!("Browser session closed");
                Ok(Outcome::Success)
            }
            // Releasing twice is a no-op, not an error.
            None => Ok(Outcome::Success),
        }
    }
}
