pub mod auth;
pub mod error;
pub mod headline;
pub mod pipeline;
pub mod portal;
pub mod resume;
pub mod selectors;
pub mod teardown;

pub use error::{Error, Result};
pub use pipeline::run;
pub use portal::{Portal, PortalSession};

use keepfresh_browser::BrowserSession;
use keepfresh_core::RunConfig;

/// Best-effort diagnostics at the point a locator gave up; failure to
/// capture is itself only logged.
pub(crate) async fn capture_diagnostics(session: &BrowserSession, config: &RunConfig, stage: &str) {
    if let Err(err) = session
        .capture_diagnostics(stage, &config.artifacts_dir)
        .await
    {
        tracing::warn!("Could not capture diagnostics for '{stage}': {err}");
    }
}
