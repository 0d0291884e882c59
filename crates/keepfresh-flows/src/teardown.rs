use crate::pipeline::stage_boundary;
use crate::portal::Portal;
use keepfresh_core::{RunReport, Stage};

/// Unconditional cleanup: attempt logout, then release the browser.
///
/// Both steps are individually fault-tolerant. Logout is awaited to
/// completion before release starts, and release runs no matter what
/// logout did; a failure in either is recorded and logged, never
/// propagated.
pub async fn run_teardown(portal: &mut dyn Portal, report: &mut RunReport) {
    report.teardown_attempted = true;

    let logout = portal.sign_out().await;
    stage_boundary(Stage::Logout, logout, report);

    let release = portal.release().await;
    stage_boundary(Stage::Release, release, report);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Result};
    use async_trait::async_trait;
    use keepfresh_core::Outcome;
    use std::sync::{Arc, Mutex};

    struct FlakyPortal {
        calls: Arc<Mutex<Vec<&'static str>>>,
        logout_fails: bool,
        release_fails: bool,
    }

    #[async_trait]
    impl Portal for FlakyPortal {
        async fn sign_in(&mut self) -> Result<Outcome> {
            self.calls.lock().unwrap().push("sign_in");
            Ok(Outcome::Success)
        }

        async fn mutate(&mut self) -> Result<Outcome> {
            self.calls.lock().unwrap().push("mutate");
            Ok(Outcome::Success)
        }

        async fn sign_out(&mut self) -> Result<Outcome> {
            self.calls.lock().unwrap().push("sign_out");
            if self.logout_fails {
                Err(Error::Session("logout blew up".into()))
            } else {
                Ok(Outcome::Success)
            }
        }

        async fn release(&mut self) -> Result<Outcome> {
            self.calls.lock().unwrap().push("release");
            if self.release_fails {
                Err(Error::Session("release blew up".into()))
            } else {
                Ok(Outcome::Success)
            }
        }
    }

    #[tokio::test]
    async fn test_release_still_runs_when_logout_fails() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut portal = FlakyPortal {
            calls: calls.clone(),
            logout_fails: true,
            release_fails: false,
        };
        let mut report = RunReport::default();

        run_teardown(&mut portal, &mut report).await;

        assert_eq!(*calls.lock().unwrap(), vec!["sign_out", "release"]);
        assert!(report.teardown_attempted);
    }

    #[tokio::test]
    async fn test_logout_always_precedes_release() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut portal = FlakyPortal {
            calls: calls.clone(),
            logout_fails: false,
            release_fails: false,
        };
        let mut report = RunReport::default();

        run_teardown(&mut portal, &mut report).await;

        assert_eq!(*calls.lock().unwrap(), vec!["sign_out", "release"]);
    }

    #[tokio::test]
    async fn test_release_failure_is_contained() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut portal = FlakyPortal {
            calls: calls.clone(),
            logout_fails: true,
            release_fails: true,
        };
        let mut report = RunReport::default();

        // Must not panic or propagate; both failures end up in the report.
        run_teardown(&mut portal, &mut report).await;

        assert_eq!(report.failure_count(), 2);
        assert!(report.teardown_attempted);
    }
}
