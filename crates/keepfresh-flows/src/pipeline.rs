use crate::portal::{Portal, PortalSession};
use crate::{Result, teardown};
use keepfresh_browser::SessionLauncher;
use keepfresh_core::{Outcome, RunConfig, RunReport, Stage};

/// Execute one full run: launch, sign in, mutate, tear down.
///
/// Launch failure is the only fatal path; there is no session to tear
/// down yet, so the report is returned immediately. Every later stage
/// failure is recorded and the run continues to teardown.
pub async fn run(config: &RunConfig) -> RunReport {
    let mut report = RunReport::default();

    let launcher = SessionLauncher::new(config.browser.clone());
    let session = match launcher.launch().await {
        Ok(session) => session,
        Err(err) => {
            stage_boundary(Stage::Launch, Err(err.into()), &mut report);
            return report;
        }
    };
    report.record(Stage::Launch, Outcome::Success, None);

    let mut portal = PortalSession::new(session, config.clone());
    drive(&mut portal, &mut report).await;
    report
}

/// The pipeline over an already-launched portal.
///
/// This is the stage boundary the error-handling design calls for:
/// stage errors become logged, stage-tagged failure entries here, and
/// never cross into the next stage. Teardown always runs.
pub async fn drive(portal: &mut dyn Portal, report: &mut RunReport) {
    let auth = stage_boundary(Stage::Auth, portal.sign_in().await, report);

    if auth == Outcome::Success {
        stage_boundary(Stage::Mutate, portal.mutate().await, report);
    } else {
        tracing::warn!("Skipping profile mutation: authentication did not succeed");
        report.record(
            Stage::Mutate,
            Outcome::Skipped,
            Some("authentication did not succeed".into()),
        );
    }

    teardown::run_teardown(portal, report).await;
}

/// Convert a stage result into a report entry, mapping errors to the
/// stage's failure outcome. `VerificationFailed` doubles as the generic
/// "stage threw" outcome for non-auth stages: the stage did not
/// verifiably complete.
pub(crate) fn stage_boundary(
    stage: Stage,
    result: Result<Outcome>,
    report: &mut RunReport,
) -> Outcome {
    match result {
        Ok(outcome) => {
            if outcome.is_failure() {
                tracing::warn!("{stage}: {outcome}");
            } else {
                tracing::info!("{stage}: {outcome}");
            }
            report.record(stage, outcome, None);
            outcome
        }
        Err(err) => {
            let outcome = match stage {
                Stage::Auth => Outcome::AuthFailed,
                // No usable browser / no usable logout affordance
                Stage::Launch | Stage::Logout => Outcome::NotFound,
                _ => Outcome::VerificationFailed,
            };
            tracing::error!("{stage}: {err}");
            report.record(stage, outcome, Some(err.to_string()));
            outcome
        }
    }
}
