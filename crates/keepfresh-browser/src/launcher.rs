use crate::chrome_finder::ChromeFinder;
use crate::profile::ScratchProfile;
use crate::session::BrowserSession;
use crate::{Error, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::Handler;
use chromiumoxide::page::Page;
use futures::StreamExt;
use keepfresh_core::BrowserOptions;
use std::path::PathBuf;

/// Starts a controlled browser configured for unattended execution.
///
/// One launch attempt with the configured binary (or chromiumoxide's
/// own discovery); on failure, a single fallback resolves a compatible
/// binary through the full `ChromeFinder` scan and retries once. A
/// second failure is fatal.
pub struct SessionLauncher {
    options: BrowserOptions,
}

impl SessionLauncher {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    pub async fn launch(&self) -> Result<BrowserSession> {
        let profile = match &self.options.profile_dir {
            Some(dir) => ScratchProfile::rooted(dir.clone())?,
            None => ScratchProfile::ephemeral()?,
        };

        match self
            .attempt(self.options.chrome_path.clone(), &profile)
            .await
        {
            Ok((browser, page, handler_task)) => {
                Ok(BrowserSession::assemble(browser, page, handler_task, profile))
            }
            Err(first) => {
                tracing::warn!(
                    "Browser launch failed ({first}); resolving a compatible binary and retrying once"
                );
                let binary = ChromeFinder::new(None).find().map_err(|scan| {
                    Error::Launch(format!("{first}; fallback resolution failed: {scan}"))
                })?;

                let (browser, page, handler_task) = self
                    .attempt(Some(binary), &profile)
                    .await
                    .map_err(|second| {
                        Error::Launch(format!("fallback launch failed: {second}"))
                    })?;
                Ok(BrowserSession::assemble(browser, page, handler_task, profile))
            }
        }
    }

    async fn attempt(
        &self,
        executable: Option<PathBuf>,
        profile: &ScratchProfile,
    ) -> Result<(Browser, Page, tokio::task::JoinHandle<()>)> {
        let config = self.build_config(executable, profile)?;

        let (browser, handler) = Browser::launch(config).await?;

        // The handler task must run before any further CDP command can
        // complete.
        let handler_task = spawn_handler(handler);

        let page = match browser.pages().await?.first() {
            Some(page) => page.clone(),
            None => browser.new_page("about:blank").await?,
        };

        tracing::info!("Browser session ready");
        Ok((browser, page, handler_task))
    }

    fn build_config(
        &self,
        executable: Option<PathBuf>,
        profile: &ScratchProfile,
    ) -> Result<BrowserConfig> {
        let (width, height) = self.options.window;

        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .user_data_dir(profile.path());

        for arg in self.extra_args() {
            builder = builder.arg(arg);
        }

        if !self.options.headless {
            builder = builder.with_head();
        }

        if let Some(exe) = executable {
            builder = builder.chrome_executable(exe);
        }

        builder.build().map_err(Error::Launch)
    }

    /// Flags for running unattended on servers and CI runners.
    fn extra_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--no-sandbox".to_string(),
        ];

        if self.options.block_images {
            args.push("--blink-settings=imagesEnabled=false".to_string());
        }

        args
    }
}

fn spawn_handler(mut handler: Handler) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                // Some CDP events are not fully parseable; keep going.
                tracing::debug!("CDP handler event error (continuing): {e}");
            }
        }
    })
}
