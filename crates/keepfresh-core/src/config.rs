use crate::outcome::ExitPolicy;
use crate::{Error, Result};
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Portal sign-in credentials.
///
/// Treated as opaque strings end to end; `Debug` redacts them so they
/// can never leak through error messages or span fields.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub mobile: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .field("mobile", &self.mobile.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct PortalUrls {
    pub login: Url,
    pub profile: Url,
    /// Matched against the current URL to decide whether sign-in landed
    /// where it should.
    pub logged_in_pattern: Regex,
}

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub window: (u32, u32),
    pub block_images: bool,
    pub chrome_path: Option<PathBuf>,
    pub profile_dir: Option<PathBuf>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window: (1920, 1080),
            block_images: true,
            chrome_path: None,
            profile_dir: None,
        }
    }
}

/// Every wait in the program draws from this table, so the total time
/// budget of a run is auditable in one place.
#[derive(Debug, Clone)]
pub struct WaitBudget {
    pub auth_wait: Duration,
    pub locator_passes: u32,
    pub locator_backoff: Duration,
    pub interstitial_wait: Duration,
    pub upload_settle: Duration,
    pub verify_wait: Duration,
    pub submit_settle: Duration,
}

impl Default for WaitBudget {
    fn default() -> Self {
        Self {
            auth_wait: Duration::from_secs(20),
            locator_passes: 3,
            locator_backoff: Duration::from_secs(5),
            interstitial_wait: Duration::from_secs(3),
            upload_settle: Duration::from_secs(15),
            verify_wait: Duration::from_secs(10),
            submit_settle: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct WaitOverrides {
    pub auth_wait_secs: Option<u64>,
    pub locator_passes: Option<u32>,
    pub locator_backoff_secs: Option<u64>,
    pub interstitial_wait_secs: Option<u64>,
    pub upload_settle_secs: Option<u64>,
    pub verify_wait_secs: Option<u64>,
    pub submit_settle_secs: Option<u64>,
}

impl WaitOverrides {
    fn apply(&self, budget: &mut WaitBudget) {
        if let Some(s) = self.auth_wait_secs {
            budget.auth_wait = Duration::from_secs(s);
        }
        if let Some(n) = self.locator_passes {
            budget.locator_passes = n;
        }
        if let Some(s) = self.locator_backoff_secs {
            budget.locator_backoff = Duration::from_secs(s);
        }
        if let Some(s) = self.interstitial_wait_secs {
            budget.interstitial_wait = Duration::from_secs(s);
        }
        if let Some(s) = self.upload_settle_secs {
            budget.upload_settle = Duration::from_secs(s);
        }
        if let Some(s) = self.verify_wait_secs {
            budget.verify_wait = Duration::from_secs(s);
        }
        if let Some(s) = self.submit_settle_secs {
            budget.submit_settle = Duration::from_secs(s);
        }
    }
}

/// Which profile mutation the run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    Resume,
    Headline,
}

/// Raw config as it appears on disk or in CLI/env overrides, before
/// validation. Fields set in an overlay win over the file underneath.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ConfigFile {
    pub username: Option<String>,
    pub password: Option<String>,
    pub mobile: Option<String>,
    pub login_url: Option<String>,
    pub profile_url: Option<String>,
    pub logged_in_pattern: Option<String>,
    pub resume_path: Option<PathBuf>,
    pub chrome_path: Option<PathBuf>,
    pub profile_dir: Option<PathBuf>,
    pub headless: Option<bool>,
    pub window: Option<(u32, u32)>,
    pub block_images: Option<bool>,
    pub artifacts_dir: Option<PathBuf>,
    pub waits: WaitOverrides,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!("Loading config file: {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Merge `over` on top of `self`; set fields in `over` win.
    pub fn overlay(mut self, over: ConfigFile) -> Self {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if over.$field.is_some() { self.$field = over.$field; })*
            };
        }
        take!(
            username,
            password,
            mobile,
            login_url,
            profile_url,
            logged_in_pattern,
            resume_path,
            chrome_path,
            profile_dir,
            headless,
            window,
            block_images,
            artifacts_dir
        );
        let mut waits = self.waits;
        let over_waits = over.waits;
        if over_waits.auth_wait_secs.is_some() {
            waits.auth_wait_secs = over_waits.auth_wait_secs;
        }
        if over_waits.locator_passes.is_some() {
            waits.locator_passes = over_waits.locator_passes;
        }
        if over_waits.locator_backoff_secs.is_some() {
            waits.locator_backoff_secs = over_waits.locator_backoff_secs;
        }
        if over_waits.interstitial_wait_secs.is_some() {
            waits.interstitial_wait_secs = over_waits.interstitial_wait_secs;
        }
        if over_waits.upload_settle_secs.is_some() {
            waits.upload_settle_secs = over_waits.upload_settle_secs;
        }
        if over_waits.verify_wait_secs.is_some() {
            waits.verify_wait_secs = over_waits.verify_wait_secs;
        }
        if over_waits.submit_settle_secs.is_some() {
            waits.submit_settle_secs = over_waits.submit_settle_secs;
        }
        self.waits = waits;
        self
    }

    /// Validate and freeze into a `RunConfig`.
    ///
    /// Required: username, password, login URL, profile URL. Runs once,
    /// before any browser process exists; the result is passed by
    /// reference into every stage.
    pub fn finish(self, action: Action, exit_policy: ExitPolicy) -> Result<RunConfig> {
        let username = self.username.ok_or(Error::MissingField("username"))?;
        let password = self.password.ok_or(Error::MissingField("password"))?;
        let login_url = self.login_url.ok_or(Error::MissingField("login_url"))?;
        let profile_url = self.profile_url.ok_or(Error::MissingField("profile_url"))?;

        let login = Url::parse(&login_url).map_err(|source| Error::InvalidUrl {
            field: "login",
            source,
        })?;
        let profile = Url::parse(&profile_url).map_err(|source| Error::InvalidUrl {
            field: "profile",
            source,
        })?;
        let logged_in_pattern = Regex::new(
            self.logged_in_pattern
                .as_deref()
                .unwrap_or(DEFAULT_LOGGED_IN_PATTERN),
        )?;

        let mut waits = WaitBudget::default();
        self.waits.apply(&mut waits);

        let defaults = BrowserOptions::default();
        Ok(RunConfig {
            credentials: Credentials {
                username,
                password,
                mobile: self.mobile,
            },
            urls: PortalUrls {
                login,
                profile,
                logged_in_pattern,
            },
            browser: BrowserOptions {
                headless: self.headless.unwrap_or(defaults.headless),
                window: self.window.unwrap_or(defaults.window),
                block_images: self.block_images.unwrap_or(defaults.block_images),
                chrome_path: self.chrome_path,
                profile_dir: self.profile_dir,
            },
            waits,
            action,
            resume_path: self.resume_path,
            artifacts_dir: self
                .artifacts_dir
                .unwrap_or_else(|| PathBuf::from("artifacts")),
            exit_policy,
        })
    }
}

/// A case-insensitive match on the path the portal lands on after a
/// successful sign-in.
const DEFAULT_LOGGED_IN_PATTERN: &str = "(?i)profile";

/// Fully validated configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub credentials: Credentials,
    pub urls: PortalUrls,
    pub browser: BrowserOptions,
    pub waits: WaitBudget,
    pub action: Action,
    pub resume_path: Option<PathBuf>,
    pub artifacts_dir: PathBuf,
    pub exit_policy: ExitPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn minimal() -> ConfigFile {
        ConfigFile {
            username: Some("user@example.com".into()),
            password: Some("hunter2".into()),
            login_url: Some("https://portal.example.com/login".into()),
            profile_url: Some("https://portal.example.com/me/profile".into()),
            ..ConfigFile::default()
        }
    }

    #[test]
    fn test_finish_rejects_missing_username() {
        let mut cfg = minimal();
        cfg.username = None;

        let err = cfg
            .finish(Action::Resume, ExitPolicy::AlwaysZero)
            .unwrap_err();
        assert!(err.to_string().contains("username"));
    }

    #[test]
    fn test_finish_rejects_bad_url() {
        let mut cfg = minimal();
        cfg.login_url = Some("not a url".into());

        let err = cfg
            .finish(Action::Resume, ExitPolicy::AlwaysZero)
            .unwrap_err();
        assert!(err.to_string().contains("login"));
    }

    #[test]
    fn test_finish_applies_defaults() {
        let cfg = minimal()
            .finish(Action::Headline, ExitPolicy::AlwaysZero)
            .unwrap();

        assert!(cfg.browser.headless);
        assert_eq!(cfg.browser.window, (1920, 1080));
        assert_eq!(cfg.waits.locator_passes, 3);
        assert_eq!(cfg.waits.locator_backoff, Duration::from_secs(5));
        assert!(cfg.urls.logged_in_pattern.is_match("/mnjuser/Profile"));
        assert_eq!(cfg.artifacts_dir, PathBuf::from("artifacts"));
    }

    #[test]
    fn test_overlay_prefers_override_fields() {
        let over = ConfigFile {
            password: Some("from-env".into()),
            headless: Some(false),
            waits: WaitOverrides {
                locator_passes: Some(1),
                ..WaitOverrides::default()
            },
            ..ConfigFile::default()
        };

        let cfg = minimal()
            .overlay(over)
            .finish(Action::Resume, ExitPolicy::AlwaysZero)
            .unwrap();

        assert_eq!(cfg.credentials.password, "from-env");
        assert!(!cfg.browser.headless);
        assert_eq!(cfg.waits.locator_passes, 1);
        // Untouched fields survive the overlay
        assert_eq!(cfg.credentials.username, "user@example.com");
    }

    #[test]
    fn test_load_parses_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "username": "u",
                "password": "p",
                "login_url": "https://x.example/login",
                "profile_url": "https://x.example/profile",
                "waits": {{ "upload_settle_secs": 2 }}
            }}"#
        )
        .unwrap();

        let cfg = ConfigFile::load(file.path()).unwrap();
        let run = cfg.finish(Action::Resume, ExitPolicy::FailOnError).unwrap();

        assert_eq!(run.waits.upload_settle, Duration::from_secs(2));
        assert_eq!(run.exit_policy, ExitPolicy::FailOnError);
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let cfg = minimal()
            .finish(Action::Resume, ExitPolicy::AlwaysZero)
            .unwrap();

        let printed = format!("{:?}", cfg.credentials);
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("user@example.com"));
        assert!(printed.contains("<redacted>"));
    }
}
