use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use console::style;
use keepfresh_core::{Action, ConfigFile, ExitPolicy, RunReport};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ActionArg {
    /// Re-upload the configured resume file
    Resume,
    /// Toggle a trailing marker on the headline text
    Headline,
}

impl From<ActionArg> for Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Resume => Action::Resume,
            ActionArg::Headline => Action::Headline,
        }
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to a JSON config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Portal account username
    #[arg(long, env = "KEEPFRESH_USERNAME", hide_env_values = true)]
    pub username: Option<String>,

    /// Portal account password
    #[arg(long, env = "KEEPFRESH_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Registered mobile number, if the portal asks for one
    #[arg(long, env = "KEEPFRESH_MOBILE", hide_env_values = true)]
    pub mobile: Option<String>,

    /// Login page URL
    #[arg(long, env = "KEEPFRESH_LOGIN_URL", value_name = "URL")]
    pub login_url: Option<String>,

    /// Profile page URL
    #[arg(long, env = "KEEPFRESH_PROFILE_URL", value_name = "URL")]
    pub profile_url: Option<String>,

    /// Which profile mutation to perform
    #[arg(long, value_enum, default_value_t = ActionArg::Resume)]
    pub action: ActionArg,

    /// Resume file to re-upload
    #[arg(long, value_name = "FILE")]
    pub resume: Option<PathBuf>,

    /// Run with a visible browser window
    #[arg(long)]
    pub headed: bool,

    /// Chrome/Chromium binary to use
    #[arg(long, value_name = "PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Named persistent browser profile under ~/.keepfresh/profiles
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Directory for locator-failure screenshots and markup dumps
    #[arg(long, value_name = "DIR")]
    pub artifacts_dir: Option<PathBuf>,

    /// Exit non-zero when any stage fails
    #[arg(long)]
    pub fail_on_error: bool,
}

pub fn execute(args: RunArgs) -> Result<()> {
    let base = match &args.config {
        Some(path) => ConfigFile::load(path)
            .with_context(|| format!("could not load config from {}", path.display()))?,
        None => ConfigFile::default(),
    };

    let profile_dir = match &args.profile {
        Some(name) => Some(
            dirs::home_dir()
                .context("could not determine home directory for --profile")?
                .join(".keepfresh")
                .join("profiles")
                .join(name),
        ),
        None => None,
    };

    let overrides = ConfigFile {
        username: args.username,
        password: args.password,
        mobile: args.mobile,
        login_url: args.login_url,
        profile_url: args.profile_url,
        resume_path: args.resume,
        chrome_path: args.chrome_path,
        profile_dir,
        headless: if args.headed { Some(false) } else { None },
        artifacts_dir: args.artifacts_dir,
        ..ConfigFile::default()
    };

    let policy = if args.fail_on_error {
        ExitPolicy::FailOnError
    } else {
        ExitPolicy::AlwaysZero
    };

    // Validation happens here, before any browser process exists.
    let config = base
        .overlay(overrides)
        .finish(args.action.into(), policy)
        .context("configuration incomplete or invalid")?;

    tracing::info!("Configuration validated; action: {:?}", config.action);
    println!("🚀 Starting profile refresh ({:?})", config.action);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let report = runtime.block_on(keepfresh_flows::run(&config));

    // Don't hang on lingering blocking tasks from the browser handler.
    runtime.shutdown_timeout(Duration::from_millis(100));

    render_report(&report);

    let code = report.exit_code(config.exit_policy);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn render_report(report: &RunReport) {
    println!();
    for entry in &report.stages {
        let marker = if entry.outcome.is_failure() {
            style("✗").red()
        } else {
            style("✓").green()
        };
        println!("{} {:<8} {}", marker, entry.stage.as_str(), entry.outcome.as_str());
        if let Some(detail) = &entry.detail {
            println!("  {}", style(detail).dim());
        }
    }

    if !report.teardown_attempted {
        println!("{}", style("! teardown never ran (launch failed)").yellow());
    }

    if report.failure_count() == 0 {
        println!("\n✅ Profile refresh complete");
    } else {
        println!(
            "\n❌ {} stage(s) failed - see log and artifacts",
            report.failure_count()
        );
    }
}
