use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "keepfresh")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Keep a job-portal profile's last-updated timestamp fresh",
    long_about = "Keepfresh signs in to a job portal with configured credentials, \
                  touches the resume file or the headline text so the profile's \
                  freshness ranking signal advances, and tears the browser down. \
                  Built to run unattended on a schedule."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the profile refresh pipeline
    Run(commands::run::RunArgs),

    /// Check browser and configuration without starting a run
    Doctor {
        /// Chrome/Chromium binary to validate instead of auto-detecting
        #[arg(long, value_name = "PATH")]
        chrome_path: Option<PathBuf>,

        /// Config file to validate
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Doctor {
            chrome_path,
            config,
        } => commands::doctor::execute(chrome_path, config),
        Commands::Completion { shell } => commands::completion::execute(shell, &mut Cli::command()),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("keepfresh=debug,keepfresh_core=debug,keepfresh_browser=debug,keepfresh_flows=debug")
    } else {
        EnvFilter::new("keepfresh=info,keepfresh_flows=info,keepfresh_browser=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
