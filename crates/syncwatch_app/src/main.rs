mod platform;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use syncwatch_core::Action;
use syncwatch_logging::{level_for_verbosity, watch_info};

use platform::config::{load_config, DEFAULT_CONFIG_FILE};
use platform::{app, logging};

/// Watch and steer IMAP mailbox migration jobs.
#[derive(Debug, Parser)]
#[command(name = "syncwatch", version)]
struct Cli {
    /// RON config file. Missing file means defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Overrides `base_url` from the config.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Overrides `access_token` from the config.
    #[arg(long, global = true)]
    token: Option<String>,

    /// Accept confirmations without asking.
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List jobs with dashboard stats.
    Jobs,
    /// Follow a job live and act on its mailboxes.
    Watch { job: String },
    /// Tail the log of one mailbox.
    Logs { mailbox: u64 },
    /// Stop syncing a running mailbox.
    Stop { mailbox: u64 },
    /// Retry a failed mailbox.
    Retry { mailbox: u64 },
    /// Stop every running mailbox of a job.
    Cancel { job: String },
    /// Delete all jobs and their logs.
    DeleteAll,
    /// Write every mailbox log of a job to one text file.
    ExportLogs {
        job: String,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config);
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(token) = cli.token {
        config.access_token = Some(token);
    }

    let level = level_for_verbosity(config.log_level.into(), cli.verbose);
    logging::initialize(config.log_destination, level);
    watch_info!("syncwatch {} against {}", env!("CARGO_PKG_VERSION"), config.base_url);

    match cli.command {
        Command::Jobs => app::run_jobs(&config),
        Command::Watch { job } => app::run_watch(&config, job, cli.yes),
        Command::Logs { mailbox } => app::run_logs(&config, mailbox),
        Command::Stop { mailbox } => app::run_action(&config, Action::Stop(mailbox), cli.yes),
        Command::Retry { mailbox } => app::run_action(&config, Action::Retry(mailbox), cli.yes),
        Command::Cancel { job } => app::run_action(&config, Action::CancelAll(job), cli.yes),
        Command::DeleteAll => app::run_action(&config, Action::DeleteAllJobs, cli.yes),
        Command::ExportLogs { job, out } => app::run_export(&config, &job, out),
    }
}
