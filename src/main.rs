mod cli;
mod core;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "spend-notify",
    about = "Post yesterday's AWS spend by service to a Telegram group",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: $SPEND_NOTIFY_CONFIG or ~/.config/spend-notify/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Query costs and send the report (default)
    Run {
        /// Print the message instead of sending it
        #[arg(long)]
        dry_run: bool,

        /// Report on this day instead of yesterday
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a config template
    Init,
    /// Validate config and environment overrides
    Check,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    cli::output::init_logging(cli.verbose);

    let output_opts = cli::output::OutputOptions {
        use_color: cli::output::detect_color(!cli.no_color),
    };
    let config_path = cli.config.as_deref();

    match cli.command {
        None => cli::report_cmd::run(config_path, None).await?,
        Some(Commands::Run { dry_run, date }) => {
            if dry_run {
                cli::report_cmd::preview(config_path, date).await?
            } else {
                cli::report_cmd::run(config_path, date).await?
            }
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init => cli::config_cmd::init(config_path, &output_opts)?,
            ConfigAction::Check => cli::config_cmd::check(config_path, &output_opts)?,
            ConfigAction::Path => cli::config_cmd::path(config_path)?,
        },
    }

    Ok(())
}
