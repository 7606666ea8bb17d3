use anyhow::Result;
use colored::{control, Colorize};
use std::path::{Path, PathBuf};

use crate::cli::output::OutputOptions;
use crate::core::config::AppConfig;

fn resolve(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf).unwrap_or_else(AppConfig::config_path)
}

pub fn init(path: Option<&Path>, _opts: &OutputOptions) -> Result<()> {
    let path = resolve(path);
    if path.exists() {
        eprintln!("Config file already exists at {}", path.display());
        eprintln!("Remove it first if you want to regenerate.");
        return Ok(());
    }

    match AppConfig::write_template(&path) {
        Ok(()) => {
            println!("Generated config at {}", path.display());
            println!("  Fill in the Telegram and AWS secrets, then run `spend-notify config check`.");
        }
        Err(e) => {
            eprintln!("Failed to generate config: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

pub fn path(path: Option<&Path>) -> Result<()> {
    println!("{}", resolve(path).display());
    Ok(())
}

pub fn check(path: Option<&Path>, opts: &OutputOptions) -> Result<()> {
    control::set_override(opts.use_color);

    let path = resolve(path);
    if !path.exists() {
        eprintln!("No config file found at {}", path.display());
        eprintln!("Secrets are read from the environment only.");
    }

    let config = match AppConfig::load(Some(&path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {}", "Failed to load config:".red(), e);
            std::process::exit(1);
        }
    };

    let issues = config.validate();
    if issues.is_empty() {
        println!("{} {}", "Config is valid:".green(), path.display());
        println!("  Chat       {}", config.telegram.chat_id);
        println!("  Region     {}", config.aws.region);
        println!("  Error log  {}", config.report.error_log.display());
    } else {
        eprintln!("{} {}:", "Config issues found in".red().bold(), path.display());
        for issue in &issues {
            eprintln!("  - {}", issue);
        }
        std::process::exit(1);
    }
    Ok(())
}
