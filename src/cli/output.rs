use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub use_color: bool,
}

pub fn detect_color(color_flag: bool) -> bool {
    if !color_flag {
        return false;
    }
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    std::io::stdout().is_terminal()
}

/// Diagnostics go to stderr. `RUST_LOG` wins over `--verbose`.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("spend_notify={}", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_flag_off_disables_color() {
        assert!(!detect_color(false));
    }

    #[test]
    fn init_logging_twice_is_harmless() {
        init_logging(false);
        init_logging(true);
    }
}
