use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use std::path::Path;
use std::fs;
use std::sync::Mutex;

/// Filter used when `RUST_LOG` does not say otherwise
fn env_filter(verbose: bool) -> Result<EnvFilter> {
    let level = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("site_archiver={}", level).parse()?)
        .add_directive("actix_web=info".parse()?)
        .add_directive("warn".parse()?);

    Ok(filter)
}

/// Initialize the logging system
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let fmt_layer = fmt::layer().with_target(true);

    // Optional second sink without ANSI colors
    let file_layer = match log_file {
        Some(log_file) => {
            if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .context(format!("Failed to create log directory: {}", parent.display()))?;
            }

            let file = fs::File::create(log_file)
                .context(format!("Failed to create log file: {}", log_file.display()))?;

            Some(fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter(verbose)?)
        .with(fmt_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives_parse() {
        assert!(env_filter(true).is_ok());
        assert!(env_filter(false).is_ok());
    }
}
