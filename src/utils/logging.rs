//! Diagnostic logging setup.
//!
//! Nothing is logged unless `OLLAMA_CHAT_LOG` is set or `--log <file>` names a
//! file. Without a file, diagnostics go to stderr so they never mix with the
//! transcript on stdout.

use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Filter directives are read from this variable, e.g. `OLLAMA_CHAT_LOG=debug`.
pub const LOG_ENV: &str = "OLLAMA_CHAT_LOG";
/// Used for `--log` files when no filter is given.
pub const DEFAULT_LOG_FILTER: &str = "warn";
const SILENT_FILTER: &str = "off";

fn filter_directives(from_env: Option<String>, to_file: bool) -> String {
    from_env
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| {
            if to_file {
                DEFAULT_LOG_FILTER.to_string()
            } else {
                SILENT_FILTER.to_string()
            }
        })
}

fn build_filter(to_file: bool) -> EnvFilter {
    let directives = filter_directives(std::env::var(LOG_ENV).ok(), to_file);
    EnvFilter::try_new(&directives).unwrap_or_else(|err| {
        eprintln!("Ignoring invalid {LOG_ENV} value '{directives}': {err}");
        EnvFilter::new(if to_file {
            DEFAULT_LOG_FILTER
        } else {
            SILENT_FILTER
        })
    })
}

/// Install the global subscriber. Log files are appended to, without colour.
pub fn init_tracing(log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(log_file.is_some()))
        .with_target(true);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| format!("Cannot open log file {}: {err}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|err| err as Box<dyn Error>)?;
        }
        None => {
            builder
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|err| err as Box<dyn Error>)?;
        }
    }

    tracing::debug!(log_file = ?log_file, "Tracing initialized");
    Ok(())
}
