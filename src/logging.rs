use anyhow::Context;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// File name used under the temp dir when `RUST_LOG` is set without `--log-file`.
pub const DEFAULT_LOG_NAME: &str = "cellflow.log";

/// Logging for the interactive binary, which owns the terminal.
///
/// Nothing may reach stderr while the alternate screen is up, so records go
/// to a file: `log_file` when given, else `<tmp>/cellflow.log` when `RUST_LOG`
/// is set. With neither, logging stays off.
pub fn init_interactive(log_file: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    let path = match log_file {
        Some(p) => p.to_path_buf(),
        None if std::env::var_os("RUST_LOG").is_some() => std::env::temp_dir().join(DEFAULT_LOG_NAME),
        None => return Ok(None),
    };

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("install logger")?;

    Ok(Some(path))
}

/// Logging for the batch tools, straight to stderr.
pub fn init_batch() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
