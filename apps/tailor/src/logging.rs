//! Tracing setup: console output filtered by `RUST_LOG`, plus a per-run
//! debug log file under `logs/`.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_DIR: &str = "logs";

/// `logs/tailor_20250101_120000.log`
pub fn log_file_path(dir: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("{}_{stamp}.log", env!("CARGO_PKG_NAME")))
}

/// Installs the global subscriber. Returns the log file path when one could be opened;
/// a missing log directory never stops the run.
pub fn init(rust_log: &str, log_dir: Option<&Path>) -> Option<PathBuf> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={rust_log}", env!("CARGO_PKG_NAME"))));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let log_file = log_dir.and_then(|dir| {
        std::fs::create_dir_all(dir).ok()?;
        let path = log_file_path(dir);
        let file = File::create(&path).ok()?;
        Some((path, file))
    });

    let (path, file_layer) = match log_file {
        Some((path, file)) => {
            let layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_filter(EnvFilter::new(format!("{}=debug", env!("CARGO_PKG_NAME"))));
            (Some(path), Some(layer))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .init();

    if let Some(path) = &path {
        tracing::debug!(log_file = %path.display(), "File logging enabled");
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name_carries_package_and_timestamp() {
        let path = log_file_path(Path::new(LOG_DIR));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("tailor_"));
        assert!(name.ends_with(".log"));
        // tailor_ + YYYYmmdd_HHMMSS + .log
        assert_eq!(name.len(), "tailor_".len() + 15 + ".log".len());
        assert!(path.starts_with(LOG_DIR));
    }
}
