//! Diagnostic log setup.
//!
//! The terminal belongs to the UI, so log lines go to a file. `RUST_LOG`
//! overrides the default filter.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::Config;

const DEFAULT_FILTER: &str = "auditor_core=info,auditor_tui=info";

/// Install the global subscriber. Returns the log file path, or `None` when
/// nothing is being written to a file (no location, or a subscriber was
/// already installed).
pub fn init(config: &Config) -> io::Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let Some(path) = config.log_path() else {
        // No writable location on this platform
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
        return Ok(None);
    };

    let file = open_log_file(&path)?;
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file))
        .try_init();

    match installed {
        Ok(()) => Ok(Some(path)),
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "log subscriber already set");
            Ok(None)
        }
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_log_file_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("auditor.log");
        let config = Config {
            log_file: Some(path.clone()),
            ..Config::default()
        };

        let used = init(&config).unwrap();

        assert_eq!(used, Some(path.clone()));
        assert!(path.exists());

        // A second subscriber cannot be installed, so no file is reported
        let other = dir.path().join("other.log");
        let config = Config {
            log_file: Some(other),
            ..Config::default()
        };
        assert_eq!(init(&config).unwrap(), None);
    }
}
