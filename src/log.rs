// Author: Dustin Pilgrim
// License: MIT

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024; // 5 MiB
const DEFAULT_KEEP_BACKUPS: u32 = 5;

pub struct LogPolicy {
    pub max_bytes: u64,
    pub keep_backups: u32,
}

impl Default for LogPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            keep_backups: DEFAULT_KEEP_BACKUPS,
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `verbose`.
/// With `log_file` the output goes to that file (rotated first) instead of stderr.
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let Some(path) = log_file else {
        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init()
            .map_err(|e| eyre::eyre!("failed to install logger: {e}"));
    };

    let needs_blank = prepare_log_file(path, LogPolicy::default())
        .wrap_err_with(|| format!("failed to prepare log file {}", path.display()))?;

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("failed to open log file {}", path.display()))?;

    if needs_blank {
        file.write_all(b"\n")?;
    }
    writeln!(file, "{}", run_header())?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| eyre::eyre!("failed to install logger: {e}"))?;

    tracing::info!("file logging enabled: {}", path.display());
    Ok(())
}

/// Ensures the log file's directory exists and rotates the file if needed.
/// Returns whether to insert a blank line before the next run header.
pub fn prepare_log_file(path: &Path, policy: LogPolicy) -> io::Result<bool> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let meta = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    if meta.len() == 0 {
        return Ok(false);
    }

    if meta.len() >= policy.max_bytes {
        rotate(path, policy.keep_backups)?;
        return Ok(false);
    }

    Ok(true)
}

pub fn run_header() -> String {
    let pid = std::process::id();
    format!("==================== idlecheck run start (pid={pid}) ====================")
}

fn rotate(path: &Path, keep_backups: u32) -> io::Result<()> {
    if keep_backups == 0 {
        let _ = fs::remove_file(path);
        return Ok(());
    }

    for i in (1..keep_backups).rev() {
        let from = rotated_name(path, i);
        if from.exists() {
            let _ = fs::rename(from, rotated_name(path, i + 1));
        }
    }

    fs::rename(path, rotated_name(path, 1))
}

fn rotated_name(base: &Path, n: u32) -> PathBuf {
    PathBuf::from(format!("{}.{}", base.display(), n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("idlecheck-log-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_or_empty_file_needs_no_separator() {
        let dir = scratch_dir("empty");
        let path = dir.join("nested").join("idlecheck.log");

        assert!(!prepare_log_file(&path, LogPolicy::default()).unwrap());
        assert!(path.parent().unwrap().is_dir());

        fs::write(&path, "").unwrap();
        assert!(!prepare_log_file(&path, LogPolicy::default()).unwrap());

        fs::write(&path, "previous run\n").unwrap();
        assert!(prepare_log_file(&path, LogPolicy::default()).unwrap());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn oversized_file_is_rotated_and_backups_shift() {
        let dir = scratch_dir("rotate");
        let path = dir.join("idlecheck.log");
        let policy = || LogPolicy {
            max_bytes: 4,
            keep_backups: 2,
        };

        fs::write(&path, "first").unwrap();
        assert!(!prepare_log_file(&path, policy()).unwrap());
        assert!(!path.exists());
        assert_eq!(fs::read_to_string(rotated_name(&path, 1)).unwrap(), "first");

        fs::write(&path, "second").unwrap();
        prepare_log_file(&path, policy()).unwrap();
        assert_eq!(fs::read_to_string(rotated_name(&path, 1)).unwrap(), "second");
        assert_eq!(fs::read_to_string(rotated_name(&path, 2)).unwrap(), "first");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn run_header_names_the_pid() {
        assert!(run_header().contains(&format!("pid={}", std::process::id())));
    }
}
