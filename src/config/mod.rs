// Author: Dustin Pilgrim
// License: MIT

pub mod file;

use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};

pub use self::file::ConfigFile;

pub struct LoadedConfig {
    /// `None` when built-in defaults were used.
    pub path: Option<PathBuf>,
    pub file: ConfigFile,
}

/// `$XDG_CONFIG_HOME/idlecheck/idlecheck.toml` (or the platform equivalent).
pub fn resolve_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("idlecheck").join("idlecheck.toml"))
}

/// Load an explicit config file. A missing explicit file is an error.
pub fn load_from_path(path: &Path) -> Result<LoadedConfig> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config {}", path.display()))?;

    let file = ConfigFile::parse(&text)
        .wrap_err_with(|| format!("failed to parse config {}", path.display()))?;

    tracing::info!("config loaded from {}", path.display());

    Ok(LoadedConfig {
        path: Some(path.to_path_buf()),
        file,
    })
}

/// Explicit path if given, else the default path if it exists, else defaults.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        return load_from_path(path);
    }

    match resolve_default_config_path() {
        Some(path) if path.exists() => load_from_path(&path),
        _ => {
            tracing::debug!("no config file found; using built-in defaults");
            Ok(LoadedConfig {
                path: None,
                file: ConfigFile::default(),
            })
        }
    }
}
