// Author: Dustin Pilgrim
// License: MIT

use std::time::Duration;

use eyre::{Result, WrapErr};
use serde::Deserialize;

use crate::core::config::{
    MonitorConfig, CHECK_PERIOD, DEV_SENTINEL, EDITOR_POLL_PERIOD, FRAME_POLL_PERIOD,
};

pub const DEFAULT_COOKIE_DOMAIN: &str = "localhost";
pub const DEFAULT_LOGOUT_URL: &str = "/logout";
pub const DEFAULT_WARNING_TEXT: &str = "Logging out soon... Press a Key!!";

/// On-disk form of the monitor parameters.
///
/// ```toml
/// idle_timeout_minutes = 12
/// cookie_domain = ".example.com"
/// logout_url = "https://example.com/logout"
/// warning_text = "Logging out soon... Press a Key!!"
///
/// [polling]
/// check_period_ms = 1000
/// editor_poll_ms = 3000
/// frame_poll_ms = 3000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub idle_timeout_minutes: i64,
    pub cookie_domain: String,
    pub logout_url: String,
    pub warning_text: String,
    pub polling: Polling,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Polling {
    pub check_period_ms: u64,
    pub editor_poll_ms: u64,
    pub frame_poll_ms: u64,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: DEV_SENTINEL,
            cookie_domain: DEFAULT_COOKIE_DOMAIN.to_string(),
            logout_url: DEFAULT_LOGOUT_URL.to_string(),
            warning_text: DEFAULT_WARNING_TEXT.to_string(),
            polling: Polling::default(),
        }
    }
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            check_period_ms: CHECK_PERIOD.as_millis() as u64,
            editor_poll_ms: EDITOR_POLL_PERIOD.as_millis() as u64,
            frame_poll_ms: FRAME_POLL_PERIOD.as_millis() as u64,
        }
    }
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).wrap_err("invalid config file")
    }

    /// Validate and build the runtime configuration.
    pub fn to_monitor_config(&self) -> Result<MonitorConfig> {
        let cfg = MonitorConfig::from_params(
            self.idle_timeout_minutes,
            self.cookie_domain.clone(),
            self.logout_url.clone(),
            self.warning_text.clone(),
        )?;

        let cfg = cfg.with_polling(
            Duration::from_millis(self.polling.check_period_ms),
            Duration::from_millis(self.polling.editor_poll_ms),
            Duration::from_millis(self.polling.frame_poll_ms),
        )?;

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_means_dev_defaults() {
        let file = ConfigFile::parse("").unwrap();
        assert_eq!(file, ConfigFile::default());

        let cfg = file.to_monitor_config().unwrap();
        assert!(cfg.dev_mode);
        assert_eq!(cfg.cookie_domain, "localhost");
        assert_eq!(cfg.logout_url, "/logout");
    }

    #[test]
    fn parses_full_file() {
        let text = r#"
            idle_timeout_minutes = 12
            cookie_domain = ".na.example.com"
            logout_url = "https://apps.na.example.com/manage/account/logoutSSO"
            warning_text = "Bye"

            [polling]
            check_period_ms = 500
            frame_poll_ms = 2000
        "#;

        let cfg = ConfigFile::parse(text).unwrap().to_monitor_config().unwrap();
        assert_eq!(cfg.idle_timeout, Duration::from_millis(60_000));
        assert_eq!(cfg.cookie_domain, ".na.example.com");
        assert_eq!(cfg.warning_text, "Bye");
        assert_eq!(cfg.check_period, Duration::from_millis(500));
        assert_eq!(cfg.editor_poll_period, Duration::from_millis(3000));
        assert_eq!(cfg.frame_poll_period, Duration::from_millis(2000));
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        assert!(ConfigFile::parse("idle_timout_minutes = 3").is_err());

        let file = ConfigFile::parse("idle_timeout_minutes = 0").unwrap();
        let err = file.to_monitor_config().unwrap_err();
        assert!(err.to_string().contains("invalid idle timeout"));

        let file = ConfigFile::parse("[polling]\ncheck_period_ms = 0").unwrap();
        assert!(file.to_monitor_config().is_err());
    }
}
