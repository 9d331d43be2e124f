// Author: Dustin Pilgrim
// License: MIT

use std::path::Path;

use eyre::Result;

use crate::core::config::MonitorConfig;
use crate::core::utils::format_duration;

pub fn run(path: Option<&Path>, cfg: &MonitorConfig, json: bool) -> Result<()> {
    if json {
        let out = serde_json::json!({
            "config_path": path.map(|p| p.display().to_string()),
            "config": cfg,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print!("{}", pretty_text(path, cfg));
    Ok(())
}

fn pretty_text(path: Option<&Path>, cfg: &MonitorConfig) -> String {
    let source = match path {
        Some(p) => p.display().to_string(),
        None => "built-in defaults".to_string(),
    };

    let mut out = String::new();
    out.push_str(&format!("Config: {source}\n"));
    out.push_str(&format!(
        "Idle timeout: {}{}\n",
        format_duration(cfg.idle_timeout),
        if cfg.dev_mode { " (development)" } else { "" }
    ));
    out.push_str(&format!("Countdown: {}s\n", cfg.countdown_seconds));
    out.push_str(&format!("Cookie: {} (domain {})\n", cfg.cookie_name, cfg.cookie_domain));
    out.push_str(&format!("Logout url: {}\n", cfg.logout_url));
    out.push_str(&format!("Warning text: {}\n", cfg.warning_text));
    out.push_str(&format!(
        "Polling: check {}ms, editors {}ms, frames {}ms\n",
        cfg.check_period.as_millis(),
        cfg.editor_poll_period.as_millis(),
        cfg.frame_poll_period.as_millis(),
    ));
    out
}
