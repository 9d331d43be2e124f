// Author: Dustin Pilgrim
// License: MIT

pub mod info;
pub mod simulate;

use eyre::{Result, WrapErr};

use crate::cli::{Args, Command};
use crate::core::config::MonitorConfig;

pub async fn run(args: Args) -> Result<()> {
    crate::log::init(args.verbose, args.log_file.as_deref())?;

    let mut loaded = crate::config::load(args.config.as_deref())?;

    match args.command {
        Command::Info { json } => {
            let cfg = resolve(&loaded.file)?;
            info::run(loaded.path.as_deref(), &cfg, json)
        }

        Command::Simulate {
            pages,
            activity,
            duration,
            idle_timeout,
            json,
        } => {
            if let Some(minutes) = idle_timeout {
                loaded.file.idle_timeout_minutes = minutes;
            }
            let cfg = resolve(&loaded.file)?;

            let plan = simulate::Plan::new(usize::from(pages), &activity, duration)?;
            simulate::run(cfg, plan, json).await
        }
    }
}

fn resolve(file: &crate::config::ConfigFile) -> Result<MonitorConfig> {
    file.to_monitor_config().wrap_err("configuration rejected")
}
