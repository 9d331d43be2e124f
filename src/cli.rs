// Author: Dustin Pilgrim
// License: MIT

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "idlecheck",
    version = env!("CARGO_PKG_VERSION"),
    about = "Shared idle-logout monitor with a headless page harness"
)]
pub struct Args {
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(short, long, action)]
    pub verbose: bool,

    /// Write logs to FILE (rotated at 5 MiB) instead of stderr
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(about = "Show the resolved monitor configuration")]
    Info {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Run headless pages sharing one cookie jar in real time")]
    Simulate {
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
        pages: u16,

        /// User input on a page at a time offset, e.g. `0@4.5`
        #[arg(long = "activity", value_name = "PAGE@SECONDS")]
        activity: Vec<String>,

        /// Stop after this many seconds even if pages are still running
        #[arg(long, value_name = "SECONDS")]
        duration: Option<f64>,

        /// Override the configured idle timeout (-1 for development timings)
        #[arg(long, value_name = "MINUTES", allow_hyphen_values = true)]
        idle_timeout: Option<i64>,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simulate_flags() {
        let args = Args::try_parse_from([
            "idlecheck",
            "-v",
            "simulate",
            "--pages",
            "3",
            "--activity",
            "0@2",
            "--activity",
            "2@7.5",
            "--idle-timeout",
            "-1",
        ])
        .unwrap();

        assert!(args.verbose);
        match args.command {
            Command::Simulate {
                pages,
                activity,
                idle_timeout,
                duration,
                json,
            } => {
                assert_eq!(pages, 3);
                assert_eq!(activity, vec!["0@2", "2@7.5"]);
                assert_eq!(idle_timeout, Some(-1));
                assert_eq!(duration, None);
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn zero_pages_is_rejected() {
        assert!(Args::try_parse_from(["idlecheck", "simulate", "--pages", "0"]).is_err());
    }
}
