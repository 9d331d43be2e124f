// Author: Dustin Pilgrim
// License: MIT

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use eyre::{Result, WrapErr, bail};
use serde::Serialize;
use tokio::time::{Instant, sleep, sleep_until};

use crate::core::config::MonitorConfig;
use crate::core::info::InfoSnapshot;
use crate::core::utils::format_clock;
use crate::daemon::{Monitor, MonitorHandle, Outcome};
use crate::services::clock::{Clock, TokioClock};
use crate::services::headless::{HeadlessCookieJar, HeadlessPage, SurfaceChange, SurfaceRecord};

const SETTLE_POLL: Duration = Duration::from_millis(200);

/// One scheduled key press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scheduled {
    pub page: usize,
    pub at: Duration,
}

/// What to run: page count, input schedule (sorted by time), optional time limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub pages: usize,
    pub activity: Vec<Scheduled>,
    pub duration: Option<Duration>,
}

impl Plan {
    pub fn new(pages: usize, activity: &[String], duration: Option<f64>) -> Result<Self> {
        if pages == 0 {
            bail!("at least one page is required");
        }

        let mut parsed = Vec::with_capacity(activity.len());
        for raw in activity {
            let s = parse_activity(raw)?;
            if s.page >= pages {
                bail!("activity {raw:?} targets page {} but only {pages} page(s) run", s.page);
            }
            parsed.push(s);
        }
        parsed.sort_by_key(|s| s.at);

        let duration = duration.map(parse_seconds).transpose()?;

        Ok(Self {
            pages,
            activity: parsed,
            duration,
        })
    }
}

/// `PAGE@SECONDS`, e.g. `1@12.5`.
pub fn parse_activity(raw: &str) -> Result<Scheduled> {
    let Some((page, secs)) = raw.split_once('@') else {
        bail!("invalid activity {raw:?} (expected PAGE@SECONDS)");
    };

    let page: usize = page
        .trim()
        .parse()
        .wrap_err_with(|| format!("invalid page index in {raw:?}"))?;

    let secs: f64 = secs
        .trim()
        .parse()
        .wrap_err_with(|| format!("invalid seconds in {raw:?}"))?;

    Ok(Scheduled {
        page,
        at: parse_seconds(secs)?,
    })
}

fn parse_seconds(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| eyre::eyre!("invalid time offset {secs}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    AllLoggedOut,
    DurationElapsed,
    Interrupted,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub label: String,
    pub logged_out: Option<String>,
    /// Last snapshot of a page that was still running when the simulation stopped.
    pub final_state: Option<InfoSnapshot>,
    pub history: Vec<SurfaceRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub stop_reason: StopReason,
    pub pages: Vec<PageReport>,
}

pub async fn run(cfg: MonitorConfig, plan: Plan, json: bool) -> Result<()> {
    tracing::info!(
        "simulating {} page(s), idle timeout {}ms, {} scheduled input(s)",
        plan.pages,
        cfg.idle_timeout_ms(),
        plan.activity.len()
    );

    let report = simulate(cfg, &plan, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("ctrl-c handler unavailable: {e}");
            std::future::pending::<()>().await;
        }
    })
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", pretty_text(&report));
    }

    Ok(())
}

/// Run every page until all have logged out, the plan's duration passes, or
/// `interrupt` resolves.
pub async fn simulate(
    cfg: MonitorConfig,
    plan: &Plan,
    interrupt: impl Future<Output = ()>,
) -> Result<Report> {
    let jar = Arc::new(HeadlessCookieJar::new());
    let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());

    let pages: Vec<HeadlessPage> = (0..plan.pages)
        .map(|i| HeadlessPage::new(format!("page-{i}"), jar.clone(), clock.clone()))
        .collect();

    let handles: Vec<MonitorHandle> = pages
        .iter()
        .map(|p| Monitor::new(cfg.clone(), p.host()).start())
        .collect();

    let base = Instant::now();
    let deadline = plan.duration.map(|d| base + d);
    let mut next = 0;

    tokio::pin!(interrupt);

    let stop_reason = loop {
        if handles.iter().all(MonitorHandle::is_finished) {
            break StopReason::AllLoggedOut;
        }

        let next_input = plan.activity.get(next).map(|s| base + s.at);

        tokio::select! {
            _ = &mut interrupt => {
                tracing::info!("interrupted; stopping all pages");
                break StopReason::Interrupted;
            }

            _ = sleep_until(deadline.unwrap_or(base)), if deadline.is_some() => {
                break StopReason::DurationElapsed;
            }

            _ = sleep_until(next_input.unwrap_or(base)), if next_input.is_some() => {
                let s = plan.activity[next];
                next += 1;
                let page = &pages[s.page];
                tracing::info!("[{}] key press at +{:.1}s", page.label, s.at.as_secs_f64());
                page.press_key();
            }

            _ = sleep(SETTLE_POLL) => {}
        }
    };

    let mut reports = Vec::with_capacity(pages.len());
    for (page, handle) in pages.iter().zip(handles) {
        let (outcome, final_state) = if handle.is_finished() {
            (handle.wait().await?, None)
        } else {
            let snap = handle.snapshot().await;
            (handle.stop().await?, snap)
        };

        reports.push(PageReport {
            label: page.label.clone(),
            logged_out: match outcome {
                Outcome::LoggedOut { url } => Some(url),
                Outcome::Stopped => None,
            },
            final_state,
            history: page.surface.history(),
        });
    }

    Ok(Report {
        stop_reason,
        pages: reports,
    })
}

fn pretty_text(report: &Report) -> String {
    let mut out = String::new();

    for page in &report.pages {
        let outcome = match &page.logged_out {
            Some(url) => format!("logged out -> {url}"),
            None => "still active".to_string(),
        };
        out.push_str(&format!("{}: {outcome}\n", page.label));

        for rec in &page.history {
            let what = match &rec.change {
                SurfaceChange::Mounted => "banner mounted".to_string(),
                SurfaceChange::Shown { seconds } => format!("warning shown ({seconds}s)"),
                SurfaceChange::Countdown { seconds } => format!("countdown {seconds}"),
                SurfaceChange::Hidden => "warning dismissed".to_string(),
                SurfaceChange::Navigated { url } => format!("navigated to {url}"),
            };
            out.push_str(&format!("  {}  {what}\n", format_clock(rec.at_ms)));
        }

        if let Some(snap) = &page.final_state {
            for line in snap.pretty_text().lines() {
                out.push_str(&format!("  {line}\n"));
            }
        }
    }

    let reason = match report.stop_reason {
        StopReason::AllLoggedOut => "every page logged out",
        StopReason::DurationElapsed => "duration elapsed",
        StopReason::Interrupted => "interrupted",
    };
    out.push_str(&format!("Stopped: {reason}\n"));
    out
}
