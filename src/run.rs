//! Run orchestration: day-major, device-minor harvest loops.
//!
//! Authentication and directory failures abort the run; everything inside
//! the day/device loop is recoverable by omission, so a failed or rejected
//! device/day pair is logged and the run moves on. Per-day completeness is
//! the only ordering guarantee: a day's artifact is written before the next
//! day starts.

use crate::aggregate;
use crate::normalize::{self, Mode};
use crate::portal::{Credentials, PortalApi, RawKind};
use crate::report::RunReport;
use crate::table::Table;
use anyhow::Result;
use chrono::{Duration, Local, NaiveDate};
use std::path::Path;
use tracing::{info, warn};

#[derive(Clone, Copy)]
enum Target {
    Summary,
    Raw(RawKind),
}

impl Target {
    fn mode(self) -> Mode {
        match self {
            Target::Summary => Mode::Summary,
            Target::Raw(_) => Mode::Raw,
        }
    }

    fn file_stem(self) -> &'static str {
        match self {
            Target::Summary => "summarized",
            Target::Raw(kind) => kind.as_str(),
        }
    }
}

/// Harvests per-visit emission summaries for the last `interval_days`
/// calendar days, writing one `summarized_<date>.csv` per day.
pub async fn run_summary<P: PortalApi>(
    portal: &P,
    credentials: &Credentials,
    interval_days: u32,
    out_dir: &Path,
) -> Result<RunReport> {
    let mut report = RunReport::new("summary");
    run(
        portal,
        credentials,
        interval_days,
        Target::Summary,
        out_dir,
        &mut report,
    )
    .await?;
    Ok(report)
}

/// Harvests one raw event stream (feed or RFID) for the last
/// `interval_days` calendar days, writing one `<kind>_<date>.csv` per day.
pub async fn run_raw<P: PortalApi>(
    portal: &P,
    credentials: &Credentials,
    interval_days: u32,
    kind: RawKind,
    out_dir: &Path,
) -> Result<RunReport> {
    let mut report = RunReport::new(kind.as_str());
    run(
        portal,
        credentials,
        interval_days,
        Target::Raw(kind),
        out_dir,
        &mut report,
    )
    .await?;
    info!(%kind, accepted = report.accepted, "raw run finished");
    Ok(report)
}

async fn run<P: PortalApi>(
    portal: &P,
    credentials: &Credentials,
    interval_days: u32,
    target: Target,
    out_dir: &Path,
    report: &mut RunReport,
) -> Result<()> {
    let token = portal.login(credentials).await?;
    let devices = portal.owned_systems(&token).await?;
    info!(
        devices = devices.len(),
        interval_days,
        mode = %report.mode,
        "run starting"
    );

    std::fs::create_dir_all(out_dir)?;
    report.devices = devices.len();

    let today = Local::now().date_naive();
    for offset in 0..interval_days {
        let day = today - Duration::days(offset as i64);
        let accepted =
            harvest_day(portal, &token, &devices, &credentials.user, day, target, report).await;

        let path = aggregate::write_day(accepted, out_dir, target.file_stem(), day)?;
        report.artifacts.push(path);
        report.days += 1;
    }

    Ok(())
}

/// Fetches and normalizes every device's payload for one day. The window
/// runs from 00:00 on `day` to 12:00 the following day, as the portal
/// expects.
async fn harvest_day<P: PortalApi>(
    portal: &P,
    token: &str,
    devices: &[String],
    user: &str,
    day: NaiveDate,
    target: Target,
    report: &mut RunReport,
) -> Vec<Table> {
    let end = day + Duration::days(1);
    let mut accepted = Vec::new();

    for device in devices {
        let fetched = match target {
            Target::Raw(kind) => portal.raw(token, kind, device, day, end).await,
            Target::Summary => portal.emissions(token, device, day, end).await,
        };
        let payload = match fetched {
            Ok(payload) => payload,
            Err(err) => {
                warn!(device = %device, %day, error = %err, "fetch failed, skipping");
                report.fetch_failures += 1;
                continue;
            }
        };

        match normalize::normalize(&payload, target.mode(), device, user, day) {
            Ok(table) => {
                accepted.push(table);
                report.accepted += 1;
            }
            Err(rejection) => {
                warn!(device = %device, %day, reason = %rejection, "payload rejected");
                report.rejected += 1;
            }
        }
    }

    accepted
}
