//! `plancast status`: move a work item through its lifecycle.
//!
//! Completing an item writes its completion record to the history log, so
//! later predictions for the same task and role learn from it.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use plancast_core::model::{CompletionRecord, WorkStatus};
use serde::Serialize;
use tracing::info;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use crate::workspace::{Workspace, load_plan, save_plan};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Plan file to update in place.
    pub plan: PathBuf,

    /// Work item id.
    pub item: String,

    /// Target status: pending, in_progress, review or completed.
    pub status: WorkStatus,

    /// Actual hours spent, recorded when the item is completed.
    #[arg(long, value_parser = parse_hours)]
    pub actual_hours: Option<f64>,
}

fn parse_hours(s: &str) -> Result<f64, String> {
    let hours: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if hours.is_finite() && hours >= 0.0 {
        Ok(hours)
    } else {
        Err(format!("hours must be finite and non-negative, got {s}"))
    }
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    item: String,
    from: WorkStatus,
    to: WorkStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<CompletionRecord>,
}

/// Execute `plancast status`.
///
/// The plan file is saved before the completion record is appended; if the
/// append fails, `plancast learn` can record the completed item later.
///
/// # Errors
///
/// Returns an error for a missing item, a transition the lifecycle forbids,
/// completing without an initialized workspace, completing an item whose
/// completion is already recorded, or any write failure.
pub fn run_status(args: &StatusArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let ws = Workspace::open(project_root)?;
    if args.status == WorkStatus::Completed {
        ws.require_initialized()?;
    }

    let mut plan = load_plan(&args.plan)?;
    let project_id = plan.project.id.clone();
    let now = Utc::now();
    let item = plan.item_mut(&args.item)?;
    let from = item.status;
    item.transition(args.status, args.actual_hours, now)?;

    let record = if args.status == WorkStatus::Completed {
        let record = CompletionRecord::from_completed(&project_id, item, now)?;
        ws.ensure_unrecorded(&record)?;
        Some(record)
    } else {
        None
    };

    save_plan(&args.plan, &plan)?;
    if let Some(record) = &record {
        ws.record_completion(record)?;
        info!(item = %args.item, efficiency = record.efficiency_score, "recorded completion");
    }

    let out = StatusOutput {
        item: args.item.clone(),
        from,
        to: args.status,
        record,
    };
    render_mode(
        output,
        &out,
        |o, w| {
            write!(w, "status item={} from={} to={}", o.item, o.from, o.to)?;
            match &o.record {
                Some(r) => writeln!(w, " efficiency={:.3}", r.efficiency_score),
                None => writeln!(w),
            }
        },
        |o, w| {
            pretty_section(w, &format!("Status: {}", o.item))?;
            pretty_kv(w, "Transition", format!("{} → {}", o.from, o.to))?;
            if let Some(r) = &o.record {
                pretty_kv(
                    w,
                    "Hours",
                    format!("{:.1} estimated / {:.1} actual", r.estimated_hours, r.actual_hours),
                )?;
                pretty_kv(w, "Efficiency", format!("{:.2}", r.efficiency_score))?;
            }
            Ok(())
        },
    )
}
