use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use plancast_core::model::CompletionRecord;
use tracing::info;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use crate::workspace::{Workspace, load_plan};

#[derive(Args, Debug)]
pub struct LearnArgs {
    /// Plan file containing the completed work item.
    pub plan: PathBuf,

    /// Id of a work item with status `completed` and `actual_hours` set.
    pub item: String,
}

/// Execute `plancast learn`: append a completion record to the history log.
///
/// An item already present in the history is rejected, so repeated calls
/// never inflate the sample.
///
/// # Errors
///
/// Returns an error when the workspace is not initialized, the item is
/// missing, not completed or already recorded, or the history log cannot be
/// written.
pub fn run_learn(args: &LearnArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let ws = Workspace::open(project_root)?;
    ws.require_initialized()?;
    let plan = load_plan(&args.plan)?;
    let item = plan.item(&args.item)?;

    let record = CompletionRecord::from_completed(&plan.project.id, item, Utc::now())?;
    ws.record_completion(&record)?;
    info!(item = %item.id, efficiency = record.efficiency_score, "recorded completion");

    render_mode(
        output,
        &record,
        |r, w| {
            writeln!(
                w,
                "recorded item={} task_type={} role_type={} efficiency={:.3}",
                args.item, r.task_type, r.role_type, r.efficiency_score
            )
        },
        |r, w| {
            pretty_section(w, &format!("Recorded Completion: {}", args.item))?;
            pretty_kv(w, "Task type", &r.task_type)?;
            pretty_kv(w, "Role", &r.role_type)?;
            pretty_kv(
                w,
                "Hours",
                format!("{:.1} estimated / {:.1} actual", r.estimated_hours, r.actual_hours),
            )?;
            pretty_kv(w, "Efficiency", format!("{:.2}", r.efficiency_score))
        },
    )
}
