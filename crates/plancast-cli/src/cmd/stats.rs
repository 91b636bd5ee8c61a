use std::io::Write;
use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use plancast_sim::analytics::EfficiencySummary;
use serde::Serialize;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use crate::workspace::Workspace;

#[derive(Args, Debug, Default)]
pub struct StatsArgs {}

#[derive(Debug, Serialize)]
struct StatsOutput {
    summary: Option<EfficiencySummary>,
}

/// Execute `plancast stats`: efficiency summary over the completion history.
///
/// # Errors
///
/// Returns an error when the history log cannot be read.
pub fn run_stats(_args: &StatsArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let ws = Workspace::open(project_root)?;
    let history = ws.history()?;
    let out = StatsOutput {
        summary: EfficiencySummary::from_history(&history, Utc::now()),
    };

    render_mode(
        output,
        &out,
        |o, w| {
            let Some(s) = &o.summary else {
                return writeln!(w, "stats total=0");
            };
            writeln!(
                w,
                "stats total={} recent={} overall={:.3} recent_efficiency={:.3} trend={}",
                s.total_completed_tasks,
                s.recent_completed_tasks,
                s.overall_efficiency,
                s.recent_efficiency,
                s.improvement_trend
            )?;
            for (role, eff) in &s.role_efficiency {
                writeln!(w, "role name={role} efficiency={eff:.3}")?;
            }
            for (task, eff) in &s.task_type_efficiency {
                writeln!(w, "task_type name={task} efficiency={eff:.3}")?;
            }
            Ok(())
        },
        |o, w| {
            let Some(s) = &o.summary else {
                return writeln!(w, "No completion history yet. Record some with `plancast learn`.");
            };
            pretty_section(w, "Efficiency")?;
            pretty_kv(w, "Completed", s.total_completed_tasks.to_string())?;
            pretty_kv(w, "Last 30 days", s.recent_completed_tasks.to_string())?;
            pretty_kv(w, "Overall", format!("{:.2}", s.overall_efficiency))?;
            pretty_kv(w, "Recent", format!("{:.2}", s.recent_efficiency))?;
            pretty_kv(w, "Trend", s.improvement_trend.to_string())?;
            if !s.role_efficiency.is_empty() {
                writeln!(w)?;
                pretty_section(w, "By Role")?;
                for (role, eff) in &s.role_efficiency {
                    pretty_kv(w, role, format!("{eff:.2}"))?;
                }
            }
            if !s.task_type_efficiency.is_empty() {
                writeln!(w)?;
                pretty_section(w, "By Task Type")?;
                for (task, eff) in &s.task_type_efficiency {
                    pretty_kv(w, task, format!("{eff:.2}"))?;
                }
            }
            Ok(())
        },
    )
}
