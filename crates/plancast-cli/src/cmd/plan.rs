//! `plancast plan`: deterministic schedule and critical path from estimates.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use plancast_core::InvalidInput;
use plancast_core::graph::{DependencyGraph, report_cycles_with_breaks};
use plancast_core::model::WorkItem;
use serde::Serialize;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use crate::workspace::{Workspace, load_plan};

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Plan file (JSON).
    pub plan: PathBuf,
}

#[derive(Debug, Serialize)]
struct ItemRow {
    id: String,
    estimated_hours: f64,
    earliest_start: f64,
    earliest_finish: f64,
    latest_start: f64,
    latest_finish: f64,
    slack: f64,
    critical: bool,
}

#[derive(Debug, Serialize)]
struct PlanOutput {
    project: String,
    total_hours: f64,
    critical_path: Vec<String>,
    items: Vec<ItemRow>,
}

/// Describe which dependency links to drop to make the plan acyclic.
fn suggested_breaks(items: &[WorkItem]) -> String {
    let Ok(graph) = DependencyGraph::from_items(items) else {
        return "plan has dependency cycles".to_string();
    };
    let links: Vec<String> = report_cycles_with_breaks(&graph.graph)
        .into_iter()
        .flat_map(|report| report.suggested_breaks)
        .map(|(blocker, blocked)| format!("'{blocked}' on '{blocker}'"))
        .collect();
    format!("to break the cycles, drop the dependency of {}", links.join(", "))
}

/// Execute `plancast plan`.
///
/// # Errors
///
/// Returns an error when the plan cannot be read or does not form a valid
/// dependency graph. Cycle errors name the links to drop.
pub fn run_plan(args: &PlanArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let ws = Workspace::open(project_root)?;
    let plan = load_plan(&args.plan)?;
    let result = match ws.service()?.critical_path(&plan.work_items) {
        Ok(result) => result,
        Err(err @ InvalidInput::Cycle { .. }) => {
            let breaks = suggested_breaks(&plan.work_items);
            return Err(anyhow::Error::new(err).context(breaks));
        }
        Err(err) => return Err(err.into()),
    };

    let items = plan
        .work_items
        .iter()
        .filter_map(|item| {
            let t = result.item_timings.get(&item.id)?;
            Some(ItemRow {
                id: item.id.clone(),
                estimated_hours: item.estimated_hours,
                earliest_start: t.earliest_start,
                earliest_finish: t.earliest_finish,
                latest_start: t.latest_start,
                latest_finish: t.latest_finish,
                slack: t.slack,
                critical: result.critical_items.contains(&item.id),
            })
        })
        .collect();
    let out = PlanOutput {
        project: plan.project.id.clone(),
        total_hours: result.total_duration,
        critical_path: result.critical_path,
        items,
    };

    render_mode(
        output,
        &out,
        |o, w| {
            writeln!(
                w,
                "plan project={} total_hours={:.1} critical_path={}",
                o.project,
                o.total_hours,
                o.critical_path.join(",")
            )?;
            for r in &o.items {
                writeln!(
                    w,
                    "item id={} start={:.1} finish={:.1} slack={:.1} critical={}",
                    r.id, r.earliest_start, r.earliest_finish, r.slack, r.critical
                )?;
            }
            Ok(())
        },
        |o, w| {
            pretty_section(w, &format!("Plan: {}", o.project))?;
            pretty_kv(w, "Total", format!("{:.1}h", o.total_hours))?;
            pretty_kv(w, "Critical", o.critical_path.join(" → "))?;
            writeln!(w)?;
            writeln!(w, "{:<20} {:>8} {:>8} {:>8} {:>8}", "ITEM", "EST", "START", "FINISH", "SLACK")?;
            for r in &o.items {
                let marker = if r.critical { "*" } else { " " };
                writeln!(
                    w,
                    "{marker}{:<19} {:>8.1} {:>8.1} {:>8.1} {:>8.1}",
                    r.id, r.estimated_hours, r.earliest_start, r.earliest_finish, r.slack
                )?;
            }
            Ok(())
        },
    )
}
