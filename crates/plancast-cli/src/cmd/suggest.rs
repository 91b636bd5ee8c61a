use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use plancast_sim::analytics::{Suggestion, improvement_suggestions};
use plancast_sim::estimate::{EfficiencyEstimate, estimate_recent};
use serde::Serialize;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use crate::workspace::Workspace;

#[derive(Args, Debug)]
pub struct SuggestArgs {
    /// Task type, e.g. `mechanical_design`.
    pub task_type: String,

    /// Role type, e.g. `engineer`.
    pub role_type: String,
}

#[derive(Debug, Serialize)]
struct SuggestOutput<'a> {
    task_type: &'a str,
    role_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    estimate: Option<EfficiencyEstimate>,
    suggestions: Vec<Suggestion>,
}

/// Execute `plancast suggest`: estimate adjustments for a task/role pair.
///
/// # Errors
///
/// Returns an error when the history log cannot be read.
pub fn run_suggest(args: &SuggestArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let ws = Workspace::open(project_root)?;
    let history = ws.history()?;
    let limit = ws.config().prediction.history_limit;

    let out = SuggestOutput {
        task_type: &args.task_type,
        role_type: &args.role_type,
        estimate: estimate_recent(&args.task_type, &args.role_type, &history, limit),
        suggestions: improvement_suggestions(&args.task_type, &args.role_type, &history),
    };

    render_mode(
        output,
        &out,
        |o, w| {
            match &o.estimate {
                Some(e) => writeln!(
                    w,
                    "history task_type={} role_type={} samples={} avg_efficiency={:.3} risk={:.3}",
                    o.task_type, o.role_type, e.sample_size, e.avg_efficiency, e.risk_score
                )?,
                None => writeln!(
                    w,
                    "history task_type={} role_type={} samples=0",
                    o.task_type, o.role_type
                )?,
            }
            for s in &o.suggestions {
                writeln!(
                    w,
                    "suggestion severity={} adjustment_pct={:.1} message={}",
                    s.severity, s.adjustment_pct, s.message
                )?;
            }
            Ok(())
        },
        |o, w| {
            pretty_section(w, &format!("Suggestions: {}/{}", o.task_type, o.role_type))?;
            match &o.estimate {
                Some(e) => {
                    pretty_kv(w, "Samples", e.sample_size.to_string())?;
                    pretty_kv(w, "Efficiency", format!("{:.2}", e.avg_efficiency))?;
                    pretty_kv(w, "Risk", format!("{:.2}", e.risk_score))?;
                }
                None => pretty_kv(w, "Samples", "0 (no matching history)")?,
            }
            if o.suggestions.is_empty() {
                writeln!(w)?;
                writeln!(w, "Estimates look calibrated; no adjustment suggested.")?;
            }
            for s in &o.suggestions {
                writeln!(w)?;
                writeln!(w, "[{}] {}", s.severity, s.message)?;
            }
            Ok(())
        },
    )
}
