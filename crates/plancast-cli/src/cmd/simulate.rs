//! `plancast simulate`: Monte Carlo completion forecast for a plan file.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use plancast_core::model::{DurationUnit, SimulationRun};
use plancast_sim::{CancellationToken, SimulationRequest};
use serde::Serialize;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use crate::workspace::{Workspace, load_plan};

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Plan file (JSON) with `project`, `work_items` and optional `params`.
    pub plan: PathBuf,

    /// Number of Monte Carlo iterations (defaults to the config value).
    #[arg(long, short = 'n')]
    pub iterations: Option<usize>,

    /// Seed for a reproducible run.
    #[arg(long)]
    pub seed: Option<u64>,

    /// How summed item hours map to calendar time: `days` or `hours`.
    #[arg(long)]
    pub unit: Option<DurationUnit>,

    /// Compute the forecast without appending it to the run log.
    #[arg(long)]
    pub no_persist: bool,
}

#[derive(Debug, Serialize)]
struct SimulateOutput<'a> {
    #[serde(flatten)]
    run: &'a SimulationRun,
    persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    persist_error: Option<&'a str>,
}

fn date(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

/// Execute `plancast simulate`.
///
/// # Errors
///
/// Returns an error when the plan cannot be read, the workspace is not
/// initialized (unless `--no-persist`), or the simulation rejects the input.
pub fn run_simulate(args: &SimulateArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let ws = Workspace::open(project_root)?;
    if !args.no_persist {
        ws.require_initialized()?;
    }
    let plan = load_plan(&args.plan)?;

    let request = SimulationRequest {
        params: plan.params,
        iterations: args.iterations,
        seed: args.seed,
        duration_unit: args.unit,
        dry_run: args.no_persist,
    };
    let outcome =
        ws.service()?
            .simulate(&plan.project, &plan.work_items, &request, &CancellationToken::new())?;

    let out = SimulateOutput {
        run: &outcome.run,
        persisted: outcome.persisted,
        persist_error: outcome.persist_error.as_deref(),
    };
    render_mode(output, &out, render_text, render_pretty)
}

fn render_text(out: &SimulateOutput<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    let run = out.run;
    let d = &run.distribution;
    writeln!(
        w,
        "run id={} project={} iterations={} seed={} unit={}",
        run.id, run.project_id, run.iterations, run.seed, run.duration_unit
    )?;
    writeln!(
        w,
        "completion mean={} p50={} p90={} p95={} std_days={:.2}",
        d.mean_completion.to_rfc3339(),
        d.p50_completion.to_rfc3339(),
        d.p90_completion.to_rfc3339(),
        d.p95_completion.to_rfc3339(),
        d.std_completion_days
    )?;
    match out.persist_error {
        Some(err) => writeln!(w, "persisted=false error={err}"),
        None => writeln!(w, "persisted={}", out.persisted),
    }
}

fn render_pretty(out: &SimulateOutput<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    let run = out.run;
    let d = &run.distribution;
    pretty_section(w, "Completion Forecast")?;
    pretty_kv(w, "Project", &run.project_id)?;
    pretty_kv(w, "Iterations", run.iterations.to_string())?;
    pretty_kv(w, "Seed", run.seed.to_string())?;
    pretty_kv(w, "Unit", run.duration_unit.to_string())?;
    writeln!(w)?;
    pretty_kv(w, "Mean", date(d.mean_completion))?;
    pretty_kv(w, "P50", date(d.p50_completion))?;
    pretty_kv(w, "P90", date(d.p90_completion))?;
    pretty_kv(w, "P95", date(d.p95_completion))?;
    pretty_kv(w, "Std dev", format!("{:.2} days", d.std_completion_days))?;
    writeln!(w)?;
    pretty_kv(w, "Run", &run.id)?;
    match out.persist_error {
        Some(err) => pretty_kv(w, "Saved", format!("no ({err})")),
        None if out.persisted => pretty_kv(w, "Saved", "yes"),
        None => pretty_kv(w, "Saved", "no (--no-persist)"),
    }
}
