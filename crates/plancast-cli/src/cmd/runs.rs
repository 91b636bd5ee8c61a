use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use clap::Args;
use plancast_core::model::SimulationRun;
use serde::Serialize;

use crate::output::{OutputMode, Renderable, render_list};
use crate::workspace::Workspace;

#[derive(Args, Debug)]
pub struct RunsArgs {
    /// Project id whose runs to list.
    pub project: String,

    /// Maximum number of runs to show, newest first.
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
struct RunRow<'a>(&'a SimulationRun);

impl Renderable for RunRow<'_> {
    fn render_pretty(&self, w: &mut dyn Write) -> io::Result<()> {
        let run = self.0;
        let d = &run.distribution;
        writeln!(
            w,
            "{}  {}  n={:<6} p50 {}  p90 {}  p95 {}",
            run.id,
            run.created_at.format("%Y-%m-%d %H:%M"),
            run.iterations,
            d.p50_completion.format("%Y-%m-%d"),
            d.p90_completion.format("%Y-%m-%d"),
            d.p95_completion.format("%Y-%m-%d"),
        )
    }

    fn render_text(&self, w: &mut dyn Write) -> io::Result<()> {
        let run = self.0;
        let d = &run.distribution;
        writeln!(
            w,
            "{}  {}  {}  {}  {}  {}  {}",
            run.id,
            run.created_at.to_rfc3339(),
            run.iterations,
            run.seed,
            d.p50_completion.to_rfc3339(),
            d.p90_completion.to_rfc3339(),
            d.p95_completion.to_rfc3339(),
        )
    }

    fn text_headers() -> &'static [&'static str] {
        &["id", "created_at", "iterations", "seed", "p50", "p90", "p95"]
    }
}

/// Execute `plancast runs`: list stored simulation runs for a project.
///
/// # Errors
///
/// Returns an error when the workspace is not initialized or the run log
/// cannot be read.
pub fn run_runs(args: &RunsArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let ws = Workspace::open(project_root)?;
    ws.require_initialized()?;

    let runs = ws.service()?.history(&args.project, args.limit)?;
    if runs.is_empty() && !output.is_json() {
        println!("No simulation runs for project '{}'.", args.project);
        return Ok(());
    }
    let rows: Vec<RunRow<'_>> = runs.iter().map(RunRow).collect();
    render_list(&rows, output)
}
