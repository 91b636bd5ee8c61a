use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use plancast_sim::progress::{WorkUnitProgress, process_template, simulate_progress};
use plancast_sim::rng::fresh_seed;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use crate::workspace::{CliFailure, Workspace};

#[derive(Args, Debug)]
pub struct ProgressArgs {
    /// Role that owns the work unit, e.g. `mechanical_designer`.
    pub role_type: String,

    /// Work unit type: `design` or `simulation`.
    pub work_unit_type: String,

    /// Seed for reproducible checkpoint estimates.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ProgressOutput {
    template: &'static str,
    role_type: &'static str,
    work_unit_type: &'static str,
    seed: u64,
    #[serde(flatten)]
    progress: WorkUnitProgress,
}

/// Execute `plancast progress`: sampled checkpoint estimates for a work unit.
///
/// # Errors
///
/// Returns an error when no template matches the role and work unit type.
pub fn run_progress(args: &ProgressArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let ws = Workspace::open(project_root)?;
    let template = process_template(&args.role_type, &args.work_unit_type).ok_or_else(|| {
        CliFailure::UnknownTemplate {
            role_type: args.role_type.clone(),
            work_unit_type: args.work_unit_type.clone(),
        }
    })?;

    let seed = args
        .seed
        .or(ws.config().simulation.seed)
        .unwrap_or_else(fresh_seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let progress = simulate_progress(template.checkpoints, &ws.config().params, &mut rng);

    let out = ProgressOutput {
        template: template.name,
        role_type: template.role_type,
        work_unit_type: template.work_unit_type,
        seed,
        progress,
    };

    render_mode(
        output,
        &out,
        |o, w| {
            writeln!(
                w,
                "progress template={} seed={} total_hours={:.1}",
                o.template, o.seed, o.progress.total_hours
            )?;
            for c in &o.progress.checkpoints {
                writeln!(w, "checkpoint name={} kind={} hours={:.1}", c.name, c.kind, c.estimated_hours)?;
            }
            Ok(())
        },
        |o, w| {
            pretty_section(w, o.template)?;
            for c in &o.progress.checkpoints {
                pretty_kv(w, &c.name, format!("{:.1}h ({})", c.estimated_hours, c.kind))?;
            }
            writeln!(w)?;
            pretty_kv(w, "Total", format!("{:.1}h", o.progress.total_hours))
        },
    )
}
