use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use plancast_sim::DelayPrediction;
use serde::Serialize;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use crate::workspace::{Workspace, load_plan};

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Plan file containing the work item.
    pub plan: PathBuf,

    /// Work item id.
    pub item: String,

    /// Seed for the simulation fallback.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct PredictOutput<'a> {
    item: &'a str,
    estimated_hours: f64,
    #[serde(flatten)]
    prediction: DelayPrediction,
}

/// Execute `plancast predict`.
///
/// # Errors
///
/// Returns an error when the plan cannot be read, the item is missing, or
/// the item or parameters are invalid.
pub fn run_predict(args: &PredictArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let ws = Workspace::open(project_root)?;
    let plan = load_plan(&args.plan)?;
    let item = plan.item(&args.item)?;

    let prediction = ws.service()?.predict(item, plan.params, args.seed)?;
    let out = PredictOutput {
        item: &item.id,
        estimated_hours: item.estimated_hours,
        prediction,
    };

    render_mode(
        output,
        &out,
        |o, w| {
            let p = &o.prediction;
            writeln!(
                w,
                "prediction item={} method={} delay_hours={:.2} confidence={:.2} risk={:.2} samples={}",
                o.item, p.method, p.predicted_delay_hours, p.confidence, p.risk_score, p.sample_size
            )
        },
        |o, w| {
            let p = &o.prediction;
            pretty_section(w, &format!("Delay Prediction: {}", o.item))?;
            pretty_kv(w, "Estimate", format!("{:.1}h", o.estimated_hours))?;
            pretty_kv(w, "Predicted", format!("{:.1}h", p.predicted_delay_hours))?;
            pretty_kv(w, "Method", p.method.to_string())?;
            pretty_kv(w, "Confidence", format!("{:.0}%", p.confidence * 100.0))?;
            pretty_kv(w, "Risk", format!("{:.2}", p.risk_score))?;
            pretty_kv(w, "Samples", p.sample_size.to_string())
        },
    )
}
