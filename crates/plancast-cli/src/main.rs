#![forbid(unsafe_code)]

mod cmd;
mod output;
mod workspace;

use std::env;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "plancast: Monte Carlo completion forecasts for dependency-linked work",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a plancast project",
        long_about = "Create .plancast/ with a default config.toml in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize the current directory\n    plancast init\n\n    # Reset the config to defaults\n    plancast init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Forecasting",
        about = "Forecast project completion with Monte Carlo simulation",
        long_about = "Sample every work item's duration, schedule items after their dependencies,\n\
                      and report the mean, P50, P90 and P95 completion dates. The run is appended\n\
                      to .plancast/runs.jsonl unless --no-persist is given.",
        after_help = "EXAMPLES:\n    # Default iterations from config\n    plancast simulate plan.json\n\n\
                      # Reproducible run\n    plancast simulate plan.json --iterations 5000 --seed 42\n\n\
                      # Read spans as wall-clock hours\n    plancast simulate plan.json --unit hours --format json"
    )]
    Simulate(cmd::simulate::SimulateArgs),

    #[command(
        next_help_heading = "Forecasting",
        about = "Predict the delay of one work item",
        long_about = "Predict one item's delay from matching completion history, falling back to\n\
                      sampled durations when no history exists.",
        after_help = "EXAMPLES:\n    plancast predict plan.json cad-model\n\n    plancast predict plan.json cad-model --seed 7 --format json"
    )]
    Predict(cmd::predict::PredictArgs),

    #[command(
        next_help_heading = "Forecasting",
        about = "Show the deterministic critical path",
        long_about = "Schedule items with their estimated hours and report slack per item and the\n\
                      longest dependency chain.",
        after_help = "EXAMPLES:\n    plancast plan plan.json"
    )]
    Plan(cmd::plan::PlanArgs),

    #[command(
        next_help_heading = "Forecasting",
        about = "Estimate checkpoint effort for a templated work unit",
        after_help = "EXAMPLES:\n    plancast progress mechanical_designer design --seed 3"
    )]
    Progress(cmd::progress::ProgressArgs),

    #[command(
        next_help_heading = "History",
        about = "Record a completed work item",
        long_about = "Append a completion record for an item whose status is `completed`.\n\
                      Later predictions for the same task and role use it.",
        after_help = "EXAMPLES:\n    plancast learn plan.json cad-model"
    )]
    Learn(cmd::learn::LearnArgs),

    #[command(
        next_help_heading = "History",
        about = "Move a work item to a new status",
        long_about = "Apply a lifecycle transition (pending -> in_progress -> review -> completed)\n\
                      and save the plan file. Completing an item also records its completion.",
        after_help = "EXAMPLES:\n    plancast status plan.json cad in_progress\n\n    plancast status plan.json cad completed --actual-hours 30"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "History",
        about = "List stored simulation runs for a project",
        after_help = "EXAMPLES:\n    plancast runs gearbox\n\n    plancast runs gearbox --limit 3 --format json"
    )]
    Runs(cmd::runs::RunsArgs),

    #[command(
        next_help_heading = "History",
        about = "Summarize estimation efficiency",
        after_help = "EXAMPLES:\n    plancast stats\n\n    plancast stats --format text"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        next_help_heading = "History",
        about = "Suggest estimate adjustments for a task and role",
        after_help = "EXAMPLES:\n    plancast suggest cad engineer"
    )]
    Suggest(cmd::suggest::SuggestArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("PLANCAST_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "plancast=debug,plancast_sim=debug,plancast_core=debug,info"
        } else {
            "plancast=warn,plancast_sim=warn,plancast_core=warn,error"
        })
    });

    let format = env::var("PLANCAST_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(command: Commands, output: OutputMode) -> anyhow::Result<()> {
    let project_root = env::current_dir()?;

    match command {
        Commands::Init(args) => cmd::init::run_init(&args, output, &project_root),
        Commands::Simulate(args) => cmd::simulate::run_simulate(&args, output, &project_root),
        Commands::Predict(args) => cmd::predict::run_predict(&args, output, &project_root),
        Commands::Plan(args) => cmd::plan::run_plan(&args, output, &project_root),
        Commands::Progress(args) => cmd::progress::run_progress(&args, output, &project_root),
        Commands::Learn(args) => cmd::learn::run_learn(&args, output, &project_root),
        Commands::Status(args) => cmd::status::run_status(&args, output, &project_root),
        Commands::Runs(args) => cmd::runs::run_runs(&args, output, &project_root),
        Commands::Stats(args) => cmd::stats::run_stats(&args, output, &project_root),
        Commands::Suggest(args) => cmd::suggest::run_suggest(&args, output, &project_root),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = cli.output_mode();
    debug!(?output, "resolved output mode");

    match run(cli.command, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = workspace::classify(&err);
            let cli_err = CliError::from_code(code, format!("{err:#}"));
            if render_error(output, &cli_err).is_err() {
                eprintln!("error[{}]: {err:#}", code.code());
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["plancast", "stats", "--format", "json"]);
        assert_eq!(cli.format, Some(OutputMode::Json));
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn json_flag_sets_output_mode() {
        let cli = Cli::parse_from(["plancast", "--json", "stats"]);
        assert!(cli.json);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn simulate_parses_overrides() {
        let cli = Cli::parse_from([
            "plancast",
            "simulate",
            "plan.json",
            "-n",
            "500",
            "--seed",
            "9",
            "--unit",
            "hours",
            "--no-persist",
        ]);
        let Commands::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.iterations, Some(500));
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.unit, Some(plancast_core::model::DurationUnit::Hours));
        assert!(args.no_persist);
    }

    #[test]
    fn bad_unit_is_a_parse_error() {
        let result = Cli::try_parse_from(["plancast", "simulate", "plan.json", "--unit", "weeks"]);
        assert!(result.is_err());
    }

    #[test]
    fn status_parses_target_and_hours() {
        let cli = Cli::parse_from([
            "plancast",
            "status",
            "plan.json",
            "cad",
            "in-progress",
        ]);
        assert!(matches!(
            cli.command,
            Commands::Status(ref args)
                if args.status == plancast_core::model::WorkStatus::InProgress
                    && args.actual_hours.is_none()
        ));
    }

    #[test]
    fn predict_takes_plan_and_item() {
        let cli = Cli::parse_from(["plancast", "predict", "plan.json", "cad"]);
        assert!(matches!(
            cli.command,
            Commands::Predict(ref args) if args.item == "cad"
        ));
    }
}
