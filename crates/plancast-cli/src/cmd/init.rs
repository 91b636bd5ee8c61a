use anyhow::{Context as _, Result};
use clap::Args;
use plancast_core::config::default_config_toml;
use plancast_core::store::PLANCAST_DIR;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::output::{OutputMode, render_mode};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing `.plancast/config.toml`.
    #[arg(long)]
    pub force: bool,
}

const GITIGNORE: &str = "*.lock\n";

#[derive(Debug, Serialize)]
struct InitOutput {
    initialized: bool,
    path: String,
    config: String,
}

/// Execute `plancast init`. Creates the project skeleton:
///
/// ```text
/// .plancast/
///   config.toml      (default simulation, prediction and sampler settings)
///   .gitignore       (lock files)
/// ```
///
/// Run and completion logs are created lazily on first write.
///
/// # Errors
///
/// Returns an error if `.plancast/` already exists and `--force` is not set,
/// or if any filesystem operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let dir = project_root.join(PLANCAST_DIR);

    if dir.exists() && !args.force {
        anyhow::bail!("{PLANCAST_DIR}/ already exists. Use `plancast init --force` to reinitialize.");
    }

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let config_path = dir.join("config.toml");
    std::fs::write(&config_path, default_config_toml()?)
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

    let gitignore_path = dir.join(".gitignore");
    std::fs::write(&gitignore_path, GITIGNORE)
        .with_context(|| format!("Failed to write .gitignore: {}", gitignore_path.display()))?;

    let out = InitOutput {
        initialized: true,
        path: dir.display().to_string(),
        config: config_path.display().to_string(),
    };
    render_mode(
        output,
        &out,
        |o, w| writeln!(w, "initialized path={} config={}", o.path, o.config),
        |_, w| {
            writeln!(w, "✓ Initialized {PLANCAST_DIR}/ project structure.")?;
            writeln!(w)?;
            writeln!(w, "  Config: {PLANCAST_DIR}/config.toml")?;
            writeln!(w)?;
            writeln!(w, "Next steps:")?;
            writeln!(w, "  plancast simulate plan.json")?;
            writeln!(w, "  plancast learn plan.json <item-id>   # after finishing work")
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use plancast_core::config::load_project_config;

    #[test]
    fn init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        run_init(&InitArgs { force: false }, OutputMode::Json, dir.path()).unwrap();

        let config = load_project_config(dir.path()).unwrap();
        assert_eq!(config.simulation.iterations, 10_000);
        assert!(dir.path().join(".plancast/.gitignore").exists());
    }

    #[test]
    fn second_init_requires_force() {
        let dir = tempfile::tempdir().unwrap();
        run_init(&InitArgs { force: false }, OutputMode::Json, dir.path()).unwrap();

        let err = run_init(&InitArgs { force: false }, OutputMode::Json, dir.path()).unwrap_err();
        assert!(err.to_string().contains("--force"));
        run_init(&InitArgs { force: true }, OutputMode::Json, dir.path()).unwrap();
    }
}
