use anyhow::{Context as _, Result};
use clap::Args;
use rapport_core::config::{self, CONFIG_FILE, ProjectConfig};
use rapport_core::db;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::output::{OutputMode, pretty_kv, render};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force re-initialization even if `.rapport/` already exists.
    ///
    /// The store is kept; only the config file is rewritten.
    #[arg(long)]
    pub force: bool,

    /// Scoring engine program and arguments to record in the config.
    #[arg(long, num_args = 1.., allow_hyphen_values = true, value_name = "ARGV")]
    pub engine: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct InitReport {
    project_dir: String,
    config: String,
    store: String,
    engine: Option<Vec<String>>,
}

/// Execute `rp init`. Creates the project skeleton:
///
/// ```text
/// .rapport/
///   config.toml   (scoring and engine settings)
///   rapport.db    (SQLite store, migrated to the latest schema)
/// ```
///
/// # Errors
///
/// Returns an error if `.rapport/` already exists and `--force` is not set,
/// or if any filesystem or store operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project_dir = config::project_dir(project_root);

    if project_dir.exists() && !args.force {
        anyhow::bail!(".rapport/ already exists. Use `rp init --force` to reinitialize.");
    }

    let mut project_config = ProjectConfig::default();
    project_config.engine.command.clone_from(&args.engine);
    project_config
        .validate()
        .context("Invalid --engine value")?;

    std::fs::create_dir_all(&project_dir).with_context(|| {
        format!("Failed to create project directory: {}", project_dir.display())
    })?;

    let config_path = project_dir.join(CONFIG_FILE);
    let body = toml::to_string_pretty(&project_config).context("serialize config")?;
    std::fs::write(&config_path, body)
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

    let store_path = config::store_path(project_root);
    db::open_store(&store_path)
        .with_context(|| format!("Failed to create store: {}", store_path.display()))?;

    tracing::info!(path = %project_dir.display(), "project initialized");

    let report = InitReport {
        project_dir: project_dir.display().to_string(),
        config: config_path.display().to_string(),
        store: store_path.display().to_string(),
        engine: args.engine.clone(),
    };

    render(output, &report, |report, w| {
        writeln!(w, "✓ Initialized .rapport/ project structure.")?;
        writeln!(w)?;
        pretty_kv(w, "Config", &report.config)?;
        pretty_kv(w, "Store", &report.store)?;
        match &report.engine {
            Some(argv) => pretty_kv(w, "Engine", argv.join(" "))?,
            None => {
                writeln!(w)?;
                writeln!(w, "No scoring engine configured. Set `engine.command` in")?;
                writeln!(w, "  .rapport/config.toml before running `rp rate`.")?;
            }
        }
        Ok(())
    })
}
