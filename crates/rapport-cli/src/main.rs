#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use std::env;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::output::{OutputMode, resolve_output_mode};

#[derive(Parser)]
#[command(
    name = "rp",
    author,
    version,
    about = "rapport: neighborhood-scoped reputation scoring",
    long_about = None
)]
struct Cli {
    /// Log rapport internals at debug level (overridden by `RAPPORT_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, value_enum, global = true)]
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

#[derive(Subcommand)]
enum Commands {
    #[command(
        about = "Initialize a rapport project",
        long_about = "Create .rapport/ with a config file and an empty rating store.",
        after_help = "EXAMPLES:\n    # Initialize without an engine\n    rp init\n\n    # Initialize with an external scoring engine\n    rp init --engine python3 scorer.py"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        about = "Register or list entities",
        after_help = "EXAMPLES:\n    # Register entity 7\n    rp entity add 7 --name alice\n\n    # List all entities\n    rp entity list"
    )]
    Entity {
        #[command(subcommand)]
        command: cmd::entity::EntityCommand,
    },

    #[command(
        about = "Record a rating and rescore the target's neighborhood",
        long_about = "Record that RATER gave TARGET a score from 1 to 10, then rescore \
                      every entity in TARGET's neighborhood with the configured engine.",
        after_help = "EXAMPLES:\n    # Entity 1 rates entity 2 with a 7\n    rp rate 1 2 7\n\n    # Emit the rating and recompute report as JSON\n    rp rate 1 2 7 --format json"
    )]
    Rate(cmd::rate::RateArgs),

    #[command(
        about = "Rescore the neighborhood of an entity",
        after_help = "EXAMPLES:\n    rp recompute 2"
    )]
    Recompute(cmd::recompute::RecomputeArgs),

    #[command(
        about = "Show the normalized neighborhood of an entity",
        after_help = "EXAMPLES:\n    # Outgoing and incoming records around entity 2\n    rp neighborhood 2\n\n    # Exactly what the engine would receive\n    rp neighborhood 2 --engine-format --format json"
    )]
    Neighborhood(cmd::neighborhood::NeighborhoodArgs),

    #[command(
        about = "List persisted scores",
        after_help = "EXAMPLES:\n    # Top ten\n    rp scores --limit 10\n\n    # Lowest first\n    rp scores --order asc"
    )]
    Scores(cmd::scores::ScoresArgs),

    #[command(about = "Show rating graph size and content hash")]
    Graph(cmd::graph::GraphArgs),
}

/// Filter used when `RAPPORT_LOG` is unset.
const fn default_filter(verbose: bool, debug_env: bool) -> &'static str {
    if verbose || debug_env {
        "rapport=debug,info"
    } else {
        "rapport=info,warn"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("RAPPORT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(default_filter(verbose, env::var("DEBUG").is_ok()))
    });

    let format = env::var("RAPPORT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

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

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_root = env::current_dir()?;
    let output = cli.output_mode();

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, output, &project_root),
        Commands::Entity { command } => cmd::entity::run_entity(command, output, &project_root),
        Commands::Rate(args) => cmd::rate::run_rate(args, output, &project_root),
        Commands::Recompute(args) => cmd::recompute::run_recompute(args, output, &project_root),
        Commands::Neighborhood(args) => {
            cmd::neighborhood::run_neighborhood(args, output, &project_root)
        }
        Commands::Scores(args) => cmd::scores::run_scores(args, output, &project_root),
        Commands::Graph(args) => cmd::graph::run_graph(args, output, &project_root),
    }
}
