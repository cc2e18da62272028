pub mod entity;
pub mod graph;
pub mod init;
pub mod neighborhood;
pub mod rate;
pub mod recompute;
pub mod scores;

use std::path::Path;

use anyhow::Result;
use rapport_core::config::{self, ProjectConfig};
use rapport_core::db::query;
use rapport_core::{ErrorCode, NodeId};
use rapport_score::{CommandEngine, ExtractSettings};
use rusqlite::Connection;

use crate::output::{CliError, OutputMode, fail};

/// An initialized project: its open store and validated config.
pub struct Project {
    pub conn: Connection,
    pub config: ProjectConfig,
}

impl Project {
    pub fn extract_settings(&self) -> ExtractSettings {
        ExtractSettings::from(&self.config.scoring)
    }
}

/// Open the store and config under `project_root`.
///
/// Renders `E1001` when the project was never initialized and `E1002` when
/// the config does not load.
pub fn open_project(project_root: &Path, output: OutputMode) -> Result<Project> {
    let path = config::store_path(project_root);
    let Some(conn) = query::try_open_store(&path)? else {
        return fail(
            output,
            &CliError::coded(
                ErrorCode::NotInitialized,
                format!("no rapport store at {}", path.display()),
            ),
        );
    };

    let config = match config::load_project_config(project_root) {
        Ok(config) => config,
        Err(err) => {
            return fail(output, &CliError::coded(ErrorCode::ConfigParseError, format!("{err:#}")));
        }
    };

    Ok(Project { conn, config })
}

/// The configured scoring engine, or `E1003`.
pub fn require_engine(project: &Project, output: OutputMode) -> Result<CommandEngine> {
    match project
        .config
        .engine
        .command
        .as_deref()
        .and_then(CommandEngine::from_argv)
    {
        Some(engine) => Ok(engine),
        None => fail(
            output,
            &CliError::coded(
                ErrorCode::EngineNotConfigured,
                "engine.command is not set in .rapport/config.toml",
            ),
        ),
    }
}

/// Fail with `E2001` unless `id` is a registered entity.
pub fn require_entity(conn: &Connection, id: NodeId, output: OutputMode) -> Result<()> {
    if query::entity_exists(conn, id)? {
        Ok(())
    } else {
        fail(
            output,
            &CliError::coded(ErrorCode::EntityNotFound, format!("entity {id} is not registered")),
        )
    }
}
