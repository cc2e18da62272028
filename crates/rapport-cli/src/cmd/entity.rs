//! `rp entity`: register and list rateable entities.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};
use rapport_core::NodeId;
use rapport_core::db::query::{self, Entity};
use serde::Serialize;

use super::open_project;
use crate::output::{OutputMode, pretty_section, render, render_mode};

#[derive(Subcommand, Debug)]
pub enum EntityCommand {
    /// Register an entity id.
    Add(AddArgs),
    /// List registered entities.
    List,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Entity id.
    #[arg(allow_negative_numbers = true)]
    pub id: NodeId,

    /// Display name.
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
struct AddReport {
    id: NodeId,
    created: bool,
}

pub fn run_entity(command: &EntityCommand, output: OutputMode, project_root: &Path) -> Result<()> {
    match command {
        EntityCommand::Add(args) => run_add(args, output, project_root),
        EntityCommand::List => run_list(output, project_root),
    }
}

fn run_add(args: &AddArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = open_project(project_root, output)?;
    let created = query::insert_entity(&project.conn, args.id, args.name.as_deref())?;
    if !created {
        tracing::debug!(id = args.id, "entity already registered");
    }

    let report = AddReport {
        id: args.id,
        created,
    };
    render(output, &report, |report, w| {
        if report.created {
            writeln!(w, "✓ Registered entity {}", report.id)
        } else {
            writeln!(w, "Entity {} already registered", report.id)
        }
    })
}

fn run_list(output: OutputMode, project_root: &Path) -> Result<()> {
    let project = open_project(project_root, output)?;
    let entities = query::list_entities(&project.conn)?;

    render_mode(
        output,
        &entities,
        |entities, w| {
            for e in entities {
                writeln!(w, "{}\t{}", e.id, e.name.as_deref().unwrap_or(""))?;
            }
            Ok(())
        },
        |entities, w| render_entities_pretty(entities, w),
    )
}

fn render_entities_pretty(entities: &[Entity], w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Entities ({})", entities.len()))?;
    for e in entities {
        let created = chrono::DateTime::from_timestamp_micros(e.created_at_us)
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        writeln!(
            w,
            "{:>10}  {:<24}  {created}",
            e.id,
            e.name.as_deref().unwrap_or("-")
        )?;
    }
    Ok(())
}
