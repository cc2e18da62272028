//! `rp recompute`: rescore the neighborhood of one entity.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use rapport_core::NodeId;
use rapport_score::{RecomputeReport, ScoreOrchestrator};

use super::{open_project, require_engine, require_entity};
use crate::output::{CliError, OutputMode, fail, pretty_kv, render};

#[derive(Args, Debug)]
pub struct RecomputeArgs {
    /// Entity whose neighborhood is rescored.
    #[arg(allow_negative_numbers = true)]
    pub center: NodeId,
}

pub fn run_recompute(args: &RecomputeArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut project = open_project(project_root, output)?;
    let engine = require_engine(&project, output)?;
    require_entity(&project.conn, args.center, output)?;

    let settings = project.extract_settings();
    let report = match ScoreOrchestrator::new(&mut project.conn, engine)
        .with_settings(settings)
        .recompute(args.center)
    {
        Ok(report) => report,
        Err(err) => return fail(output, &CliError::from(&err)),
    };

    render(output, &report, |report, w| write_report(report, w))
}

/// Human summary of a recomputation, shared with `rp rate`.
pub fn write_report(report: &RecomputeReport, w: &mut dyn Write) -> std::io::Result<()> {
    if report.scores_persisted == 0 {
        writeln!(
            w,
            "Entity {} has no ratings in either direction; nothing scored.",
            report.center
        )?;
        return Ok(());
    }
    writeln!(
        w,
        "✓ Rescored {} entities around {}",
        report.scores_persisted, report.center
    )?;
    pretty_kv(
        w,
        "Records",
        format!(
            "{} ({} outgoing, {} incoming)",
            report.records(),
            report.outgoing_records,
            report.incoming_records
        ),
    )?;
    pretty_kv(
        w,
        "Graph",
        format!("{} entities, {} ratings", report.graph_nodes, report.graph_edges),
    )
}
