//! `rp neighborhood`: show the normalized subgraph around an entity.

use std::io::Write;
use std::path::Path;

use anyhow::{Context as _, Result};
use clap::Args;
use rapport_core::NodeId;
use rapport_score::{EngineNode, Neighborhood, RatingGraph, translate};

use super::open_project;
use crate::output::{CliError, OutputMode, fail, pretty_section, render, render_mode};

#[derive(Args, Debug)]
pub struct NeighborhoodArgs {
    /// Center entity.
    #[arg(allow_negative_numbers = true)]
    pub center: NodeId,

    /// Print the records exactly as the scoring engine receives them.
    #[arg(long)]
    pub engine_format: bool,
}

pub fn run_neighborhood(
    args: &NeighborhoodArgs,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let project = open_project(project_root, output)?;
    let graph = RatingGraph::from_sqlite(&project.conn).context("load rating graph")?;
    let hood = match project.extract_settings().extract(&graph, args.center) {
        Ok(hood) => hood,
        Err(err) => return fail(output, &CliError::from(&err)),
    };

    if args.engine_format {
        let nodes = translate::to_engine_nodes(&hood.records);
        return render(output, &nodes, |nodes, w| write_engine_nodes(nodes, w));
    }

    render_mode(
        output,
        &hood,
        |hood, w| {
            for r in &hood.records {
                writeln!(w, "{}\t{}\t{}\t{}", r.from_id, r.to_id, r.depth, r.score)?;
            }
            Ok(())
        },
        |hood, w| write_pretty(hood, w),
    )
}

fn write_engine_nodes(nodes: &[EngineNode], w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "rater_id\ttarget_id\tdepth\tscore")?;
    for n in nodes {
        writeln!(w, "{}\t{}\t{}\t{}", n.rater_id, n.target_id, n.depth, n.score)?;
    }
    Ok(())
}

fn write_pretty(hood: &Neighborhood, w: &mut dyn Write) -> std::io::Result<()> {
    if hood.is_empty() {
        return writeln!(w, "Entity {} has no ratings in either direction.", hood.center);
    }

    pretty_section(
        w,
        &format!("Rated by {} (outgoing, {})", hood.center, hood.outgoing_records),
    )?;
    for r in hood.outgoing() {
        writeln!(w, "  {:>8} → {:<8}  depth {:>3}  score {:>2}", r.from_id, r.to_id, r.depth, r.score)?;
    }
    writeln!(w)?;
    pretty_section(
        w,
        &format!("Raters of {} (incoming, {})", hood.center, hood.incoming_records),
    )?;
    for r in hood.incoming() {
        writeln!(w, "  {:>8} → {:<8}  depth {:>3}  score {:>2}", r.from_id, r.to_id, r.depth, r.score)?;
    }
    Ok(())
}
