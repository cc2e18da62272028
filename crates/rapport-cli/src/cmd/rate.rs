//! `rp rate`: record a rating and rescore around the rated entity.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use rapport_core::{NodeId, RatingEdge, RatingScore};
use rapport_score::{RecomputeReport, ScoreOrchestrator};
use serde::Serialize;

use super::{open_project, recompute, require_engine, require_entity};
use crate::output::{CliError, OutputMode, fail, render};

#[derive(Args, Debug)]
pub struct RateArgs {
    /// Entity giving the rating.
    #[arg(allow_negative_numbers = true)]
    pub rater: NodeId,

    /// Entity being rated.
    #[arg(allow_negative_numbers = true)]
    pub target: NodeId,

    /// Score from 1 to 10.
    #[arg(allow_negative_numbers = true)]
    pub score: i64,
}

#[derive(Debug, Serialize)]
struct RateReport {
    rating: RatingEdge,
    recompute: RecomputeReport,
}

/// Execute `rp rate`.
///
/// Nothing is written unless an engine is configured, the score is in range,
/// and both entities are registered. The rating write and the rescoring run
/// in sequence; if rescoring fails the rating stays recorded and the previous
/// scores stay in place.
pub fn run_rate(args: &RateArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut project = open_project(project_root, output)?;
    let engine = require_engine(&project, output)?;

    let edge = match RatingScore::new(args.score)
        .and_then(|score| RatingEdge::new(args.rater, args.target, score))
    {
        Ok(edge) => edge,
        Err(err) => return fail(output, &CliError::from(&err)),
    };
    require_entity(&project.conn, edge.rater, output)?;
    require_entity(&project.conn, edge.target, output)?;

    let settings = project.extract_settings();
    let recompute = match ScoreOrchestrator::new(&mut project.conn, engine)
        .with_settings(settings)
        .record_rating(&edge)
    {
        Ok(report) => report,
        Err(err) => return fail(output, &CliError::from(&err)),
    };

    let report = RateReport {
        rating: edge,
        recompute,
    };
    render(output, &report, |report, w| {
        writeln!(
            w,
            "✓ {} rated {} with {}",
            report.rating.rater, report.rating.target, report.rating.score
        )?;
        recompute::write_report(&report.recompute, w)
    })
}
