//! `rp scores`: persisted reputation scores, highest or lowest first.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::{Args, ValueEnum};
use rapport_core::db::query::{self, DEFAULT_SCORE_LIMIT, ScoreRow, SortOrder};

use super::open_project;
use crate::output::{OutputMode, pretty_section, render_mode};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Order {
    Asc,
    #[default]
    Desc,
}

impl From<Order> for SortOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Asc => Self::Asc,
            Order::Desc => Self::Desc,
        }
    }
}

#[derive(Args, Debug)]
pub struct ScoresArgs {
    /// Sort direction by score.
    #[arg(long, value_enum, default_value_t = Order::Desc)]
    pub order: Order,

    /// Maximum rows to show.
    #[arg(long, default_value_t = DEFAULT_SCORE_LIMIT)]
    pub limit: usize,
}

pub fn run_scores(args: &ScoresArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = open_project(project_root, output)?;
    let rows = query::list_scores(&project.conn, args.order.into(), args.limit)?;

    render_mode(
        output,
        &rows,
        |rows, w| {
            for row in rows {
                writeln!(w, "{}\t{:.4}", row.entity_id, row.score)?;
            }
            Ok(())
        },
        |rows, w| write_pretty(rows, w),
    )
}

fn write_pretty(rows: &[ScoreRow], w: &mut dyn Write) -> std::io::Result<()> {
    if rows.is_empty() {
        return writeln!(w, "No scores yet. Record a rating with `rp rate`.");
    }
    pretty_section(w, &format!("{:>4}  {:>10}  {:>12}", "#", "entity", "score"))?;
    for (rank, row) in rows.iter().enumerate() {
        writeln!(w, "{:>4}  {:>10}  {:>12.4}", rank + 1, row.entity_id, row.score)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_maps_onto_store_sort_order() {
        assert_eq!(SortOrder::from(Order::Asc), SortOrder::Asc);
        assert_eq!(SortOrder::from(Order::default()), SortOrder::Desc);
    }
}
