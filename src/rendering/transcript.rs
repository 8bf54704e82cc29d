// src/rendering/transcript.rs
// Plain-text run transcript written to the console.

use std::io::{self, Write};
use std::path::Path;

use crate::clustering::render_groups::RenderGroup;
use crate::models::{Group, GroupId, Outcome, OutcomeStore, Period, TrialSummary};
use crate::utils::natural_sort::natural_sort;

pub fn write_trial_header<W: Write>(
    out: &mut W,
    origin: Option<&Path>,
    summary: &TrialSummary,
) -> io::Result<()> {
    if let Some(origin) = origin {
        writeln!(out, "Successfully opened {}", origin.display())?;
        writeln!(out)?;
    }
    writeln!(out, "Trial: {}", summary.title)
}

pub fn write_groups<W: Write>(out: &mut W, groups: &[Group]) -> io::Result<()> {
    writeln!(out, "Groups:")?;
    for group in groups {
        writeln!(out, "  [{}] {}", group.id, group.title)?;
    }
    writeln!(out)
}

/// Lists each period with the titles of the groups it references. Unknown
/// group ids are printed as-is.
pub fn write_periods<W: Write>(out: &mut W, periods: &[Period], groups: &[Group]) -> io::Result<()> {
    let title_of = |id: &GroupId| {
        groups
            .iter()
            .find(|g| &g.id == id)
            .map(|g| g.title.clone())
            .unwrap_or_else(|| id.to_string())
    };

    writeln!(out, "Periods:")?;
    for period in periods {
        writeln!(out, "  [{}] {}", period.label(), period.title)?;
        for id in &period.group_ids {
            writeln!(out, "    + {}", title_of(id))?;
        }
    }
    writeln!(out)
}

pub fn write_outcomes<W: Write>(
    out: &mut W,
    outcomes: &OutcomeStore,
    render_groups: &[RenderGroup],
) -> io::Result<()> {
    writeln!(out, "Outcomes ({}):", outcomes.len())?;
    for outcome in outcomes {
        write_outcome(out, outcome, outcomes, render_groups)?;
    }
    writeln!(out)
}

fn write_outcome<W: Write>(
    out: &mut W,
    outcome: &Outcome,
    outcomes: &OutcomeStore,
    render_groups: &[RenderGroup],
) -> io::Result<()> {
    writeln!(out, "  [{:>9}] {}", outcome.outcome_type, outcome.title)?;
    writeln!(out, "{:>14}: {}", "timeframe", outcome.timeframe)?;
    writeln!(out, "{:>14}: {}", "units", outcome.measure.units)?;
    writeln!(out, "{:>14}: {}", "param", outcome.measure.param)?;
    writeln!(out, "{:>14}: {}", "dispersion", outcome.measure.dispersion)?;
    writeln!(out)?;

    for group in &outcome.groups {
        writeln!(out, "    + {}", group.title)?;
    }
    writeln!(out)?;

    for title in outcome.class_titles() {
        writeln!(out, "    - {}", title)?;
    }
    writeln!(out)?;

    let group = outcome
        .render_group()
        .and_then(|id| render_groups.iter().find(|g| g.id() == id));
    if let Some(group) = group {
        writeln!(out, "    Render with:")?;
        writeln!(out, "      group: {}", group.id())?;
        let mut titles: Vec<&str> = group
            .outcomes()
            .iter()
            .filter_map(|id| outcomes.get(id))
            .map(|o| o.title.as_str())
            .collect();
        natural_sort(&mut titles);
        for title in titles {
            writeln!(out, "      {}", title)?;
        }
        writeln!(out)?;
    }
    Ok(())
}
