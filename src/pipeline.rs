// src/pipeline.rs
// Load, extract, cluster and render one trial results document.

use log::info;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::clustering::engine::ClusteringEngine;
use crate::document::XmlDocument;
use crate::errors::{ConsolidationError, Result};
use crate::extraction::extract_trial;
use crate::models::stats::ClusteringStats;
use crate::models::Outcome;
use crate::rendering::transcript;
use crate::rendering::{Report, ReportRenderer};
use crate::utils::config::ClusteringConfig;
use crate::utils::progress_bars::logging::log_pipeline_summary;
use crate::utils::progress_bars::progress_config::ProgressConfig;

const OUTPUT_EXTENSION: &str = "xlsx";

#[derive(Debug)]
pub struct PipelineRun {
    pub output: PathBuf,
    pub stats: ClusteringStats,
}

/// `<input>.xlsx`, appending to whatever extension the input already has.
pub fn output_path(input: &Path) -> PathBuf {
    let mut path: OsString = input.as_os_str().to_owned();
    path.push(".");
    path.push(OUTPUT_EXTENSION);
    PathBuf::from(path)
}

/// Runs every phase, writing the transcript to `console`. Durations are
/// recorded per phase in `phase_times`.
pub fn run_pipeline<W: Write>(
    input: &Path,
    config: ClusteringConfig,
    progress: ProgressConfig,
    renderer: &dyn ReportRenderer,
    console: &mut W,
    phase_times: &mut HashMap<String, Duration>,
) -> Result<PipelineRun> {
    config.log_config();
    let debug_dump = config.debug;

    info!("Phase 1: Document extraction starting...");
    let phase1_start = Instant::now();
    let document = XmlDocument::load(input)?;
    let trial = extract_trial(&document)?;
    console_io(|| {
        transcript::write_trial_header(console, document.origin(), &trial.summary)?;
        transcript::write_groups(console, &trial.groups)?;
        transcript::write_periods(console, &trial.periods, &trial.groups)
    })?;
    let phase1_duration = phase1_start.elapsed();
    phase_times.insert("extraction".to_string(), phase1_duration);
    info!(
        "Extracted {} outcomes in {:.2?}. Phase 1 complete.",
        trial.outcomes.len(),
        phase1_duration
    );

    info!("Phase 2: Outcome clustering starting...");
    let phase2_start = Instant::now();
    let mut engine = ClusteringEngine::new(config, trial.outcomes, trial.class_usage)?
        .with_progress(progress);
    let stats = engine.run()?;
    let phase2_duration = phase2_start.elapsed();
    phase_times.insert("clustering".to_string(), phase2_duration);
    info!(
        "Formed {} render groups in {:.2?}. Phase 2 complete.",
        stats.total_render_groups, phase2_duration
    );

    if debug_dump {
        let outcomes: Vec<&Outcome> = engine.outcomes().iter().collect();
        let dump = serde_json::to_string_pretty(&outcomes)?;
        console_io(|| writeln!(console, "{}\n", dump))?;
    }
    console_io(|| transcript::write_outcomes(console, engine.outcomes(), engine.render_groups()))?;

    info!("Phase 3: Workbook rendering starting...");
    let phase3_start = Instant::now();
    let output = output_path(input);
    let report = Report {
        summary: &trial.summary,
        render_groups: engine.render_groups(),
        outcomes: engine.outcomes(),
    };
    renderer.render(&report, &output)?;
    let phase3_duration = phase3_start.elapsed();
    phase_times.insert("rendering".to_string(), phase3_duration);
    info!("Wrote {} in {:.2?}. Phase 3 complete.", output.display(), phase3_duration);

    log_pipeline_summary(&stats);
    Ok(PipelineRun { output, stats })
}

fn console_io<F>(write: F) -> Result<()>
where
    F: FnOnce() -> io::Result<()>,
{
    write().map_err(|source| ConsolidationError::Io {
        path: PathBuf::from("<console>"),
        source,
    })
}
