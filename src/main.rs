// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

use consolidate_lib::errors::ConsolidationError;
use consolidate_lib::pipeline::run_pipeline;
use consolidate_lib::rendering::XlsxRenderer;
use consolidate_lib::utils::config::ClusteringConfig;
use consolidate_lib::utils::env::load_env;
use consolidate_lib::utils::progress_bars::progress_config::ProgressConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct ConsolidateArgs {
    /// Clinical trial results XML file; the workbook is written next to it
    input: Option<PathBuf>,

    /// Minimum title similarity, in percent, for outcomes to share a group
    #[arg(long)]
    similarity_threshold: Option<f64>,

    /// Require identical units for title matches
    #[arg(long)]
    units_parity: Option<bool>,

    /// Require identical group sets for title matches
    #[arg(long)]
    groups_parity: Option<bool>,

    /// Require identical class sets for title matches
    #[arg(long)]
    classes_parity: Option<bool>,

    /// Shared classes needed to link two outcomes
    #[arg(long)]
    class_usage_threshold: Option<usize>,

    /// Print the full outcome model before rendering
    #[arg(long)]
    debug: bool,

    /// Disable progress bars
    #[arg(long)]
    no_progress: bool,
}

impl ConsolidateArgs {
    fn clustering_config(&self, mut config: ClusteringConfig) -> ClusteringConfig {
        if let Some(threshold) = self.similarity_threshold {
            config.similarity_threshold = threshold;
        }
        if let Some(required) = self.units_parity {
            config.units_parity_required = required;
        }
        if let Some(required) = self.groups_parity {
            config.groups_parity_required = required;
        }
        if let Some(required) = self.classes_parity {
            config.classes_parity_required = required;
        }
        if let Some(threshold) = self.class_usage_threshold {
            config.common_class_usage_threshold = threshold;
        }
        if self.debug {
            config.debug = true;
        }
        config
    }
}

fn main() -> Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    load_env();

    let args = ConsolidateArgs::parse();
    let Some(input) = args.input.clone() else {
        println!("Usage: consolidate <trial-results.xml>");
        return Ok(());
    };

    let config = args.clustering_config(ClusteringConfig::from_env());
    let mut progress = ProgressConfig::from_env();
    if args.no_progress {
        progress.enabled = false;
    }

    info!("Starting outcome consolidation for {}", input.display());
    let start_time = Instant::now();
    let mut phase_times = HashMap::new();
    let renderer = XlsxRenderer::new();
    let mut console = io::stdout().lock();

    match run_pipeline(
        &input,
        config,
        progress,
        &renderer,
        &mut console,
        &mut phase_times,
    ) {
        Ok(run) => {
            info!(
                "Consolidated {} outcomes into {} render groups in {:.2?}",
                run.stats.total_outcomes,
                run.stats.total_render_groups,
                start_time.elapsed()
            );
            info!("Workbook saved to {}", run.output.display());
            Ok(())
        }
        Err(ConsolidationError::MalformedDocument { diagnostics }) => {
            drop(console);
            println!("Supplied input file is not valid XML and could not be parsed.");
            for diagnostic in &diagnostics {
                print!("{}", diagnostic.render_block());
            }
            warn!("Aborted after {} syntax errors", diagnostics.len());
            std::process::exit(1);
        }
        Err(e) => Err(e).with_context(|| format!("Failed to consolidate {}", input.display())),
    }
}
