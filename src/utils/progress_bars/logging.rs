// src/utils/progress_bars/logging.rs - Logging helpers for the matching passes
use log::{debug, info};
use std::time::Instant;

use crate::models::stats::{ClusteringStats, MatchMethod, MatchMethodStats};

#[derive(Clone)]
pub struct MatchingLogger {
    method_name: &'static str,
    start_time: Instant,
}

impl MatchingLogger {
    pub fn new(method: MatchMethod) -> Self {
        Self {
            method_name: method.label(),
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, outcome_count: usize) {
        info!(
            "[{}] Starting {} matching over {} outcomes",
            self.method_name,
            self.method_name.to_lowercase(),
            outcome_count
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        match details {
            Some(details) => info!(
                "[{}] Phase: {} - {} [+{:.1}s]",
                self.method_name,
                phase,
                details,
                elapsed.as_secs_f32()
            ),
            None => info!(
                "[{}] Phase: {} [+{:.1}s]",
                self.method_name,
                phase,
                elapsed.as_secs_f32()
            ),
        }
    }

    pub fn log_association(&self, members: usize, group_id: &str) {
        debug!(
            "[{}] Associated {} outcomes into {}",
            self.method_name, members, group_id
        );
    }

    pub fn log_completion(&self, stats: &MatchMethodStats) {
        info!(
            "[{}] Completed: {} proposals, {} associations in {:.2?}",
            self.method_name, stats.proposals, stats.associations, stats.elapsed
        );
    }
}

/// Logs the end-of-run summary.
pub fn log_pipeline_summary(stats: &ClusteringStats) {
    info!("=== Consolidation Summary ===");
    info!("Run started: {}", stats.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    info!("Total outcomes: {}", stats.total_outcomes);
    info!("Total render groups: {}", stats.total_render_groups);
    info!(
        "Outcomes sharing a group: {}",
        stats.total_outcomes.saturating_sub(stats.singleton_groups)
    );
    info!("=== Method Statistics ===");
    for method_stat in &stats.method_stats {
        info!(
            "{}: {} proposals, {} associations, {:.2?}",
            method_stat.method.label(),
            method_stat.proposals,
            method_stat.associations,
            method_stat.elapsed
        );
    }
    info!("Total clustering time: {:.2?}", stats.clustering_time);
}
