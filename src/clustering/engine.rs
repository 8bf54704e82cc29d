// src/clustering/engine.rs
// Owns all clustering state for one run and applies the matching passes.

use log::info;
use std::collections::HashSet;
use std::time::Instant;

use crate::clustering::render_groups::{RenderGroup, RenderGroupRegistry};
use crate::errors::{ConsolidationError, Result};
use crate::matching::class_usage::{
    count_shared_classes, propose_shared_class_pairs, SharedClassCounts,
};
use crate::matching::title::propose_title_groups;
use crate::matching::Proposal;
use crate::models::stats::{ClusteringStats, MatchMethod, MatchMethodStats};
use crate::models::{ClassUsage, OutcomeId, OutcomeStore, RenderGroupId};
use crate::utils::config::ClusteringConfig;
use crate::utils::progress_bars::logging::MatchingLogger;
use crate::utils::progress_bars::progress_config::ProgressConfig;

pub struct ClusteringEngine {
    config: ClusteringConfig,
    outcomes: OutcomeStore,
    class_usage: ClassUsage,
    registry: RenderGroupRegistry,
    progress: ProgressConfig,
}

impl ClusteringEngine {
    /// Takes ownership of the extracted outcomes. Fails when the config is out
    /// of range.
    pub fn new(
        config: ClusteringConfig,
        outcomes: OutcomeStore,
        class_usage: ClassUsage,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            outcomes,
            class_usage,
            registry: RenderGroupRegistry::new(),
            progress: ProgressConfig::disabled(),
        })
    }

    pub fn with_progress(mut self, progress: ProgressConfig) -> Self {
        self.progress = progress;
        self
    }

    pub fn outcomes(&self) -> &OutcomeStore {
        &self.outcomes
    }

    pub fn render_groups(&self) -> &[RenderGroup] {
        self.registry.groups()
    }

    pub fn registry(&self) -> &RenderGroupRegistry {
        &self.registry
    }

    pub fn associate(
        &mut self,
        outcome_ids: &[OutcomeId],
        common_units: Option<&str>,
    ) -> Result<RenderGroupId> {
        self.registry
            .associate(&mut self.outcomes, outcome_ids, common_units)
    }

    /// Title pass, then class-usage pass, then a singleton group for every
    /// outcome left over. Verifies the result is a partition.
    pub fn run(&mut self) -> Result<ClusteringStats> {
        let start = Instant::now();
        let mut stats = ClusteringStats::new(self.outcomes.len());
        info!("Associating similar outcomes...");

        stats.method_stats.push(self.match_by_titles()?);
        stats.method_stats.push(self.match_by_class_usage()?);
        stats.method_stats.push(self.collect_singletons()?);
        self.verify_partition()?;

        stats.total_render_groups = self.registry.len();
        stats.singleton_groups = self
            .registry
            .groups()
            .iter()
            .filter(|g| g.len() == 1)
            .count();
        stats.clustering_time = start.elapsed();
        Ok(stats)
    }

    pub fn match_by_titles(&mut self) -> Result<MatchMethodStats> {
        let start = Instant::now();
        let logger = MatchingLogger::new(MatchMethod::TitleSimilarity);
        logger.log_start(self.outcomes.len());

        let pb = self
            .progress
            .create_progress_bar(self.outcomes.len() as u64, "Comparing outcome titles");
        let proposals = propose_title_groups(&self.outcomes, &self.config, pb.as_ref());
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        let mut stats = MatchMethodStats::new(MatchMethod::TitleSimilarity);
        stats.proposals = proposals.len();
        stats.associations = self.apply(&logger, proposals)?;
        stats.elapsed = start.elapsed();
        logger.log_completion(&stats);
        Ok(stats)
    }

    /// Shared-class counters against the current grouping. Pure read.
    pub fn shared_class_counts(&self) -> SharedClassCounts {
        count_shared_classes(&self.class_usage, &self.outcomes)
    }

    pub fn match_by_class_usage(&mut self) -> Result<MatchMethodStats> {
        let start = Instant::now();
        let logger = MatchingLogger::new(MatchMethod::ClassUsage);
        logger.log_start(self.outcomes.len());

        let counts = self.shared_class_counts();
        logger.log_phase(
            "counting",
            Some(&format!("{} outcome pairs share classes", counts.len())),
        );
        let proposals =
            propose_shared_class_pairs(&counts, self.config.common_class_usage_threshold);

        let mut stats = MatchMethodStats::new(MatchMethod::ClassUsage);
        stats.proposals = proposals.len();
        stats.associations = self.apply(&logger, proposals)?;
        stats.elapsed = start.elapsed();
        logger.log_completion(&stats);
        Ok(stats)
    }

    /// Gives every outcome still without a render group one of its own.
    pub fn collect_singletons(&mut self) -> Result<MatchMethodStats> {
        let start = Instant::now();
        let logger = MatchingLogger::new(MatchMethod::Singleton);

        let proposals: Vec<Proposal> = self
            .outcomes
            .ungrouped_ids()
            .into_iter()
            .map(|id| Proposal::new(vec![id]))
            .collect();

        let mut stats = MatchMethodStats::new(MatchMethod::Singleton);
        stats.proposals = proposals.len();
        stats.associations = self.apply(&logger, proposals)?;
        stats.elapsed = start.elapsed();
        logger.log_completion(&stats);
        Ok(stats)
    }

    fn apply(&mut self, logger: &MatchingLogger, proposals: Vec<Proposal>) -> Result<usize> {
        let mut applied = 0;
        for proposal in proposals {
            let id = self.associate(&proposal.outcome_ids, proposal.common_units.as_deref())?;
            logger.log_association(proposal.outcome_ids.len(), &id.0);
            applied += 1;
        }
        Ok(applied)
    }

    /// Every outcome sits in exactly one live render group, and that group
    /// lists it.
    pub fn verify_partition(&self) -> Result<()> {
        let mut seen: HashSet<&OutcomeId> = HashSet::new();
        for group in self.registry.groups() {
            for member in group.outcomes() {
                if !seen.insert(member) {
                    return Err(ConsolidationError::PartitionViolation(format!(
                        "outcome {} appears in more than one render group",
                        member
                    )));
                }
                let pointer = self
                    .outcomes
                    .get(member)
                    .ok_or_else(|| ConsolidationError::UnknownOutcome(member.clone()))?
                    .render_group();
                if pointer != Some(group.id()) {
                    return Err(ConsolidationError::PartitionViolation(format!(
                        "outcome {} is listed in {} but points elsewhere",
                        member,
                        group.id()
                    )));
                }
            }
        }

        if let Some(orphan) = self.outcomes.iter().find(|o| !seen.contains(&o.id)) {
            return Err(ConsolidationError::PartitionViolation(format!(
                "outcome {} ('{}') has no render group",
                orphan.id, orphan.title
            )));
        }
        Ok(())
    }
}
