// src/matching/title.rs
// Title matching: outcomes whose comparison keys are similar enough, subject
// to the configured parity checks, are proposed as one group.

use indicatif::ProgressBar;
use log::debug;

use crate::matching::similarity::similarity_percent;
use crate::matching::Proposal;
use crate::models::{Outcome, OutcomeStore};
use crate::utils::config::ClusteringConfig;

/// One proposal per outcome that has at least one qualifying candidate. The
/// proposal holds the outcome itself followed by its candidates in store
/// order, and carries the outcome's units as the common-units hint.
pub fn propose_title_groups(
    outcomes: &OutcomeStore,
    config: &ClusteringConfig,
    progress: Option<&ProgressBar>,
) -> Vec<Proposal> {
    let mut proposals = Vec::new();

    for outcome in outcomes {
        let mut members = vec![outcome.id.clone()];
        for candidate in outcomes {
            if candidate.id == outcome.id {
                continue;
            }
            if is_title_match(outcome, candidate, config) {
                members.push(candidate.id.clone());
            }
        }

        if members.len() > 1 {
            debug!(
                "Title match for '{}': {} candidates",
                outcome.title,
                members.len() - 1
            );
            proposals.push(Proposal::with_units(members, outcome.measure.units.clone()));
        }
        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    proposals
}

fn is_title_match(outcome: &Outcome, candidate: &Outcome, config: &ClusteringConfig) -> bool {
    let similarity = similarity_percent(&outcome.comparison_key, &candidate.comparison_key);
    if similarity < config.similarity_threshold {
        return false;
    }
    if config.units_parity_required && outcome.measure.units != candidate.measure.units {
        return false;
    }
    if config.groups_parity_required && !outcome.has_same_groups(candidate) {
        return false;
    }
    if config.classes_parity_required && !outcome.has_same_classes(candidate) {
        return false;
    }
    true
}
