// src/matching/mod.rs
// Matchers read the outcome set and propose sets of outcomes to render
// together. Applying proposals is left to the clustering engine.
pub mod class_usage;
pub mod similarity;
pub mod title;

use crate::models::OutcomeId;

#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub outcome_ids: Vec<OutcomeId>,
    /// Units every member reports, carried to the render group as a display hint.
    pub common_units: Option<String>,
}

impl Proposal {
    pub fn new(outcome_ids: Vec<OutcomeId>) -> Self {
        Self {
            outcome_ids,
            common_units: None,
        }
    }

    pub fn with_units(outcome_ids: Vec<OutcomeId>, units: impl Into<String>) -> Self {
        Self {
            outcome_ids,
            common_units: Some(units.into()),
        }
    }
}
