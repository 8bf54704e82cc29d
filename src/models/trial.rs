// src/models/trial.rs

use serde::Serialize;

use super::GroupId;

/// Descriptive fields of the trial, built once from the document header.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrialSummary {
    pub title: String,
    pub official_title: String,
    pub url: String,
    pub nct_id: String,
    pub started: String,
    pub completed: String,
}

/// A trial arm as listed in the participant flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub id: GroupId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    /// 1-based position in the period list.
    pub sequence: usize,
    pub title: String,
    /// Groups with milestone participants in this period, in natural order.
    pub group_ids: Vec<GroupId>,
}

impl Period {
    pub fn label(&self) -> String {
        format!("PERIOD{}", self.sequence)
    }
}
