// src/models/class_usage.rs

use std::collections::HashMap;

use super::{ClassId, MeasurementClass, OutcomeId, OutcomeStore};

#[derive(Debug, Clone, PartialEq)]
pub struct ClassUsageEntry {
    pub class: MeasurementClass,
    /// Outcomes reporting under this class, in extraction order, each listed once.
    pub outcomes: Vec<OutcomeId>,
}

/// Which outcomes report under each measurement class. Built once after
/// extraction and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ClassUsage {
    entries: Vec<ClassUsageEntry>,
    index: HashMap<ClassId, usize>,
}

impl ClassUsage {
    /// Indexes classes in first-seen order across `outcomes`.
    pub fn index(outcomes: &OutcomeStore) -> Self {
        let mut usage = Self::default();
        for outcome in outcomes {
            for class in &outcome.classes {
                usage.record(class, &outcome.id);
            }
        }
        usage
    }

    fn record(&mut self, class: &MeasurementClass, outcome_id: &OutcomeId) {
        let position = match self.index.get(&class.id) {
            Some(&position) => position,
            None => {
                self.index.insert(class.id.clone(), self.entries.len());
                self.entries.push(ClassUsageEntry {
                    class: class.clone(),
                    outcomes: Vec::new(),
                });
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[position];
        if !entry.outcomes.contains(outcome_id) {
            entry.outcomes.push(outcome_id.clone());
        }
    }

    pub fn entries(&self) -> &[ClassUsageEntry] {
        &self.entries
    }

    pub fn get(&self, id: &ClassId) -> Option<&ClassUsageEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
