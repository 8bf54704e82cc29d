// src/models/outcome.rs
// Outcome records and the insertion-ordered store the clustering engine owns.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::{ClassId, GroupId, OutcomeId, RenderGroupId, SCALAR_CLASS_TITLE};
use crate::errors::{ConsolidationError, Result};

/// Attribute that carries the group reference on measurement and count elements.
pub const GROUP_ID_ATTRIBUTE: &str = "group_id";

/// Attributes of one `measurement` or `count` element for a single group,
/// in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMeasurement {
    pub group_id: GroupId,
    pub attributes: Vec<(String, String)>,
}

impl GroupMeasurement {
    pub fn value(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute values in order, skipping the group reference itself.
    pub fn metric_values(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|(k, _)| k != GROUP_ID_ATTRIBUTE)
            .map(|(_, v)| v.as_str())
    }
}

/// Inserts or replaces the entry for `measurement.group_id`, keeping the
/// position of the first occurrence.
pub(crate) fn upsert_measurement(entries: &mut Vec<GroupMeasurement>, measurement: GroupMeasurement) {
    match entries
        .iter_mut()
        .find(|existing| existing.group_id == measurement.group_id)
    {
        Some(existing) => *existing = measurement,
        None => entries.push(measurement),
    }
}

/// Raw values reported under one measurement class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMeasurements {
    pub class: String,
    pub data: Vec<GroupMeasurement>,
}

/// Study-wide analyzed result (participants analyzed per group).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyzedData {
    pub units: String,
    pub scope: String,
    pub data: Vec<GroupMeasurement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measure {
    pub units: String,
    pub param: String,
    pub dispersion: String,
    /// Widest measurement, in attributes excluding the group reference. At least 1.
    pub width: usize,
    /// Attribute names of the first measurement encountered. Later classes are
    /// assumed to report the same shape.
    pub keys: Vec<String>,
    pub analyzed: AnalyzedData,
    pub raw: Vec<ClassMeasurements>,
}

impl Measure {
    /// Metric labels for a group column, skipping the group reference.
    pub fn metric_keys(&self) -> impl Iterator<Item = &str> {
        self.keys
            .iter()
            .map(String::as_str)
            .filter(|k| *k != GROUP_ID_ATTRIBUTE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeGroup {
    pub id: GroupId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementClass {
    pub id: ClassId,
    pub title: String,
}

impl MeasurementClass {
    /// Unnamed classes are recorded as "Scalar".
    pub fn from_title(title: &str) -> Self {
        let title = if title.trim().is_empty() {
            SCALAR_CLASS_TITLE
        } else {
            title
        };
        Self {
            id: ClassId::from_title(title),
            title: title.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub id: OutcomeId,
    pub outcome_type: String,
    pub title: String,
    pub description: String,
    pub population: String,
    pub timeframe: String,
    /// `type/units/title`, only used for similarity testing.
    pub comparison_key: String,
    pub measure: Measure,
    pub groups: Vec<OutcomeGroup>,
    pub classes: Vec<MeasurementClass>,
    render_group: Option<RenderGroupId>,
}

impl Outcome {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: OutcomeId,
        outcome_type: String,
        title: String,
        description: String,
        population: String,
        timeframe: String,
        comparison_key: String,
        measure: Measure,
        groups: Vec<OutcomeGroup>,
        classes: Vec<MeasurementClass>,
    ) -> Self {
        Self {
            id,
            outcome_type,
            title,
            description,
            population,
            timeframe,
            comparison_key,
            measure,
            groups,
            classes,
            render_group: None,
        }
    }

    pub fn render_group(&self) -> Option<&RenderGroupId> {
        self.render_group.as_ref()
    }

    /// Only the render-group registry moves outcomes between groups.
    pub(crate) fn assign_render_group(&mut self, id: RenderGroupId) {
        self.render_group = Some(id);
    }

    pub fn class_titles(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| c.title.as_str())
    }

    pub fn has_same_groups(&self, other: &Outcome) -> bool {
        let mine: HashSet<&GroupId> = self.groups.iter().map(|g| &g.id).collect();
        let theirs: HashSet<&GroupId> = other.groups.iter().map(|g| &g.id).collect();
        mine == theirs
    }

    pub fn has_same_classes(&self, other: &Outcome) -> bool {
        let mine: HashSet<&ClassId> = self.classes.iter().map(|c| &c.id).collect();
        let theirs: HashSet<&ClassId> = other.classes.iter().map(|c| &c.id).collect();
        mine == theirs
    }
}

/// Outcomes in extraction order with an id index.
#[derive(Debug, Clone, Default)]
pub struct OutcomeStore {
    outcomes: Vec<Outcome>,
    index: HashMap<OutcomeId, usize>,
}

impl OutcomeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, outcome: Outcome) -> Result<()> {
        if self.index.contains_key(&outcome.id) {
            return Err(ConsolidationError::UnexpectedShape(format!(
                "duplicate outcome id {}",
                outcome.id
            )));
        }
        self.index.insert(outcome.id.clone(), self.outcomes.len());
        self.outcomes.push(outcome);
        Ok(())
    }

    pub fn get(&self, id: &OutcomeId) -> Option<&Outcome> {
        self.index.get(id).map(|&i| &self.outcomes[i])
    }

    pub(crate) fn get_mut(&mut self, id: &OutcomeId) -> Option<&mut Outcome> {
        match self.index.get(id) {
            Some(&i) => self.outcomes.get_mut(i),
            None => None,
        }
    }

    pub fn contains(&self, id: &OutcomeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Outcome> {
        self.outcomes.iter()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Outcomes not yet placed in a render group, in extraction order.
    pub fn ungrouped_ids(&self) -> Vec<OutcomeId> {
        self.outcomes
            .iter()
            .filter(|o| o.render_group().is_none())
            .map(|o| o.id.clone())
            .collect()
    }
}

impl<'a> IntoIterator for &'a OutcomeStore {
    type Item = &'a Outcome;
    type IntoIter = std::slice::Iter<'a, Outcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::outcome;

    #[test]
    fn test_store_preserves_insertion_order() {
        let mut store = OutcomeStore::new();
        let first = outcome("Pain", "Score", &["P1"], &["Baseline"]);
        let second = outcome("Fatigue", "Score", &["P1"], &["Baseline"]);
        let first_id = first.id.clone();
        store.insert(first).unwrap();
        store.insert(second).unwrap();

        let titles: Vec<&str> = store.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, vec!["Pain", "Fatigue"]);
        assert_eq!(store.get(&first_id).unwrap().title, "Pain");
        assert_eq!(store.ungrouped_ids().len(), 2);
    }

    #[test]
    fn test_duplicate_outcome_rejected() {
        let mut store = OutcomeStore::new();
        let a = outcome("Pain", "Score", &["P1"], &[]);
        store.insert(a.clone()).unwrap();
        assert!(store.insert(a).is_err());
    }

    #[test]
    fn test_group_and_class_parity_ignore_order() {
        let a = outcome("Pain", "Score", &["P1", "P2"], &["Week 1", "Week 2"]);
        let b = outcome("Pain", "Score", &["P2", "P1"], &["week 2", "Week 1"]);
        let c = outcome("Pain", "Score", &["P1"], &["Week 1"]);
        assert!(a.has_same_groups(&b));
        assert!(a.has_same_classes(&b));
        assert!(!a.has_same_groups(&c));
        assert!(!a.has_same_classes(&c));
    }

    #[test]
    fn test_unnamed_class_is_scalar() {
        let class = MeasurementClass::from_title("  ");
        assert_eq!(class.title, "Scalar");
        assert_eq!(class.id, MeasurementClass::from_title("scalar").id);
    }

    #[test]
    fn test_metric_values_skip_group_reference() {
        let m = GroupMeasurement {
            group_id: GroupId("O1".into()),
            attributes: vec![
                ("group_id".into(), "O1".into()),
                ("value".into(), "12.5".into()),
                ("spread".into(), "3.1".into()),
            ],
        };
        assert_eq!(m.metric_values().collect::<Vec<_>>(), vec!["12.5", "3.1"]);
        assert_eq!(m.value("spread"), Some("3.1"));
    }
}
