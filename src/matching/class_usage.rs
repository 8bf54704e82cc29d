// src/matching/class_usage.rs
// Class-usage correlation: outcomes that report under enough of the same
// measurement classes are linked, whatever their titles say.

use log::debug;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::matching::Proposal;
use crate::models::{ClassUsage, ClassUsageEntry, OutcomeId, OutcomeStore};
use crate::utils::natural_sort::natural_cmp;

/// Two distinct outcomes, stored in natural id order so `(a, b)` and
/// `(b, a)` are the same pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutcomePair(OutcomeId, OutcomeId);

impl OutcomePair {
    pub fn new(a: OutcomeId, b: OutcomeId) -> Self {
        match natural_cmp(&a.0, &b.0) {
            Ordering::Greater => OutcomePair(b, a),
            _ => OutcomePair(a, b),
        }
    }

    pub fn first(&self) -> &OutcomeId {
        &self.0
    }

    pub fn second(&self) -> &OutcomeId {
        &self.1
    }
}

/// Shared-class counters per outcome pair, in the order pairs were first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedClassCounts {
    pairs: Vec<(OutcomePair, usize)>,
    index: HashMap<OutcomePair, usize>,
}

impl SharedClassCounts {
    fn increment(&mut self, pair: OutcomePair) {
        match self.index.get(&pair) {
            Some(&position) => self.pairs[position].1 += 1,
            None => {
                self.index.insert(pair.clone(), self.pairs.len());
                self.pairs.push((pair, 1));
            }
        }
    }

    pub fn count(&self, a: &OutcomeId, b: &OutcomeId) -> usize {
        let pair = OutcomePair::new(a.clone(), b.clone());
        self.index.get(&pair).map(|&i| self.pairs[i].1).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OutcomePair, usize)> {
        self.pairs.iter().map(|(pair, count)| (pair, *count))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Counts, for every pair of outcomes, how many classes they both use.
///
/// Classes used by a single outcome are ignored, as are classes whose users
/// already all sit in one render group. Only reads the store, so repeated
/// calls against unchanged state return identical counts.
pub fn count_shared_classes(usage: &ClassUsage, outcomes: &OutcomeStore) -> SharedClassCounts {
    let mut counts = SharedClassCounts::default();

    for entry in usage.entries() {
        if entry.outcomes.len() < 2 {
            continue;
        }
        if is_consolidated(entry, outcomes) {
            debug!("Class '{}' already consolidated, skipping", entry.class.title);
            continue;
        }
        for (i, a) in entry.outcomes.iter().enumerate() {
            for b in &entry.outcomes[i + 1..] {
                counts.increment(OutcomePair::new(a.clone(), b.clone()));
            }
        }
    }

    counts
}

/// True when every user of the class is grouped and all share one group.
fn is_consolidated(entry: &ClassUsageEntry, outcomes: &OutcomeStore) -> bool {
    let mut groups = entry
        .outcomes
        .iter()
        .map(|id| outcomes.get(id).and_then(|o| o.render_group()));
    let first = match groups.next() {
        Some(Some(group)) => group,
        _ => return false,
    };
    groups.all(|group| group == Some(first))
}

/// Pairs whose shared-class count reaches `threshold`, in first-seen order.
pub fn propose_shared_class_pairs(counts: &SharedClassCounts, threshold: usize) -> Vec<Proposal> {
    counts
        .iter()
        .filter(|(_, count)| *count >= threshold)
        .map(|(pair, _)| Proposal::new(vec![pair.first().clone(), pair.second().clone()]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RenderGroupId;
    use crate::test_support::{outcome, store_of};

    #[test]
    fn test_pair_is_unordered() {
        let a = OutcomeId("outcome-2".into());
        let b = OutcomeId("outcome-10".into());
        let pair = OutcomePair::new(b.clone(), a.clone());
        assert_eq!(pair, OutcomePair::new(a.clone(), b.clone()));
        assert_eq!(pair.first(), &a);
        assert_eq!(pair.second(), &b);
    }

    #[test]
    fn test_shared_classes_reach_threshold() {
        // Titles far apart, three classes in common.
        let o3 = outcome("Hemoglobin A1c", "percent", &["G1"], &["Week 4", "Week 8", "Week 12"]);
        let o4 = outcome("Fasting glucose", "mg/dL", &["G1"], &["Week 4", "Week 8", "Week 12", "Week 24"]);
        let o5 = outcome("Body weight", "kg", &["G1"], &["Week 4"]);
        let (o3_id, o4_id, o5_id) = (o3.id.clone(), o4.id.clone(), o5.id.clone());
        let store = store_of(vec![o3, o4, o5]);
        let usage = ClassUsage::index(&store);

        let counts = count_shared_classes(&usage, &store);
        assert_eq!(counts.count(&o3_id, &o4_id), 3);
        assert_eq!(counts.count(&o4_id, &o3_id), 3);
        assert_eq!(counts.count(&o3_id, &o5_id), 1);

        let proposals = propose_shared_class_pairs(&counts, 2);
        assert_eq!(proposals.len(), 1);
        let mut members = proposals[0].outcome_ids.clone();
        members.sort_by(|a, b| a.0.cmp(&b.0));
        let mut expected = vec![o3_id, o4_id];
        expected.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(members, expected);
        assert!(proposals[0].common_units.is_none());
    }

    #[test]
    fn test_anonymous_classes_correlate_as_scalar() {
        let a = outcome("Alpha", "x", &["G1"], &["", "Week 1"]);
        let b = outcome("Omega", "y", &["G2"], &["  ", "Week 1"]);
        let store = store_of(vec![a, b]);
        let usage = ClassUsage::index(&store);
        assert_eq!(usage.entries()[0].class.title, "Scalar");

        let counts = count_shared_classes(&usage, &store);
        assert_eq!(propose_shared_class_pairs(&counts, 2).len(), 1);
        assert!(propose_shared_class_pairs(&counts, 3).is_empty());
    }

    #[test]
    fn test_counting_is_repeatable() {
        let store = store_of(vec![
            outcome("A", "u", &["G1"], &["C1", "C2"]),
            outcome("B", "u", &["G1"], &["C1", "C2"]),
            outcome("C", "u", &["G1"], &["C2"]),
        ]);
        let usage = ClassUsage::index(&store);
        let first = count_shared_classes(&usage, &store);
        let second = count_shared_classes(&usage, &store);
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_consolidated_classes_are_skipped() {
        let mut store = store_of(vec![
            outcome("A", "u", &["G1"], &["C1", "C2"]),
            outcome("B", "u", &["G1"], &["C1", "C2"]),
            outcome("C", "u", &["G1"], &["C2"]),
        ]);
        let ids: Vec<OutcomeId> = store.iter().map(|o| o.id.clone()).collect();
        let group = RenderGroupId::from_sequence(1);
        for id in &ids[..2] {
            store.get_mut(id).unwrap().assign_render_group(group.clone());
        }
        let usage = ClassUsage::index(&store);

        let counts = count_shared_classes(&usage, &store);
        // C1 is fully inside one group; C2 still has an ungrouped user.
        assert_eq!(counts.count(&ids[0], &ids[1]), 1);
        assert_eq!(counts.count(&ids[0], &ids[2]), 1);
        assert_eq!(counts.count(&ids[1], &ids[2]), 1);
    }
}
