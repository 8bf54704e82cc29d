// src/clustering/render_groups.rs
// Render groups and the union-merge that builds them.

use log::debug;
use serde::Serialize;

use crate::errors::{ConsolidationError, Result};
use crate::models::{OutcomeId, OutcomeStore, RenderGroupId, BASELINE_CLASS_TITLE};
use crate::utils::natural_sort::natural_cmp;

/// Outcomes rendered together on one sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderGroup {
    id: RenderGroupId,
    outcomes: Vec<OutcomeId>,
    /// Distinct class titles of all members, first-seen, "Baseline" first.
    classes: Vec<String>,
    common_units: Option<String>,
}

impl RenderGroup {
    fn new(id: RenderGroupId) -> Self {
        Self {
            id,
            outcomes: Vec::new(),
            classes: Vec::new(),
            common_units: None,
        }
    }

    pub fn id(&self) -> &RenderGroupId {
        &self.id
    }

    pub fn outcomes(&self) -> &[OutcomeId] {
        &self.outcomes
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn common_units(&self) -> Option<&str> {
        self.common_units.as_deref()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    fn add_member(&mut self, id: &OutcomeId, class_titles: impl Iterator<Item = String>) {
        if !self.outcomes.contains(id) {
            self.outcomes.push(id.clone());
        }
        for title in class_titles {
            if !self.classes.contains(&title) {
                self.classes.push(title);
            }
        }
        if let Some(position) = self.classes.iter().position(|c| c == BASELINE_CLASS_TITLE) {
            if position != 0 {
                let baseline = self.classes.remove(position);
                self.classes.insert(0, baseline);
            }
        }
    }
}

/// All live render groups, in creation order.
#[derive(Debug, Default)]
pub struct RenderGroupRegistry {
    groups: Vec<RenderGroup>,
    next_sequence: u64,
}

impl RenderGroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts `outcome_ids` into one new render group.
    ///
    /// Any group already holding one of the outcomes is absorbed: all of its
    /// members move to the new group and it is removed from the registry.
    /// A non-empty `common_units` is kept as a display hint.
    pub fn associate(
        &mut self,
        outcomes: &mut OutcomeStore,
        outcome_ids: &[OutcomeId],
        common_units: Option<&str>,
    ) -> Result<RenderGroupId> {
        if outcome_ids.is_empty() {
            return Err(ConsolidationError::PartitionViolation(
                "cannot associate an empty outcome set".to_string(),
            ));
        }
        if let Some(unknown) = outcome_ids.iter().find(|id| !outcomes.contains(id)) {
            return Err(ConsolidationError::UnknownOutcome(unknown.clone()));
        }

        let mut ordered: Vec<&OutcomeId> = outcome_ids.iter().collect();
        ordered.sort_by(|a, b| natural_cmp(&a.0, &b.0));
        ordered.dedup();

        self.next_sequence += 1;
        let id = RenderGroupId::from_sequence(self.next_sequence);
        let mut group = RenderGroup::new(id.clone());

        let mut defunct: Vec<RenderGroupId> = Vec::new();
        for outcome_id in ordered {
            let previous = move_outcome(outcomes, &mut group, outcome_id)?;
            if let Some(previous) = previous {
                if !defunct.contains(&previous) {
                    defunct.push(previous);
                }
            }
        }

        for defunct_id in &defunct {
            let Some(position) = self.groups.iter().position(|g| &g.id == defunct_id) else {
                continue;
            };
            let absorbed = self.groups.remove(position);
            for member in &absorbed.outcomes {
                move_outcome(outcomes, &mut group, member)?;
            }
            debug!(
                "{} absorbed {} ({} outcomes)",
                id,
                defunct_id,
                absorbed.outcomes.len()
            );
        }

        if let Some(units) = common_units.filter(|u| !u.is_empty()) {
            group.common_units = Some(units.to_string());
        }

        self.groups.push(group);
        Ok(id)
    }

    pub fn groups(&self) -> &[RenderGroup] {
        &self.groups
    }

    pub fn get(&self, id: &RenderGroupId) -> Option<&RenderGroup> {
        self.groups.iter().find(|g| &g.id == id)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Points the outcome at `group` and merges it in. Returns the group it
/// belonged to before, if that was a different one.
fn move_outcome(
    outcomes: &mut OutcomeStore,
    group: &mut RenderGroup,
    outcome_id: &OutcomeId,
) -> Result<Option<RenderGroupId>> {
    let outcome = outcomes
        .get_mut(outcome_id)
        .ok_or_else(|| ConsolidationError::UnknownOutcome(outcome_id.clone()))?;

    let previous = outcome
        .render_group()
        .filter(|current| **current != group.id)
        .cloned();
    outcome.assign_render_group(group.id.clone());
    group.add_member(outcome_id, outcome.class_titles().map(str::to_string));
    Ok(previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{outcome, store_of};

    fn three_outcomes() -> (OutcomeStore, Vec<OutcomeId>) {
        let store = store_of(vec![
            outcome("O1", "u", &["G1"], &["Week 1", "Baseline"]),
            outcome("O3", "u", &["G1"], &["Week 2"]),
            outcome("O4", "u", &["G1"], &["Week 1", "Week 3"]),
        ]);
        let ids = store.iter().map(|o| o.id.clone()).collect();
        (store, ids)
    }

    #[test]
    fn test_later_association_absorbs_earlier_group() {
        let (mut store, ids) = three_outcomes();
        let mut registry = RenderGroupRegistry::new();

        let first = registry
            .associate(&mut store, &[ids[0].clone(), ids[1].clone()], None)
            .unwrap();
        let second = registry
            .associate(&mut store, &[ids[1].clone(), ids[2].clone()], None)
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.get(&first).is_none());
        let merged = registry.get(&second).unwrap();
        assert_eq!(merged.len(), 3);
        for id in &ids {
            assert!(merged.outcomes().contains(id));
            assert_eq!(store.get(id).unwrap().render_group(), Some(&second));
        }
    }

    #[test]
    fn test_baseline_leads_merged_classes() {
        let (mut store, ids) = three_outcomes();
        let mut registry = RenderGroupRegistry::new();
        let id = registry.associate(&mut store, &ids, None).unwrap();

        let classes = registry.get(&id).unwrap().classes();
        assert_eq!(classes[0], "Baseline");
        assert_eq!(classes.len(), 4);
        for title in ["Week 1", "Week 2", "Week 3"] {
            assert_eq!(classes.iter().filter(|c| *c == title).count(), 1);
        }
    }

    #[test]
    fn test_members_are_deduplicated_and_naturally_ordered() {
        let (mut store, ids) = three_outcomes();
        let mut registry = RenderGroupRegistry::new();
        let id = registry
            .associate(&mut store, &[ids[2].clone(), ids[0].clone(), ids[2].clone()], None)
            .unwrap();

        let members = registry.get(&id).unwrap().outcomes();
        let mut expected = vec![ids[0].clone(), ids[2].clone()];
        expected.sort_by(|a, b| natural_cmp(&a.0, &b.0));
        assert_eq!(members, expected.as_slice());
    }

    #[test]
    fn test_common_units_hint_only_when_non_empty() {
        let (mut store, ids) = three_outcomes();
        let mut registry = RenderGroupRegistry::new();
        let a = registry.associate(&mut store, &ids[..1], Some("")).unwrap();
        let b = registry.associate(&mut store, &ids[1..2], Some("mmHg")).unwrap();
        assert_eq!(registry.get(&a).unwrap().common_units(), None);
        assert_eq!(registry.get(&b).unwrap().common_units(), Some("mmHg"));
    }

    #[test]
    fn test_registry_keeps_creation_order_and_fresh_ids() {
        let (mut store, ids) = three_outcomes();
        let mut registry = RenderGroupRegistry::new();
        let a = registry.associate(&mut store, &ids[..1], None).unwrap();
        let b = registry.associate(&mut store, &ids[1..2], None).unwrap();
        let c = registry.associate(&mut store, &ids[..1], None).unwrap();

        assert_eq!(a.0, "rendergroup-1");
        assert_eq!(c.0, "rendergroup-3");
        let order: Vec<&RenderGroupId> = registry.groups().iter().map(|g| g.id()).collect();
        assert_eq!(order, vec![&b, &c]);
    }

    #[test]
    fn test_unknown_outcome_leaves_state_untouched() {
        let (mut store, ids) = three_outcomes();
        let mut registry = RenderGroupRegistry::new();
        let missing = OutcomeId("outcome-missing".into());

        let err = registry
            .associate(&mut store, &[ids[0].clone(), missing.clone()], None)
            .unwrap_err();
        assert!(matches!(err, ConsolidationError::UnknownOutcome(id) if id == missing));
        assert!(registry.is_empty());
        assert!(store.get(&ids[0]).unwrap().render_group().is_none());
        assert!(registry.associate(&mut store, &[], None).is_err());
    }
}
