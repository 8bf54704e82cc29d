// src/test_support.rs
// Builders for outcomes that skip the XML round trip.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::extraction::comparison_key;
use crate::models::{
    AnalyzedData, GroupId, Measure, MeasurementClass, Outcome, OutcomeGroup, OutcomeId,
    OutcomeStore,
};

static NEXT_ORDINAL: AtomicUsize = AtomicUsize::new(0);

/// A primary outcome with the given groups and classes and no measurements.
pub fn outcome(title: &str, units: &str, groups: &[&str], classes: &[&str]) -> Outcome {
    let ordinal = NEXT_ORDINAL.fetch_add(1, Ordering::Relaxed);
    let mut class_list: Vec<MeasurementClass> = Vec::new();
    for title in classes {
        let class = MeasurementClass::from_title(title);
        if !class_list.iter().any(|c| c.id == class.id) {
            class_list.push(class);
        }
    }

    Outcome::new(
        OutcomeId::derive("primary", title, "12 weeks", ordinal),
        "primary".to_string(),
        title.to_string(),
        String::new(),
        String::new(),
        "12 weeks".to_string(),
        comparison_key("primary", units, title),
        Measure {
            units: units.to_string(),
            param: "Mean".to_string(),
            dispersion: "none".to_string(),
            width: 1,
            keys: Vec::new(),
            analyzed: AnalyzedData::default(),
            raw: Vec::new(),
        },
        groups
            .iter()
            .map(|id| OutcomeGroup {
                id: GroupId(id.to_string()),
                title: format!("Arm {}", id),
            })
            .collect(),
        class_list,
    )
}

pub fn store_of(outcomes: Vec<Outcome>) -> OutcomeStore {
    let mut store = OutcomeStore::new();
    for outcome in outcomes {
        store.insert(outcome).unwrap();
    }
    store
}
