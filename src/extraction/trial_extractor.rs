// src/extraction/trial_extractor.rs
// Builds the typed trial model from a parsed results document.

use log::{debug, info, warn};
use std::collections::HashSet;

use crate::document::{XmlDocument, XmlNode};
use crate::errors::{ConsolidationError, Result};
use crate::extraction::comparison_key;
use crate::models::outcome::{upsert_measurement, GROUP_ID_ATTRIBUTE};
use crate::models::{
    AnalyzedData, ClassMeasurements, ClassUsage, Group, GroupId, GroupMeasurement, Measure,
    MeasurementClass, Outcome, OutcomeGroup, OutcomeId, OutcomeStore, Period, TrialSummary,
};
use crate::utils::natural_sort::natural_sort;

const GROUPS_PATH: &str = "clinical_results/participant_flow/group_list/group";
const PERIODS_PATH: &str = "clinical_results/participant_flow/period_list/period";
const OUTCOMES_PATH: &str = "clinical_results/outcome_list/outcome";

/// Dispersion recorded when the measure does not name one.
pub const NO_DISPERSION: &str = "none";

/// Everything read from one results document.
#[derive(Debug, Clone)]
pub struct ExtractedTrial {
    pub summary: TrialSummary,
    pub groups: Vec<Group>,
    pub periods: Vec<Period>,
    pub outcomes: OutcomeStore,
    pub class_usage: ClassUsage,
}

impl ExtractedTrial {
    pub fn group_title(&self, id: &GroupId) -> Option<&str> {
        self.groups
            .iter()
            .find(|g| &g.id == id)
            .map(|g| g.title.as_str())
    }
}

pub fn extract_trial(document: &XmlDocument) -> Result<ExtractedTrial> {
    let root = document.root();

    let summary = extract_summary(root);
    let groups = extract_groups(root);
    let periods = extract_periods(root, &groups);

    let mut outcomes = OutcomeStore::new();
    for (ordinal, node) in root.select(OUTCOMES_PATH).into_iter().enumerate() {
        let outcome = extract_outcome(node, ordinal)?;
        debug!(
            "Extracted outcome {} '{}' ({} classes)",
            ordinal,
            outcome.title,
            outcome.classes.len()
        );
        outcomes.insert(outcome)?;
    }

    let class_usage = ClassUsage::index(&outcomes);
    info!(
        "Extracted {} groups, {} periods, {} outcomes using {} distinct classes",
        groups.len(),
        periods.len(),
        outcomes.len(),
        class_usage.len()
    );

    Ok(ExtractedTrial {
        summary,
        groups,
        periods,
        outcomes,
        class_usage,
    })
}

fn extract_summary(root: &XmlNode) -> TrialSummary {
    let nested = |parent: &str, name: &str| {
        root.child(parent)
            .map(|p| p.child_text(name).to_string())
            .unwrap_or_default()
    };

    TrialSummary {
        title: root.child_text("brief_title").to_string(),
        official_title: root.child_text("official_title").to_string(),
        url: nested("required_header", "url"),
        nct_id: nested("id_info", "nct_id"),
        started: root.child_text("start_date").to_string(),
        completed: root.child_text("completion_date").to_string(),
    }
}

fn extract_groups(root: &XmlNode) -> Vec<Group> {
    root.select(GROUPS_PATH)
        .into_iter()
        .map(|node| Group {
            id: GroupId(node.attr(GROUP_ID_ATTRIBUTE).unwrap_or_default().to_string()),
            title: node.child_text("title").to_string(),
        })
        .collect()
}

fn extract_periods(root: &XmlNode, groups: &[Group]) -> Vec<Period> {
    root.select(PERIODS_PATH)
        .into_iter()
        .enumerate()
        .map(|(index, node)| {
            let mut seen: HashSet<&str> = HashSet::new();
            let mut ids: Vec<&str> = Vec::new();
            for milestone in node.select(".//milestone") {
                for participants in milestone.select(".//participants") {
                    if let Some(id) = participants.attr(GROUP_ID_ATTRIBUTE) {
                        if !id.is_empty() && seen.insert(id) {
                            ids.push(id);
                        }
                    }
                }
            }
            natural_sort(&mut ids);

            let period = Period {
                sequence: index + 1,
                title: node.child_text("title").to_string(),
                group_ids: ids.into_iter().map(|id| GroupId(id.to_string())).collect(),
            };
            for id in &period.group_ids {
                if !groups.iter().any(|g| &g.id == id) {
                    warn!("{} references unknown group {}", period.label(), id);
                }
            }
            period
        })
        .collect()
}

fn extract_outcome(node: &XmlNode, ordinal: usize) -> Result<Outcome> {
    let outcome_type = node.child_text("type").to_lowercase();
    let title = node.child_text("title").to_string();
    let timeframe = node.child_text("time_frame").to_string();

    let measure_node = node.child("measure").ok_or_else(|| {
        ConsolidationError::UnexpectedShape(format!("outcome '{}' has no measure block", title))
    })?;

    let units = measure_node.child_text("units").to_string();
    let dispersion = match measure_node.child_text("dispersion") {
        "" => NO_DISPERSION.to_string(),
        value => value.to_lowercase(),
    };

    let mut groups: Vec<OutcomeGroup> = Vec::new();
    for group in node.select(".//group_list/group") {
        let entry = OutcomeGroup {
            id: GroupId(group.attr(GROUP_ID_ATTRIBUTE).unwrap_or_default().to_string()),
            title: group.child_text("title").to_string(),
        };
        match groups.iter_mut().find(|g| g.id == entry.id) {
            Some(existing) => *existing = entry,
            None => groups.push(entry),
        }
    }

    let mut classes: Vec<MeasurementClass> = Vec::new();
    let mut raw: Vec<ClassMeasurements> = Vec::new();
    let mut keys: Vec<String> = Vec::new();
    let mut width = 1;

    for class_node in measure_node.select(".//class_list/class") {
        let class = MeasurementClass::from_title(class_node.child_text("title"));

        let mut data: Vec<GroupMeasurement> = Vec::new();
        for measurement in class_node.select(".//measurement_list/measurement") {
            let measurement = group_measurement(measurement);
            width = width.max(measurement.attributes.len().saturating_sub(1));
            if keys.is_empty() {
                keys = measurement.attributes.iter().map(|(k, _)| k.clone()).collect();
            }
            upsert_measurement(&mut data, measurement);
        }

        raw.push(ClassMeasurements {
            class: class.title.clone(),
            data,
        });
        if !classes.iter().any(|c| c.id == class.id) {
            classes.push(class);
        }
    }

    let analyzed_node = measure_node
        .select("analyzed_list/analyzed")
        .into_iter()
        .next()
        .ok_or_else(|| {
            ConsolidationError::UnexpectedShape(format!(
                "measure of outcome '{}' has no analyzed block",
                title
            ))
        })?;

    let mut analyzed = AnalyzedData {
        units: analyzed_node.child_text("units").to_string(),
        scope: analyzed_node.child_text("scope").to_string(),
        data: Vec::new(),
    };
    for count in analyzed_node.select(".//count") {
        upsert_measurement(&mut analyzed.data, group_measurement(count));
    }

    Ok(Outcome::new(
        OutcomeId::derive(&outcome_type, &title, &timeframe, ordinal),
        outcome_type.clone(),
        title.clone(),
        node.child_text("description").to_string(),
        node.child_text("population").to_string(),
        timeframe,
        comparison_key(&outcome_type, &units, &title),
        Measure {
            units,
            param: measure_node.child_text("param").to_string(),
            dispersion,
            width,
            keys,
            analyzed,
            raw,
        },
        groups,
        classes,
    ))
}

fn group_measurement(node: &XmlNode) -> GroupMeasurement {
    GroupMeasurement {
        group_id: GroupId(node.attr(GROUP_ID_ATTRIBUTE).unwrap_or_default().to_string()),
        attributes: node.attributes.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClassId;

    const TRIAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<clinical_study>
  <required_header>
    <url>https://clinicaltrials.gov/show/NCT00000001</url>
  </required_header>
  <id_info><nct_id>NCT00000001</nct_id></id_info>
  <brief_title>Drug X for Chronic Pain</brief_title>
  <official_title>A Randomized Study of Drug X</official_title>
  <start_date>January 2010</start_date>
  <completion_date>March 2012</completion_date>
  <clinical_results>
    <participant_flow>
      <group_list>
        <group group_id="P1"><title>Placebo</title></group>
        <group group_id="P2"><title>Drug X</title></group>
      </group_list>
      <period_list>
        <period>
          <title>Overall Study</title>
          <milestone_list>
            <milestone>
              <title>STARTED</title>
              <participants_list>
                <participants group_id="P2" count="40"/>
                <participants group_id="P1" count="41"/>
              </participants_list>
            </milestone>
            <milestone>
              <title>COMPLETED</title>
              <participants_list>
                <participants group_id="P1" count="38"/>
              </participants_list>
            </milestone>
          </milestone_list>
        </period>
      </period_list>
    </participant_flow>
    <outcome_list>
      <outcome>
        <type>Primary</type>
        <title>Pain Score</title>
        <description>VAS pain</description>
        <time_frame>12 weeks</time_frame>
        <population>ITT</population>
        <group_list>
          <group group_id="O1"><title>Placebo</title></group>
          <group group_id="O2"><title>Drug X</title></group>
        </group_list>
        <measure>
          <title>Pain Score</title>
          <units>units on a scale</units>
          <param>Mean</param>
          <dispersion>Standard Deviation</dispersion>
          <analyzed_list>
            <analyzed>
              <units>Participants</units>
              <scope>Measure</scope>
              <count_list>
                <count group_id="O1" value="41"/>
                <count group_id="O2" value="40"/>
              </count_list>
            </analyzed>
          </analyzed_list>
          <class_list>
            <class>
              <title>Baseline</title>
              <category_list><category><measurement_list>
                <measurement group_id="O1" value="6.1" spread="1.2"/>
                <measurement group_id="O2" value="6.3" spread="1.1"/>
                <measurement group_id="O2" value="6.4" spread="1.0"/>
              </measurement_list></category></category_list>
            </class>
            <class>
              <category_list><category><measurement_list>
                <measurement group_id="O1" value="5.0" lower_limit="4.1" upper_limit="5.9"/>
              </measurement_list></category></category_list>
            </class>
          </class_list>
        </measure>
      </outcome>
      <outcome>
        <type>Secondary</type>
        <title>Responders</title>
        <time_frame>12 weeks</time_frame>
        <group_list><group group_id="O1"><title>Placebo</title></group></group_list>
        <measure>
          <units>participants</units>
          <param>Number</param>
          <analyzed_list><analyzed><count_list>
            <count group_id="O1" value="41"/>
          </count_list></analyzed></analyzed_list>
        </measure>
      </outcome>
    </outcome_list>
  </clinical_results>
</clinical_study>"#;

    fn extract(text: &str) -> Result<ExtractedTrial> {
        extract_trial(&XmlDocument::parse(text)?)
    }

    #[test]
    fn test_summary_groups_and_periods() {
        let trial = extract(TRIAL).unwrap();
        assert_eq!(trial.summary.title, "Drug X for Chronic Pain");
        assert_eq!(trial.summary.official_title, "A Randomized Study of Drug X");
        assert_eq!(trial.summary.url, "https://clinicaltrials.gov/show/NCT00000001");
        assert_eq!(trial.summary.nct_id, "NCT00000001");
        assert_eq!(trial.summary.started, "January 2010");
        assert_eq!(trial.summary.completed, "March 2012");

        assert_eq!(trial.groups.len(), 2);
        assert_eq!(trial.group_title(&GroupId("P2".into())), Some("Drug X"));

        assert_eq!(trial.periods.len(), 1);
        let period = &trial.periods[0];
        assert_eq!(period.label(), "PERIOD1");
        assert_eq!(period.title, "Overall Study");
        assert_eq!(
            period.group_ids,
            vec![GroupId("P1".into()), GroupId("P2".into())]
        );
    }

    #[test]
    fn test_outcome_fields_and_measure() {
        let trial = extract(TRIAL).unwrap();
        assert_eq!(trial.outcomes.len(), 2);

        let pain = trial.outcomes.iter().next().unwrap();
        assert_eq!(pain.outcome_type, "primary");
        assert_eq!(pain.title, "Pain Score");
        assert_eq!(pain.description, "VAS pain");
        assert_eq!(pain.population, "ITT");
        assert_eq!(pain.timeframe, "12 weeks");
        assert_eq!(pain.comparison_key, "primary/units on a scale/Pain Score");
        assert!(pain.render_group().is_none());

        let measure = &pain.measure;
        assert_eq!(measure.param, "Mean");
        assert_eq!(measure.dispersion, "standard deviation");
        assert_eq!(measure.width, 3);
        assert_eq!(measure.keys, vec!["group_id", "value", "spread"]);
        assert_eq!(measure.metric_keys().collect::<Vec<_>>(), vec!["value", "spread"]);

        assert_eq!(measure.analyzed.units, "Participants");
        assert_eq!(measure.analyzed.scope, "Measure");
        assert_eq!(measure.analyzed.data.len(), 2);
        assert_eq!(measure.analyzed.data[1].value("value"), Some("40"));

        let titles: Vec<&str> = pain.class_titles().collect();
        assert_eq!(titles, vec!["Baseline", "Scalar"]);
        assert_eq!(measure.raw.len(), 2);
        assert_eq!(measure.raw[1].class, "Scalar");
    }

    #[test]
    fn test_later_measurement_for_group_replaces_earlier() {
        let trial = extract(TRIAL).unwrap();
        let pain = trial.outcomes.iter().next().unwrap();
        let baseline = &pain.measure.raw[0];
        assert_eq!(baseline.data.len(), 2);
        assert_eq!(baseline.data[1].group_id, GroupId("O2".into()));
        assert_eq!(baseline.data[1].value("value"), Some("6.4"));
    }

    #[test]
    fn test_defaults_for_missing_optional_fields() {
        let trial = extract(TRIAL).unwrap();
        let responders = trial.outcomes.iter().nth(1).unwrap();
        assert_eq!(responders.measure.dispersion, "none");
        assert_eq!(responders.description, "");
        assert_eq!(responders.measure.width, 1);
        assert!(responders.measure.keys.is_empty());
        assert!(responders.classes.is_empty());
    }

    #[test]
    fn test_class_usage_built_after_extraction() {
        let trial = extract(TRIAL).unwrap();
        let pain_id = trial.outcomes.iter().next().unwrap().id.clone();
        assert_eq!(trial.class_usage.len(), 2);
        let scalar = trial.class_usage.get(&ClassId::from_title("scalar")).unwrap();
        assert_eq!(scalar.outcomes, vec![pain_id]);
    }

    #[test]
    fn test_identical_outcomes_get_distinct_ids() {
        let outcome = r#"<outcome><type>Primary</type><title>Same</title>
            <measure><analyzed_list><analyzed/></analyzed_list></measure></outcome>"#;
        let text = format!(
            "<clinical_study><clinical_results><outcome_list>{}{}</outcome_list></clinical_results></clinical_study>",
            outcome, outcome
        );
        let trial = extract(&text).unwrap();
        let ids: Vec<&OutcomeId> = trial.outcomes.iter().map(|o| &o.id).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_missing_measure_is_unexpected_shape() {
        let text = r#"<clinical_study><clinical_results><outcome_list>
            <outcome><type>Primary</type><title>No measure</title></outcome>
        </outcome_list></clinical_results></clinical_study>"#;
        assert!(matches!(
            extract(text),
            Err(ConsolidationError::UnexpectedShape(_))
        ));
    }

    #[test]
    fn test_missing_analyzed_block_is_unexpected_shape() {
        let text = r#"<clinical_study><clinical_results><outcome_list>
            <outcome><type>Primary</type><title>Pain</title>
              <measure><units>mm</units></measure>
            </outcome>
        </outcome_list></clinical_results></clinical_study>"#;
        match extract(text) {
            Err(ConsolidationError::UnexpectedShape(message)) => {
                assert!(message.contains("analyzed"))
            }
            other => panic!("expected UnexpectedShape, got {:?}", other.map(|t| t.outcomes.len())),
        }
    }
}
