// src/models/mod.rs
pub mod class_usage;
pub mod outcome;
pub mod stats;
pub mod trial;

use serde::Serialize;
use std::fmt;

use crate::utils::sha256_hex;

pub use class_usage::{ClassUsage, ClassUsageEntry};
pub use outcome::{
    AnalyzedData, ClassMeasurements, GroupMeasurement, Measure, MeasurementClass, Outcome,
    OutcomeGroup, OutcomeStore,
};
pub use trial::{Group, Period, TrialSummary};

/// Title recorded for a measurement class the source leaves unnamed.
pub const SCALAR_CLASS_TITLE: &str = "Scalar";
/// Class title that always leads a render group's class list.
pub const BASELINE_CLASS_TITLE: &str = "Baseline";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OutcomeId(pub String);

impl OutcomeId {
    /// Content hash of the outcome's type, title and timeframe, salted with its
    /// extraction ordinal so repeated outcomes stay distinct within a run.
    pub fn derive(outcome_type: &str, title: &str, timeframe: &str, ordinal: usize) -> Self {
        let seed = [outcome_type, title, timeframe, &ordinal.to_string()]
            .join("-")
            .to_lowercase();
        OutcomeId(format!("outcome-{}", sha256_hex(&seed)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ClassId(pub String);

impl ClassId {
    /// Identical titles, ignoring case, always produce the same id.
    pub fn from_title(title: &str) -> Self {
        ClassId(format!("class-{}", sha256_hex(&title.to_lowercase())))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GroupId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RenderGroupId(pub String);

impl RenderGroupId {
    pub fn from_sequence(sequence: u64) -> Self {
        RenderGroupId(format!("rendergroup-{}", sequence))
    }
}

macro_rules! display_as_inner {
    ($($id:ty),*) => {
        $(
            impl fmt::Display for $id {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )*
    };
}

display_as_inner!(OutcomeId, ClassId, GroupId, RenderGroupId);
