// src/extraction/comparison_key.rs

/// Key the title matcher compares: `type/units/title`, with the type
/// lower-cased. Units and title keep their source casing.
pub fn comparison_key(outcome_type: &str, units: &str, title: &str) -> String {
    format!("{}/{}/{}", outcome_type.to_lowercase(), units, title)
}
