// src/extraction/mod.rs
pub mod comparison_key;
pub mod trial_extractor;

pub use comparison_key::comparison_key;
pub use trial_extractor::{extract_trial, ExtractedTrial};
