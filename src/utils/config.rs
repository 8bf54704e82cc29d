// src/utils/config.rs

use log::{info, warn};
use std::env;
use std::str::FromStr;

use crate::errors::ConsolidationError;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 75.0;
pub const DEFAULT_COMMON_CLASS_USAGE_THRESHOLD: usize = 2;

/// Settings consumed by the clustering engine. Fixed before a run starts.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringConfig {
    /// Minimum comparison-key similarity, in percent, for title matching (inclusive).
    pub similarity_threshold: f64,
    /// Title matches must report identical units.
    pub units_parity_required: bool,
    /// Title matches must reference the same set of group ids.
    pub groups_parity_required: bool,
    /// Title matches must reference the same set of class ids.
    pub classes_parity_required: bool,
    /// Number of shared measurement classes that links two outcomes.
    pub common_class_usage_threshold: usize,
    /// Dump the full outcome model before rendering.
    pub debug: bool,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            units_parity_required: true,
            groups_parity_required: true,
            classes_parity_required: true,
            common_class_usage_threshold: DEFAULT_COMMON_CLASS_USAGE_THRESHOLD,
            debug: false,
        }
    }
}

impl ClusteringConfig {
    /// Create configuration from environment variables, falling back to the
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ClusteringConfig::from_env`] but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            similarity_threshold: read_or(
                &lookup,
                "OUTCOME_SIMILARITY_THRESHOLD",
                defaults.similarity_threshold,
            ),
            units_parity_required: read_or(
                &lookup,
                "OUTCOME_UNITS_PARITY",
                defaults.units_parity_required,
            ),
            groups_parity_required: read_or(
                &lookup,
                "OUTCOME_GROUPS_PARITY",
                defaults.groups_parity_required,
            ),
            classes_parity_required: read_or(
                &lookup,
                "OUTCOME_CLASSES_PARITY",
                defaults.classes_parity_required,
            ),
            common_class_usage_threshold: read_or(
                &lookup,
                "OUTCOME_CLASS_USAGE_THRESHOLD",
                defaults.common_class_usage_threshold,
            ),
            debug: read_or(&lookup, "OUTCOME_DEBUG", defaults.debug),
        }
    }

    pub fn validate(&self) -> Result<(), ConsolidationError> {
        if !self.similarity_threshold.is_finite()
            || !(0.0..=100.0).contains(&self.similarity_threshold)
        {
            return Err(ConsolidationError::InvalidConfig(format!(
                "similarity threshold must be within [0, 100], got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }

    /// Log the current configuration
    pub fn log_config(&self) {
        info!("Clustering configuration:");
        info!("   similarity threshold: {}%", self.similarity_threshold);
        info!(
            "   parity required: units={}, groups={}, classes={}",
            self.units_parity_required, self.groups_parity_required, self.classes_parity_required
        );
        info!(
            "   common class usage threshold: {}",
            self.common_class_usage_threshold
        );
        if self.debug {
            info!("   debug model dump ENABLED");
        }
    }
}

fn read_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    "Ignoring unparsable value '{}' for {}, using {}",
                    raw, key, default
                );
                default
            }
        },
        None => default,
    }
}
