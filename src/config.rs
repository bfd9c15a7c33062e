//! Analysis configuration
//!
//! Tunables for the lull detector plus switches for the optional analyses.
//! All fields have defaults, so partial JSON documents are accepted.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Default fraction a day must fall below its baseline to count as low
pub const DEFAULT_DROP_THRESHOLD: f64 = 0.65;

/// Default minimum run length (days) for a lull
pub const DEFAULT_MIN_DAYS: usize = 7;

/// Default trailing baseline window in days
pub const DEFAULT_BASELINE_WINDOW: usize = 30;

/// Lull detector parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LullConfig {
    pub drop_threshold: f64,
    pub min_days: usize,
    pub baseline_window: usize,
}

impl Default for LullConfig {
    fn default() -> Self {
        Self {
            drop_threshold: DEFAULT_DROP_THRESHOLD,
            min_days: DEFAULT_MIN_DAYS,
            baseline_window: DEFAULT_BASELINE_WINDOW,
        }
    }
}

impl LullConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(self.drop_threshold > 0.0 && self.drop_threshold < 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "drop_threshold must be between 0 and 1 (exclusive), got {}",
                self.drop_threshold
            )));
        }
        if self.min_days == 0 {
            return Err(AnalysisError::InvalidConfig(
                "min_days must be at least 1".to_string(),
            ));
        }
        if self.baseline_window == 0 {
            return Err(AnalysisError::InvalidConfig(
                "baseline_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Full analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    pub lull: LullConfig,
    /// Include the opening conversation excerpt
    pub first_conversation: bool,
    /// Include heatmap, daily trend and bedtime analysis
    pub time_patterns: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lull: LullConfig::default(),
            first_conversation: true,
            time_patterns: true,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.lull.validate()
    }

    /// Load and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
