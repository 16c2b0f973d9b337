//! Prescription policy configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dosing::DEFAULT_UNIT_LABEL;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Policy knobs for building and submitting prescription lines.
///
/// Every field is optional in JSON; missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RxConfig {
    /// Unit label used in messages when a batch has no unit of measure
    pub default_unit_label: String,
    /// Reject structured schedules that sum to zero doses (e.g., "0-0-0")
    pub reject_zero_dose_frequency: bool,
    /// Block saving a line whose quantity exceeds the batch's known stock
    pub block_on_insufficient_stock: bool,
}

impl Default for RxConfig {
    fn default() -> Self {
        Self {
            default_unit_label: DEFAULT_UNIT_LABEL.to_string(),
            reject_zero_dose_frequency: true,
            block_on_insufficient_stock: true,
        }
    }
}

impl RxConfig {
    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Resolve the unit label to show for a batch unit.
    pub fn unit_label<'a>(&'a self, unit: Option<&'a str>) -> &'a str {
        match unit {
            Some(u) if !u.trim().is_empty() => u,
            _ => &self.default_unit_label,
        }
    }
}
