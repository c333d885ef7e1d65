//! Module: config
//! Responsibility: store-level configuration consumed by stage construction
//! and range retrieval.

#[cfg(test)]
mod tests;

use crate::{schema::Schema, stage::StageKind};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// CONSTANTS
///

/// Default cap on seed ranges accepted by one query.
pub const DEFAULT_MAX_RANGES: usize = 1024;

///
/// StoreConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub schema: Schema,
    #[serde(default)]
    pub stages: StagePriorities,
    #[serde(default)]
    pub scan: ScanConfig,
}

impl StoreConfig {
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(source).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema.is_empty() {
            return Err(ConfigError::EmptySchema);
        }
        if self.scan.max_ranges == 0 {
            return Err(ConfigError::ZeroMaxRanges);
        }

        self.stages.validate()
    }
}

///
/// StagePriorities
///
/// Installation priority per stage kind; must increase in stage order.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StagePriorities {
    pub pre_aggregation_filter: u16,
    pub post_aggregation_filter: u16,
    pub direction_filter: u16,
    pub property_range_filter: u16,
    pub row_key_aggregator: u16,
}

impl Default for StagePriorities {
    fn default() -> Self {
        Self {
            pre_aggregation_filter: 10,
            post_aggregation_filter: 20,
            direction_filter: 30,
            property_range_filter: 40,
            row_key_aggregator: 50,
        }
    }
}

impl StagePriorities {
    #[must_use]
    pub const fn priority(&self, kind: StageKind) -> u16 {
        match kind {
            StageKind::PreAggregationFilter => self.pre_aggregation_filter,
            StageKind::PostAggregationFilter => self.post_aggregation_filter,
            StageKind::DirectionFilter => self.direction_filter,
            StageKind::PropertyRangeFilter => self.property_range_filter,
            StageKind::RowKeyAggregator => self.row_key_aggregator,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for pair in StageKind::ALL.windows(2) {
            let (earlier, later) = (pair[0], pair[1]);
            if self.priority(earlier) >= self.priority(later) {
                return Err(ConfigError::PriorityOrder {
                    earlier: earlier.name(),
                    later: later.name(),
                });
            }
        }

        Ok(())
    }
}

///
/// ScanConfig
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub max_ranges: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_ranges: DEFAULT_MAX_RANGES,
        }
    }
}

///
/// ConfigError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),

    #[error("schema declares no groups")]
    EmptySchema,

    #[error("scan.max_ranges must be greater than zero")]
    ZeroMaxRanges,

    #[error("stage priority of '{earlier}' must be lower than '{later}'")]
    PriorityOrder {
        earlier: &'static str,
        later: &'static str,
    },
}
