//! Module: stage
//! Responsibility: server-side stage descriptors, their ordered construction,
//! and the scan-time runtime backends use to execute them.
//! Does not own: scan lifecycle or range computation.

mod descriptor;
mod exec;
mod factory;

#[cfg(test)]
mod tests;

use crate::{filter::FilterError, model::ElementKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;

// re-exports
pub use descriptor::{
    AggregatorStage, DirectionConstraint, FilterStage, IncludeEdgeType, IncludeIncomingOutgoing,
    PropertyRange, ScanConstraints, Stage, StageDescriptor, StageOptions, StageStack,
};
pub use exec::{ScanRow, StagePipeline};
pub use factory::StageFactory;

///
/// StageKind
///
/// Tag of one stage variant. Declaration order is the required
/// installation order.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    PreAggregationFilter,
    PostAggregationFilter,
    DirectionFilter,
    PropertyRangeFilter,
    RowKeyAggregator,
}

impl StageKind {
    pub const ALL: [Self; 5] = [
        Self::PreAggregationFilter,
        Self::PostAggregationFilter,
        Self::DirectionFilter,
        Self::PropertyRangeFilter,
        Self::RowKeyAggregator,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PreAggregationFilter => "pre_aggregation_filter",
            Self::PostAggregationFilter => "post_aggregation_filter",
            Self::DirectionFilter => "direction_filter",
            Self::PropertyRangeFilter => "property_range_filter",
            Self::RowKeyAggregator => "row_key_aggregator",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

///
/// StageError
///
/// Why one stage could not be translated into a store-executable step.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum StageError {
    #[error("group '{group}' is not declared in the schema")]
    UnknownGroup { group: String },

    #[error("group '{group}' is selected as {selected} but declared as {declared}")]
    GroupKindMismatch {
        group: String,
        selected: ElementKind,
        declared: ElementKind,
    },

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("property range references undeclared property '{property}'")]
    UnknownRangeProperty { property: String },

    #[error("property range bound on '{property}' expects {expected}, found {found}")]
    RangeBoundType {
        property: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("property range on '{property}' can never match")]
    EmptyRange { property: String },

    #[error("stage option encoding failed: {0}")]
    Encode(String),
}
