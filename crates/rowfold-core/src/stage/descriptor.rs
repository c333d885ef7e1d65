use crate::{
    filter::ElementFilter,
    schema::AggregateFunction,
    stage::{StageError, StageKind},
    value::Value,
};
use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::BTreeMap,
    ops::Bound,
};

///
/// IncludeEdgeType
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncludeEdgeType {
    #[default]
    All,
    Directed,
    Undirected,
}

impl IncludeEdgeType {
    #[must_use]
    pub const fn accepts(self, directed: bool) -> bool {
        match self {
            Self::All => true,
            Self::Directed => directed,
            Self::Undirected => !directed,
        }
    }
}

///
/// IncludeIncomingOutgoing
///
/// Endpoint role of the seed vertex; applies to directed edges only.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncludeIncomingOutgoing {
    #[default]
    Either,
    Incoming,
    Outgoing,
}

///
/// DirectionConstraint
///
/// Operation-level edge restriction. The default admits every edge.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DirectionConstraint {
    #[serde(default)]
    pub include_edges: IncludeEdgeType,
    #[serde(default)]
    pub orientation: IncludeIncomingOutgoing,
}

impl DirectionConstraint {
    #[must_use]
    pub const fn new(include_edges: IncludeEdgeType, orientation: IncludeIncomingOutgoing) -> Self {
        Self {
            include_edges,
            orientation,
        }
    }

    #[must_use]
    pub const fn is_permissive(&self) -> bool {
        matches!(self.include_edges, IncludeEdgeType::All)
            && matches!(self.orientation, IncludeIncomingOutgoing::Either)
    }
}

///
/// PropertyRange
///
/// Bounds on one property value. Elements lacking the property never match.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PropertyRange {
    pub property: String,
    pub lower: Bound<Value>,
    pub upper: Bound<Value>,
}

impl PropertyRange {
    /// Inclusive range `[lower, upper]`.
    #[must_use]
    pub fn inclusive(
        property: impl Into<String>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Self {
        Self {
            property: property.into(),
            lower: Bound::Included(lower.into()),
            upper: Bound::Included(upper.into()),
        }
    }

    #[must_use]
    pub fn at_least(property: impl Into<String>, lower: impl Into<Value>) -> Self {
        Self {
            property: property.into(),
            lower: Bound::Included(lower.into()),
            upper: Bound::Unbounded,
        }
    }

    #[must_use]
    pub fn below(property: impl Into<String>, upper: impl Into<Value>) -> Self {
        Self {
            property: property.into(),
            lower: Bound::Unbounded,
            upper: Bound::Excluded(upper.into()),
        }
    }

    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        let above_lower = match &self.lower {
            Bound::Unbounded => true,
            Bound::Included(lower) => value.cmp_widened(lower) != Ordering::Less,
            Bound::Excluded(lower) => value.cmp_widened(lower) == Ordering::Greater,
        };
        let below_upper = match &self.upper {
            Bound::Unbounded => true,
            Bound::Included(upper) => value.cmp_widened(upper) != Ordering::Greater,
            Bound::Excluded(upper) => value.cmp_widened(upper) == Ordering::Less,
        };

        above_lower && below_upper
    }

    /// Whether no value can satisfy both bounds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Included(l), Bound::Included(u)) => l.cmp_widened(u) == Ordering::Greater,
            (Bound::Included(l) | Bound::Excluded(l), Bound::Excluded(u))
            | (Bound::Excluded(l), Bound::Included(u)) => l.cmp_widened(u) != Ordering::Less,
            _ => false,
        }
    }

    pub(crate) fn bounds(&self) -> impl Iterator<Item = &Value> {
        [&self.lower, &self.upper]
            .into_iter()
            .filter_map(|bound| match bound {
                Bound::Included(v) | Bound::Excluded(v) => Some(v),
                Bound::Unbounded => None,
            })
    }
}

///
/// ScanConstraints
///
/// Operation-specified restrictions that become optional stages.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ScanConstraints {
    #[serde(default)]
    pub direction: Option<DirectionConstraint>,
    #[serde(default)]
    pub property_range: Option<PropertyRange>,
}

///
/// FilterStage
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FilterStage {
    pub group: String,
    pub filter: ElementFilter,
}

///
/// AggregatorStage
///
/// Row-key summarisation within one group namespace. Properties without a
/// declared function keep their first value.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AggregatorStage {
    pub group: String,
    pub functions: BTreeMap<String, AggregateFunction>,
}

///
/// Stage
///
/// Typed payload of one server-side processing step.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PreAggregationFilter(FilterStage),
    PostAggregationFilter(FilterStage),
    DirectionFilter(DirectionConstraint),
    PropertyRangeFilter(PropertyRange),
    RowKeyAggregator(AggregatorStage),
}

impl Stage {
    #[must_use]
    pub const fn kind(&self) -> StageKind {
        match self {
            Self::PreAggregationFilter(_) => StageKind::PreAggregationFilter,
            Self::PostAggregationFilter(_) => StageKind::PostAggregationFilter,
            Self::DirectionFilter(_) => StageKind::DirectionFilter,
            Self::PropertyRangeFilter(_) => StageKind::PropertyRangeFilter,
            Self::RowKeyAggregator(_) => StageKind::RowKeyAggregator,
        }
    }
}

///
/// StageOptions
///
/// Flat string option map handed to remote backends.
/// Structured payload fields are JSON-encoded.
///

pub type StageOptions = BTreeMap<String, String>;

///
/// StageDescriptor
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct StageDescriptor {
    priority: u16,
    stage: Stage,
}

impl StageDescriptor {
    #[must_use]
    pub const fn new(priority: u16, stage: Stage) -> Self {
        Self { priority, stage }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind().name()
    }

    #[must_use]
    pub const fn kind(&self) -> StageKind {
        self.stage.kind()
    }

    #[must_use]
    pub const fn priority(&self) -> u16 {
        self.priority
    }

    #[must_use]
    pub const fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Render this descriptor as a flat option map.
    pub fn options(&self) -> Result<StageOptions, StageError> {
        let payload = match &self.stage {
            Stage::PreAggregationFilter(p) | Stage::PostAggregationFilter(p) => {
                serde_json::to_value(p)
            }
            Stage::DirectionFilter(p) => serde_json::to_value(p),
            Stage::PropertyRangeFilter(p) => serde_json::to_value(p),
            Stage::RowKeyAggregator(p) => serde_json::to_value(p),
        }
        .map_err(|err| StageError::Encode(err.to_string()))?;

        let mut options = StageOptions::new();
        options.insert("name".to_string(), self.name().to_string());
        options.insert("priority".to_string(), self.priority.to_string());

        if let serde_json::Value::Object(fields) = payload {
            for (key, value) in fields {
                let rendered = match value {
                    serde_json::Value::String(text) => text,
                    other => other.to_string(),
                };
                options.insert(key, rendered);
            }
        }

        Ok(options)
    }
}

///
/// StageStack
///
/// Ordered, read-only stage sequence for one query.
/// Only the stage factory assembles one.
///

#[derive(Clone, Debug, Deref, Eq, IntoIterator, PartialEq)]
pub struct StageStack(#[into_iterator(owned, ref)] Vec<StageDescriptor>);

impl StageStack {
    pub(crate) const fn from_ordered(stages: Vec<StageDescriptor>) -> Self {
        Self(stages)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(StageDescriptor::name).collect()
    }

    #[must_use]
    pub fn contains(&self, kind: StageKind) -> bool {
        self.0.iter().any(|stage| stage.kind() == kind)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[StageDescriptor] {
        &self.0
    }

    /// Group namespace summarised by this stack's aggregator.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.0.iter().find_map(|stage| match stage.stage() {
            Stage::RowKeyAggregator(AggregatorStage { group, .. }) => Some(group.as_str()),
            _ => None,
        })
    }
}
