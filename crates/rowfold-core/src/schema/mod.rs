//! Module: schema
//! Responsibility: group registry consumed read-only by stage construction.
//! Does not own: view selection or element storage.

mod aggregate;


use crate::{model::ElementKind, value::Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// re-exports
pub use aggregate::{AggregateError, AggregateFunction};

///
/// GroupRegistry
///
/// Lookup boundary for group metadata.
///

pub trait GroupRegistry {
    fn group(&self, name: &str) -> Option<&GroupDefinition>;
}

///
/// ValueType
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bool,
    Int,
    Uint,
    Float,
    Text,
    Blob,
    #[default]
    Any,
}

impl ValueType {
    /// Whether a literal is comparable with values of this type.
    ///
    /// Numeric types accept every numeric literal; comparisons widen.
    #[must_use]
    pub const fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Any => true,
            Self::Bool => matches!(value, Value::Bool(_)),
            Self::Int | Self::Uint | Self::Float => value.is_numeric(),
            Self::Text => matches!(value, Value::Text(_)),
            Self::Blob => matches!(value, Value::Blob(_)),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::Text => "text",
            Self::Blob => "blob",
            Self::Any => "any",
        }
    }
}

///
/// PropertyDefinition
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PropertyDefinition {
    #[serde(default, rename = "type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub aggregate: Option<AggregateFunction>,
}

impl PropertyDefinition {
    #[must_use]
    pub const fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            aggregate: None,
        }
    }

    #[must_use]
    pub const fn aggregated_by(mut self, function: AggregateFunction) -> Self {
        self.aggregate = Some(function);
        self
    }
}

///
/// GroupDefinition
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GroupDefinition {
    pub kind: ElementKind,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDefinition>,
}

impl GroupDefinition {
    #[must_use]
    pub const fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn property(mut self, name: impl Into<String>, def: PropertyDefinition) -> Self {
        self.properties.insert(name.into(), def);
        self
    }

    #[must_use]
    pub fn property_definition(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.get(name)
    }

    /// Declared aggregate functions, keyed by property.
    #[must_use]
    pub fn aggregate_functions(&self) -> BTreeMap<String, AggregateFunction> {
        self.properties
            .iter()
            .filter_map(|(name, def)| def.aggregate.map(|f| (name.clone(), f)))
            .collect()
    }
}

///
/// Schema
///
/// In-memory group registry.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Schema {
    #[serde(default)]
    groups: BTreeMap<String, GroupDefinition>,
}

impl Schema {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }

    /// Register an entity group; the definition's kind is forced to entity.
    #[must_use]
    pub fn entity(mut self, name: impl Into<String>, mut def: GroupDefinition) -> Self {
        def.kind = ElementKind::Entity;
        self.groups.insert(name.into(), def);
        self
    }

    /// Register an edge group; the definition's kind is forced to edge.
    #[must_use]
    pub fn edge(mut self, name: impl Into<String>, mut def: GroupDefinition) -> Self {
        def.kind = ElementKind::Edge;
        self.groups.insert(name.into(), def);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn edge_groups(&self) -> impl Iterator<Item = &str> {
        self.groups_of(ElementKind::Edge)
    }

    pub fn entity_groups(&self) -> impl Iterator<Item = &str> {
        self.groups_of(ElementKind::Entity)
    }

    fn groups_of(&self, kind: ElementKind) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .filter(move |(_, def)| def.kind == kind)
            .map(|(name, _)| name.as_str())
    }
}

impl GroupRegistry for Schema {
    fn group(&self, name: &str) -> Option<&GroupDefinition> {
        self.groups.get(name)
    }
}
