use crate::{model::Properties, value::Value};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// ElementKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Entity,
    Edge,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Entity => "entity",
            Self::Edge => "edge",
        };
        write!(f, "{label}")
    }
}

///
/// Element
///
/// One graph entity or edge. Elements returned by a range query have
/// already passed through every installed stage.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Element {
    Entity {
        group: String,
        vertex: Value,
        properties: Properties,
    },
    Edge {
        group: String,
        source: Value,
        destination: Value,
        directed: bool,
        properties: Properties,
    },
}

impl Element {
    #[must_use]
    pub fn entity(group: impl Into<String>, vertex: impl Into<Value>) -> Self {
        Self::Entity {
            group: group.into(),
            vertex: vertex.into(),
            properties: Properties::new(),
        }
    }

    #[must_use]
    pub fn edge(
        group: impl Into<String>,
        source: impl Into<Value>,
        destination: impl Into<Value>,
        directed: bool,
    ) -> Self {
        Self::Edge {
            group: group.into(),
            source: source.into(),
            destination: destination.into(),
            directed,
            properties: Properties::new(),
        }
    }

    /// Builder-style property insert.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties_mut().insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn group(&self) -> &str {
        match self {
            Self::Entity { group, .. } | Self::Edge { group, .. } => group,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Entity { .. } => ElementKind::Entity,
            Self::Edge { .. } => ElementKind::Edge,
        }
    }

    #[must_use]
    pub const fn is_entity(&self) -> bool {
        matches!(self, Self::Entity { .. })
    }

    #[must_use]
    pub const fn is_edge(&self) -> bool {
        matches!(self, Self::Edge { .. })
    }

    #[must_use]
    pub const fn properties(&self) -> &Properties {
        match self {
            Self::Entity { properties, .. } | Self::Edge { properties, .. } => properties,
        }
    }

    pub const fn properties_mut(&mut self) -> &mut Properties {
        match self {
            Self::Entity { properties, .. } | Self::Edge { properties, .. } => properties,
        }
    }

    #[must_use]
    pub fn into_properties(self) -> Properties {
        match self {
            Self::Entity { properties, .. } | Self::Edge { properties, .. } => properties,
        }
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties().get(name)
    }
}
