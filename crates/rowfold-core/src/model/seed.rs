use crate::value::Value;
use serde::{Deserialize, Serialize};

///
/// ElementSeed
///
/// Opaque vertex or edge endpoint identifier used to bound a scan range.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ElementSeed {
    Entity {
        vertex: Value,
    },
    Edge {
        source: Value,
        destination: Value,
        directed: bool,
    },
}

impl ElementSeed {
    #[must_use]
    pub fn vertex(vertex: impl Into<Value>) -> Self {
        Self::Entity {
            vertex: vertex.into(),
        }
    }

    #[must_use]
    pub fn edge(source: impl Into<Value>, destination: impl Into<Value>, directed: bool) -> Self {
        Self::Edge {
            source: source.into(),
            destination: destination.into(),
            directed,
        }
    }
}

///
/// SeedRangePair
///
/// One scan range bounded by two seeds, both inclusive.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SeedRangePair {
    pub start: ElementSeed,
    pub end: ElementSeed,
}

impl SeedRangePair {
    #[must_use]
    pub const fn new(start: ElementSeed, end: ElementSeed) -> Self {
        Self { start, end }
    }

    /// Range covering every row of a single vertex.
    #[must_use]
    pub fn single(vertex: impl Into<Value>) -> Self {
        let seed = ElementSeed::vertex(vertex);

        Self {
            start: seed.clone(),
            end: seed,
        }
    }

    /// Range covering every vertex between `start` and `end`, inclusive.
    #[must_use]
    pub fn vertices(start: impl Into<Value>, end: impl Into<Value>) -> Self {
        Self {
            start: ElementSeed::vertex(start),
            end: ElementSeed::vertex(end),
        }
    }
}
