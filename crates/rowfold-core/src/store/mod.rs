//! Module: store
//! Responsibility: sorted key-value store contract, the row codec, and the
//! in-process reference backend.
//! Does not own: stage construction or query validation.
//! Boundary: the retriever depends only on `Store` and `ScanHandle`.

mod codec;
mod memory;

#[cfg(test)]
mod tests;

use crate::{
    key::KeyRange,
    schema::AggregateError,
    stage::{StageDescriptor, StageKind},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

// re-exports
pub use codec::{CborElementCodec, CodecError, ElementCodec};
pub use memory::{MemoryScan, MemoryStore};

///
/// StoreKey
///
/// Physical key: row, then column family (group), then qualifier.
/// Derived ordering is row-major, matching the store's natural order.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct StoreKey {
    pub row: Vec<u8>,
    pub family: String,
    pub qualifier: Vec<u8>,
}

impl StoreKey {
    #[must_use]
    pub fn new(row: Vec<u8>, family: impl Into<String>, qualifier: Vec<u8>) -> Self {
        Self {
            row,
            family: family.into(),
            qualifier,
        }
    }

    // Smallest key carrying `row`.
    pub(crate) const fn row_floor(row: Vec<u8>) -> Self {
        Self {
            row,
            family: String::new(),
            qualifier: Vec::new(),
        }
    }
}

///
/// RawEntry
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawEntry {
    pub key: StoreKey,
    pub value: Vec<u8>,
}

///
/// Store
///
/// Minimal capability interface of a sorted key-value store with
/// server-side stage execution.
///

pub trait Store {
    type Scan: ScanHandle;

    /// Check a stage stack against this store's capabilities without
    /// opening a scan.
    fn validate_stages(&self, stages: &[StageDescriptor]) -> Result<(), StoreError> {
        let _ = stages;
        Ok(())
    }

    /// Open one scan over `range` with `stages` installed in order.
    fn open_scan(&self, range: &KeyRange, stages: &[StageDescriptor])
    -> Result<Self::Scan, StoreError>;
}

///
/// ScanHandle
///
/// One open, in-flight scan. `close` must be idempotent.
///

pub trait ScanHandle {
    fn next_entry(&mut self) -> Result<Option<RawEntry>, StoreError>;

    fn close(&mut self);
}

///
/// StoreCapabilities
///
/// Stage kinds a backend can execute and the deepest stack it accepts.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoreCapabilities {
    pub stages: BTreeSet<StageKind>,
    pub max_stages: usize,
}

impl StoreCapabilities {
    #[must_use]
    pub fn without(mut self, kind: StageKind) -> Self {
        self.stages.remove(&kind);
        self
    }

    pub fn check(&self, stages: &[StageDescriptor]) -> Result<(), StoreError> {
        if stages.len() > self.max_stages {
            return Err(StoreError::TooManyStages {
                count: stages.len(),
                max: self.max_stages,
            });
        }
        if let Some(stage) = stages.iter().find(|s| !self.stages.contains(&s.kind())) {
            return Err(StoreError::StageRejected {
                stage: stage.name(),
                reason: "stage kind is not supported by this store".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for StoreCapabilities {
    fn default() -> Self {
        Self {
            stages: StageKind::ALL.into_iter().collect(),
            max_stages: StageKind::ALL.len(),
        }
    }
}

///
/// StoreError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum StoreError {
    #[error("stage '{stage}' rejected: {reason}")]
    StageRejected { stage: &'static str, reason: String },

    #[error("stage '{stage}' priority {priority} does not follow priority {after}")]
    PriorityConflict {
        stage: &'static str,
        priority: u16,
        after: u16,
    },

    #[error("stage stack has {count} stages, store accepts at most {max}")]
    TooManyStages { count: usize, max: usize },

    #[error("stage stack has no row-key aggregator")]
    MissingAggregator,

    #[error("scan handle is closed")]
    Closed,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store corruption: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}
