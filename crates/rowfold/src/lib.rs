//! ## Crate layout
//! - `core`: elements, views, stages, stores, and the range retriever.
//!
//! The `prelude` module mirrors the surface used by callers issuing
//! summarise queries; `store::prelude` adds the backend-facing traits.

pub use rowfold_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Entry points
//

pub use crate::core::{
    config::StoreConfig,
    error::{ErrorClass, QueryError},
    handler::{SummariseGroupOverRanges, SummariseGroupOverRangesHandler},
    retriever::ElementStream,
};

///
/// Caller Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        config::StoreConfig,
        error::{ErrorClass, QueryError},
        handler::{SummariseGroupOverRanges, SummariseGroupOverRangesHandler},
        key::SeedRangeEncoder as _,
        prelude::*,
        stage::{DirectionConstraint, IncludeEdgeType, IncludeIncomingOutgoing, PropertyRange},
        store::ScanHandle as _,
    };
}

//
// Store Prelude
// For backend implementations.
//

/// Backend-facing traits and types (separate from the caller prelude).
pub mod store {
    pub mod prelude {
        pub use crate::core::{
            key::{ByteEntityEncoder, KeyRange, SeedRangeEncoder},
            stage::{ScanRow, StageDescriptor, StageKind, StageOptions, StagePipeline},
            store::{
                CborElementCodec, CodecError, ElementCodec, MemoryStore, RawEntry, ScanHandle,
                Store, StoreCapabilities, StoreError, StoreKey,
            },
        };
    }
}
