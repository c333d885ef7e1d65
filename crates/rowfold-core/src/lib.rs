//! Core runtime for rowfold: graph elements, views, the server-side stage
//! stack, and the range retriever that summarises one group over seed ranges.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod error;
pub mod filter;
pub mod handler;
pub mod key;
pub mod model;
pub mod obs;
pub mod retriever;
pub mod schema;
pub mod stage;
pub mod store;
pub mod value;
pub mod view;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, stores, codecs, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        filter::{ElementFilter, FilterSelection, Predicate},
        model::{Element, ElementKind, ElementSeed, Properties, SeedRangePair},
        schema::{AggregateFunction, GroupDefinition, PropertyDefinition, Schema, ValueType},
        value::Value,
        view::{View, ViewElementDefinition},
    };
}
