//! Module: retriever
//! Responsibility: turn seed ranges plus a stage stack into a lazy element
//! stream over one store.
//! Does not own: stage construction, view validation, or row execution.
//! Boundary: the only code that opens and closes scan handles.

mod stream;


use crate::{
    config::DEFAULT_MAX_RANGES,
    error::QueryError,
    key::{KeyRange, SeedRangeEncoder},
    model::SeedRangePair,
    stage::StageStack,
    store::{ElementCodec, Store},
};
use tracing::{debug, warn};

// re-exports
pub use stream::ElementStream;

///
/// RangeRetriever
///
/// Executes one stage stack over an ordered list of seed ranges.
/// Range encoding and the capability check happen here, before any scan is
/// opened; scans themselves open on demand as the stream is pulled.
///

#[derive(Clone, Debug)]
pub struct RangeRetriever<'s, S, C, E> {
    store: &'s S,
    codec: C,
    encoder: E,
    max_ranges: usize,
}

impl<'s, S, C, E> RangeRetriever<'s, S, C, E>
where
    S: Store,
    C: ElementCodec + Clone,
    E: SeedRangeEncoder,
{
    #[must_use]
    pub const fn new(store: &'s S, codec: C, encoder: E) -> Self {
        Self {
            store,
            codec,
            encoder,
            max_ranges: DEFAULT_MAX_RANGES,
        }
    }

    #[must_use]
    pub fn with_max_ranges(mut self, max_ranges: usize) -> Self {
        self.max_ranges = max_ranges;
        self
    }

    pub fn execute(
        &self,
        stages: StageStack,
        seed_ranges: &[SeedRangePair],
    ) -> Result<ElementStream<'s, S, C>, QueryError> {
        let ranges = self.encode_ranges(seed_ranges)?;
        let group = stages
            .group()
            .ok_or_else(|| QueryError::invalid_request("stage stack has no row-key aggregator"))?
            .to_string();

        if let Err(source) = self.store.validate_stages(stages.as_slice()) {
            warn!(group = %group, error = %source, "store rejected stage stack");
            return Err(QueryError::ScanSetup {
                range: None,
                source,
            });
        }

        debug!(group = %group, ranges = ranges.len(), "range stream prepared");

        Ok(ElementStream::new(
            self.store,
            self.codec.clone(),
            stages,
            group,
            ranges,
        ))
    }

    fn encode_ranges(&self, seed_ranges: &[SeedRangePair]) -> Result<Vec<KeyRange>, QueryError> {
        if seed_ranges.is_empty() {
            return Err(QueryError::invalid_request(
                "at least one seed range is required",
            ));
        }
        if seed_ranges.len() > self.max_ranges {
            return Err(QueryError::invalid_request(format!(
                "{} seed ranges requested, at most {} allowed",
                seed_ranges.len(),
                self.max_ranges
            )));
        }

        seed_ranges
            .iter()
            .enumerate()
            .map(|(index, pair)| {
                self.encoder.range(pair).map_err(|err| {
                    QueryError::invalid_request(format!("seed range {index} is not encodable: {err}"))
                })
            })
            .collect()
    }
}
