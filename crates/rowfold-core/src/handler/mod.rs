//! Module: handler
//! Responsibility: caller-facing entry point for range summarisation.
//! Does not own: stage semantics or scan lifecycle.
//! Boundary: validator, then stage factory, then range retriever.


use crate::{
    config::StoreConfig,
    error::QueryError,
    key::{ByteEntityEncoder, SeedRangeEncoder},
    model::SeedRangePair,
    obs::{MetricsEvent, sink},
    retriever::{ElementStream, RangeRetriever},
    stage::{DirectionConstraint, PropertyRange, ScanConstraints, StageFactory},
    store::{CborElementCodec, ElementCodec, Store},
    view::{self, View},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

///
/// SummariseGroupOverRanges
///
/// Request: summarise the single group selected by `view` over the listed
/// seed ranges, one element per row key.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SummariseGroupOverRanges {
    pub view: View,
    pub seed_ranges: Vec<SeedRangePair>,
    #[serde(default)]
    pub constraints: ScanConstraints,
}

impl SummariseGroupOverRanges {
    #[must_use]
    pub fn builder() -> SummariseGroupOverRangesBuilder {
        SummariseGroupOverRangesBuilder::default()
    }
}

///
/// SummariseGroupOverRangesBuilder
///

#[derive(Clone, Debug, Default)]
pub struct SummariseGroupOverRangesBuilder {
    op: SummariseGroupOverRanges,
}

impl SummariseGroupOverRangesBuilder {
    #[must_use]
    pub fn view(mut self, view: View) -> Self {
        self.op.view = view;
        self
    }

    #[must_use]
    pub fn seed_range(mut self, range: SeedRangePair) -> Self {
        self.op.seed_ranges.push(range);
        self
    }

    #[must_use]
    pub fn seed_ranges(mut self, ranges: impl IntoIterator<Item = SeedRangePair>) -> Self {
        self.op.seed_ranges.extend(ranges);
        self
    }

    #[must_use]
    pub const fn direction(mut self, direction: DirectionConstraint) -> Self {
        self.op.constraints.direction = Some(direction);
        self
    }

    #[must_use]
    pub fn property_range(mut self, range: PropertyRange) -> Self {
        self.op.constraints.property_range = Some(range);
        self
    }

    #[must_use]
    pub fn build(self) -> SummariseGroupOverRanges {
        self.op
    }
}

///
/// SummariseGroupOverRangesHandler
///
/// Holds the store's row codec and seed encoder; `new` wires the default
/// byte-entity layout, `with_codec` swaps in a backend's own.
///

#[derive(Clone, Copy, Debug)]
pub struct SummariseGroupOverRangesHandler<'a, C = CborElementCodec, E = ByteEntityEncoder> {
    config: &'a StoreConfig,
    codec: C,
    encoder: E,
}

impl<'a> SummariseGroupOverRangesHandler<'a> {
    #[must_use]
    pub const fn new(config: &'a StoreConfig) -> Self {
        Self::with_codec(config, CborElementCodec, ByteEntityEncoder)
    }
}

impl<'a, C, E> SummariseGroupOverRangesHandler<'a, C, E>
where
    C: ElementCodec + Clone,
    E: SeedRangeEncoder,
{
    #[must_use]
    pub const fn with_codec(config: &'a StoreConfig, codec: C, encoder: E) -> Self {
        Self {
            config,
            codec,
            encoder,
        }
    }

    /// Validate, build stages, and return a lazy element stream.
    ///
    /// Nothing touches the store until the view names exactly one group and
    /// every stage has been constructed.
    pub fn execute<'s, S: Store>(
        &self,
        op: &SummariseGroupOverRanges,
        store: &'s S,
    ) -> Result<ElementStream<'s, S, C>, QueryError> {
        self.try_execute(op, store).inspect_err(|err| {
            warn!(error = %err.display_with_class(), "summarise query rejected");
            sink::record(MetricsEvent::QueryRejected { class: err.class() });
        })
    }

    fn try_execute<'s, S: Store>(
        &self,
        op: &SummariseGroupOverRanges,
        store: &'s S,
    ) -> Result<ElementStream<'s, S, C>, QueryError> {
        let group = view::validate(&op.view)?;
        info!(group = %group, ranges = op.seed_ranges.len(), "summarise query started");
        sink::record(MetricsEvent::QueryStart {
            group: &group,
            ranges: u64::try_from(op.seed_ranges.len()).unwrap_or(u64::MAX),
        });

        let stages =
            StageFactory::new(self.config).build_stages(&op.view, &group, &op.constraints)?;
        sink::record(MetricsEvent::StagesBuilt {
            group: &group,
            stages: u64::try_from(stages.len()).unwrap_or(u64::MAX),
        });

        RangeRetriever::new(store, self.codec.clone(), &self.encoder)
            .with_max_ranges(self.config.scan.max_ranges)
            .execute(stages, &op.seed_ranges)
    }
}
