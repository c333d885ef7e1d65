//! Module: stage::exec
//! Responsibility: scan-time execution of an installed stage stack.
//! Does not own: row storage or scan lifecycle.
//! Boundary: backends run stages here, next to the data.

use crate::{
    key::{ByteEntityEncoder, RowOrientation},
    model::Element,
    stage::{
        AggregatorStage, DirectionConstraint, FilterStage, IncludeIncomingOutgoing, PropertyRange,
        Stage, StageDescriptor,
    },
    store::{StoreError, StoreKey},
    value::Value,
};
use std::{iter::Peekable, mem};

///
/// ScanRow
///
/// One decoded row travelling through the stage chain.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanRow {
    pub key: StoreKey,
    pub element: Element,
}

type RowIter<'a> = Box<dyn Iterator<Item = Result<ScanRow, StoreError>> + 'a>;

///
/// StagePipeline
///
/// Installed, ordered stage chain. Installation rejects stacks whose
/// priorities do not strictly increase or that lack a row-key aggregator.
///
/// Rows sharing one row key are folded once, at the first stage that reads
/// aggregated values: the post-aggregation filter when installed, the
/// row-key aggregator otherwise. Stages after the fold see one row per key.
///

#[derive(Clone, Debug)]
pub struct StagePipeline {
    stages: Vec<StageDescriptor>,
    aggregator: AggregatorStage,
}

impl StagePipeline {
    pub fn install(stages: &[StageDescriptor]) -> Result<Self, StoreError> {
        for pair in stages.windows(2) {
            if pair[0].priority() >= pair[1].priority() {
                return Err(StoreError::PriorityConflict {
                    stage: pair[1].name(),
                    priority: pair[1].priority(),
                    after: pair[0].priority(),
                });
            }
        }

        let aggregator = stages
            .iter()
            .find_map(|stage| match stage.stage() {
                Stage::RowKeyAggregator(aggregator) => Some(aggregator.clone()),
                _ => None,
            })
            .ok_or(StoreError::MissingAggregator)?;

        Ok(Self {
            stages: stages.to_vec(),
            aggregator,
        })
    }

    /// Column family fetched by scans; the aggregator's group namespace.
    #[must_use]
    pub fn family(&self) -> &str {
        &self.aggregator.group
    }

    /// Chain every installed stage over `rows`, in installation order.
    pub fn apply<'a, I>(&'a self, rows: I) -> impl Iterator<Item = Result<ScanRow, StoreError>> + 'a
    where
        I: Iterator<Item = Result<ScanRow, StoreError>> + 'a,
    {
        let family = self.family();
        let aggregator = &self.aggregator;
        let mut chain: RowIter<'a> = Box::new(
            rows.filter(move |row| row.as_ref().map_or(true, |r| r.key.family == family)),
        );
        let mut folded = false;

        for descriptor in &self.stages {
            chain = match descriptor.stage() {
                Stage::PreAggregationFilter(stage) => filter_rows(chain, stage),
                Stage::PostAggregationFilter(stage) if folded => filter_rows(chain, stage),
                Stage::PostAggregationFilter(stage) => {
                    folded = true;
                    filter_rows(Box::new(RowKeyAggregate::new(chain, aggregator)), stage)
                }
                Stage::DirectionFilter(direction) => {
                    Box::new(chain.filter_map(move |row| match row {
                        Ok(r) => match passes_direction(direction, &r) {
                            Ok(true) => Some(Ok(r)),
                            Ok(false) => None,
                            Err(err) => Some(Err(err)),
                        },
                        Err(err) => Some(Err(err)),
                    }))
                }
                Stage::PropertyRangeFilter(range) => Box::new(chain.filter(move |row| {
                    row.as_ref().map_or(true, |r| passes_range(range, &r.element))
                })),
                Stage::RowKeyAggregator(_) if folded => chain,
                Stage::RowKeyAggregator(_) => Box::new(RowKeyAggregate::new(chain, aggregator)),
            };
        }

        chain
    }
}

fn filter_rows<'a>(chain: RowIter<'a>, stage: &'a FilterStage) -> RowIter<'a> {
    Box::new(chain.filter(move |row| {
        row.as_ref().map_or(true, |r| stage.filter.test(&r.element))
    }))
}

fn passes_direction(direction: &DirectionConstraint, row: &ScanRow) -> Result<bool, StoreError> {
    let Element::Edge { directed, .. } = &row.element else {
        return Ok(true);
    };
    if !direction.include_edges.accepts(*directed) {
        return Ok(false);
    }
    if !*directed {
        return Ok(true);
    }

    let orientation = ByteEntityEncoder::orientation(&row.key.row)
        .map_err(|err| StoreError::Corrupt(err.to_string()))?;

    Ok(match direction.orientation {
        IncludeIncomingOutgoing::Either => true,
        IncludeIncomingOutgoing::Incoming => orientation == RowOrientation::Incoming,
        IncludeIncomingOutgoing::Outgoing => orientation == RowOrientation::Outgoing,
    })
}

fn passes_range(range: &PropertyRange, element: &Element) -> bool {
    element
        .property(&range.property)
        .is_some_and(|value| range.contains(value))
}

///
/// RowKeyAggregate
///
/// Merges adjacent rows sharing one row key into a single element.
/// Relies on the store yielding rows in key order.
///

struct RowKeyAggregate<'a, I: Iterator<Item = Result<ScanRow, StoreError>>> {
    inner: Peekable<I>,
    stage: &'a AggregatorStage,
}

impl<'a, I> RowKeyAggregate<'a, I>
where
    I: Iterator<Item = Result<ScanRow, StoreError>>,
{
    fn new(inner: I, stage: &'a AggregatorStage) -> Self {
        Self {
            inner: inner.peekable(),
            stage,
        }
    }

    fn start(&self, mut row: ScanRow) -> ScanRow {
        let properties = row.element.properties_mut();
        for (name, function) in &self.stage.functions {
            if let Some(value) = properties.get_mut(name) {
                *value = function.init(mem::replace(value, Value::Null));
            }
        }

        row
    }

    // Fold one more row into the accumulator; undeclared properties keep
    // their first value.
    fn merge(&self, acc: &mut ScanRow, next: ScanRow) -> Result<(), StoreError> {
        let target = acc.element.properties_mut();

        for (name, value) in next.element.into_properties() {
            let function = self.stage.functions.get(&name).copied();
            match (target.get_mut(&name), function) {
                (Some(current), Some(function)) => {
                    *current = function.combine(mem::replace(current, Value::Null), value)?;
                }
                (Some(_), None) => {}
                (None, Some(function)) => {
                    target.insert(name, function.init(value));
                }
                (None, None) => {
                    target.insert(name, value);
                }
            }
        }

        Ok(())
    }
}

impl<I> Iterator for RowKeyAggregate<'_, I>
where
    I: Iterator<Item = Result<ScanRow, StoreError>>,
{
    type Item = Result<ScanRow, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut acc = match self.inner.next()? {
            Ok(row) => self.start(row),
            Err(err) => return Some(Err(err)),
        };

        while let Some(Ok(peeked)) = self.inner.peek() {
            if peeked.key.row != acc.key.row || peeked.key.family != acc.key.family {
                break;
            }
            let Some(Ok(next)) = self.inner.next() else {
                break;
            };
            if let Err(err) = self.merge(&mut acc, next) {
                return Some(Err(err));
            }
        }

        Some(Ok(acc))
    }
}
