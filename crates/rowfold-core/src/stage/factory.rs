use crate::{
    config::StoreConfig,
    error::QueryError,
    filter::ElementFilter,
    model::ElementKind,
    schema::{GroupDefinition, GroupRegistry},
    stage::{
        AggregatorStage, FilterStage, PropertyRange, ScanConstraints, Stage, StageDescriptor,
        StageError, StageKind, StageStack,
    },
    view::View,
};
use tracing::debug;

///
/// StageFactory
///
/// Builds the ordered stage stack for one single-group query.
/// Stages come out in fixed order: pre-aggregation filter, post-aggregation
/// filter, direction filter, property-range filter, row-key aggregator.
///

#[derive(Clone, Copy, Debug)]
pub struct StageFactory<'a> {
    config: &'a StoreConfig,
}

impl<'a> StageFactory<'a> {
    #[must_use]
    pub const fn new(config: &'a StoreConfig) -> Self {
        Self { config }
    }

    /// Build every stage for `group`; any failure discards the whole stack.
    pub fn build_stages(
        &self,
        view: &View,
        group: &str,
        constraints: &ScanConstraints,
    ) -> Result<StageStack, QueryError> {
        let slots = [
            self.pre_aggregation_filter(view, group)?,
            self.post_aggregation_filter(view, group)?,
            self.direction_filter(view, group, constraints)?,
            self.property_range_filter(group, constraints)?,
            Some(self.row_key_aggregator(view, group)?),
        ];

        let stages: Vec<StageDescriptor> = slots.into_iter().flatten().collect();
        for stage in &stages {
            debug!(
                group,
                stage = stage.name(),
                priority = stage.priority(),
                "stage constructed"
            );
        }

        Ok(StageStack::from_ordered(stages))
    }

    fn pre_aggregation_filter(
        &self,
        view: &View,
        group: &str,
    ) -> Result<Option<StageDescriptor>, QueryError> {
        let kind = StageKind::PreAggregationFilter;
        if !view.has_pre_aggregation_filters(group) {
            return Ok(None);
        }

        let filter = view
            .element(group)
            .and_then(|def| def.pre_aggregation_filter.clone())
            .unwrap_or_default();
        self.filter_stage(kind, view, group, filter)
            .map(|stage| Some(self.descriptor(Stage::PreAggregationFilter(stage))))
    }

    fn post_aggregation_filter(
        &self,
        view: &View,
        group: &str,
    ) -> Result<Option<StageDescriptor>, QueryError> {
        let kind = StageKind::PostAggregationFilter;
        if !view.has_post_aggregation_filters(group) {
            return Ok(None);
        }

        let filter = view
            .element(group)
            .and_then(|def| def.post_aggregation_filter.clone())
            .unwrap_or_default();
        self.filter_stage(kind, view, group, filter)
            .map(|stage| Some(self.descriptor(Stage::PostAggregationFilter(stage))))
    }

    fn direction_filter(
        &self,
        view: &View,
        group: &str,
        constraints: &ScanConstraints,
    ) -> Result<Option<StageDescriptor>, QueryError> {
        let Some(direction) = constraints.direction.filter(|d| !d.is_permissive()) else {
            return Ok(None);
        };
        if !view.is_edge_group(group) {
            return Ok(None);
        }

        self.resolve_group(StageKind::DirectionFilter, view, group)?;

        Ok(Some(self.descriptor(Stage::DirectionFilter(direction))))
    }

    fn property_range_filter(
        &self,
        group: &str,
        constraints: &ScanConstraints,
    ) -> Result<Option<StageDescriptor>, QueryError> {
        let kind = StageKind::PropertyRangeFilter;
        let Some(range) = &constraints.property_range else {
            return Ok(None);
        };

        let def = self
            .config
            .schema
            .group(group)
            .ok_or_else(|| unknown_group(kind, group))?;
        check_property_range(def, range)
            .map_err(|err| QueryError::stage_construction(kind.name(), err))?;

        Ok(Some(self.descriptor(Stage::PropertyRangeFilter(range.clone()))))
    }

    fn row_key_aggregator(&self, view: &View, group: &str) -> Result<StageDescriptor, QueryError> {
        let def = self.resolve_group(StageKind::RowKeyAggregator, view, group)?;

        Ok(self.descriptor(Stage::RowKeyAggregator(AggregatorStage {
            group: group.to_string(),
            functions: def.aggregate_functions(),
        })))
    }

    fn filter_stage(
        &self,
        kind: StageKind,
        view: &View,
        group: &str,
        filter: ElementFilter,
    ) -> Result<FilterStage, QueryError> {
        let def = self.resolve_group(kind, view, group)?;
        filter
            .validate(def)
            .map_err(|err| QueryError::stage_construction(kind.name(), err.into()))?;

        Ok(FilterStage {
            group: group.to_string(),
            filter,
        })
    }

    // Look up the group and check the view selected it under its declared kind.
    fn resolve_group(
        &self,
        kind: StageKind,
        view: &View,
        group: &str,
    ) -> Result<&'a GroupDefinition, QueryError> {
        let def = self
            .config
            .schema
            .group(group)
            .ok_or_else(|| unknown_group(kind, group))?;

        let selected = if view.is_edge_group(group) {
            ElementKind::Edge
        } else {
            ElementKind::Entity
        };
        if def.kind != selected {
            return Err(QueryError::stage_construction(
                kind.name(),
                StageError::GroupKindMismatch {
                    group: group.to_string(),
                    selected,
                    declared: def.kind,
                },
            ));
        }

        Ok(def)
    }

    fn descriptor(&self, stage: Stage) -> StageDescriptor {
        StageDescriptor::new(self.config.stages.priority(stage.kind()), stage)
    }
}

fn unknown_group(kind: StageKind, group: &str) -> QueryError {
    QueryError::stage_construction(
        kind.name(),
        StageError::UnknownGroup {
            group: group.to_string(),
        },
    )
}

fn check_property_range(def: &GroupDefinition, range: &PropertyRange) -> Result<(), StageError> {
    let property = def.property_definition(&range.property).ok_or_else(|| {
        StageError::UnknownRangeProperty {
            property: range.property.clone(),
        }
    })?;

    if let Some(bound) = range.bounds().find(|v| !property.value_type.accepts(v)) {
        return Err(StageError::RangeBoundType {
            property: range.property.clone(),
            expected: property.value_type.label(),
            found: bound.label(),
        });
    }
    if range.is_empty() {
        return Err(StageError::EmptyRange {
            property: range.property.clone(),
        });
    }

    Ok(())
}
