//! Shared fixtures for in-crate tests.

use crate::{
    config::StoreConfig,
    model::{Element, ElementKind},
    schema::{AggregateFunction, GroupDefinition, PropertyDefinition, Schema, ValueType},
    view::{View, ViewElementDefinition},
};

/// `Person` entities and `Knows` edges, with summing counters on both.
pub(crate) fn schema() -> Schema {
    Schema::new()
        .entity(
            "Person",
            GroupDefinition::new(ElementKind::Entity)
                .property(
                    "count",
                    PropertyDefinition::new(ValueType::Uint).aggregated_by(AggregateFunction::Sum),
                )
                .property(
                    "age",
                    PropertyDefinition::new(ValueType::Int).aggregated_by(AggregateFunction::Max),
                )
                .property("name", PropertyDefinition::new(ValueType::Text)),
        )
        .edge(
            "Knows",
            GroupDefinition::new(ElementKind::Edge).property(
                "weight",
                PropertyDefinition::new(ValueType::Uint).aggregated_by(AggregateFunction::Sum),
            ),
        )
}

pub(crate) fn config() -> StoreConfig {
    StoreConfig::new(schema())
}

pub(crate) fn person(vertex: &str, count: u64) -> Element {
    Element::entity("Person", vertex).with_property("count", count)
}

pub(crate) fn knows(source: &str, destination: &str, directed: bool, weight: u64) -> Element {
    Element::edge("Knows", source, destination, directed).with_property("weight", weight)
}

pub(crate) fn entity_view(group: &str, def: ViewElementDefinition) -> View {
    View::builder().entity(group, def).build()
}

pub(crate) fn edge_view(group: &str, def: ViewElementDefinition) -> View {
    View::builder().edge(group, def).build()
}
