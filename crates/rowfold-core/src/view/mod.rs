//! Module: view
//! Responsibility: group selection plus per-group filter configuration.
//! Does not own: schema metadata or stage encoding.

mod validate;

#[cfg(test)]
mod tests;

use crate::filter::ElementFilter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// re-exports
pub use validate::validate;

///
/// ViewElementDefinition
///
/// Filters configured for one selected group.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ViewElementDefinition {
    #[serde(default)]
    pub pre_aggregation_filter: Option<ElementFilter>,
    #[serde(default)]
    pub post_aggregation_filter: Option<ElementFilter>,
}

impl ViewElementDefinition {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pre_aggregation_filter(mut self, filter: ElementFilter) -> Self {
        self.pre_aggregation_filter = Some(filter);
        self
    }

    #[must_use]
    pub fn post_aggregation_filter(mut self, filter: ElementFilter) -> Self {
        self.post_aggregation_filter = Some(filter);
        self
    }

    // Treat an empty filter the same as no filter.
    fn has(filter: Option<&ElementFilter>) -> bool {
        filter.is_some_and(|f| !f.is_empty())
    }
}

///
/// View
///
/// Two disjoint group selections: edge groups and entity groups.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct View {
    #[serde(default)]
    edges: BTreeMap<String, ViewElementDefinition>,
    #[serde(default)]
    entities: BTreeMap<String, ViewElementDefinition>,
}

impl View {
    #[must_use]
    pub fn builder() -> ViewBuilder {
        ViewBuilder::default()
    }

    pub fn edge_groups(&self) -> impl ExactSizeIterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    pub fn entity_groups(&self) -> impl ExactSizeIterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    /// Definition of one selected group, edge or entity.
    #[must_use]
    pub fn element(&self, group: &str) -> Option<&ViewElementDefinition> {
        self.edges.get(group).or_else(|| self.entities.get(group))
    }

    #[must_use]
    pub fn is_edge_group(&self, group: &str) -> bool {
        self.edges.contains_key(group)
    }

    /// Whether `group` carries a non-empty pre-aggregation filter.
    #[must_use]
    pub fn has_pre_aggregation_filters(&self, group: &str) -> bool {
        self.element(group)
            .is_some_and(|def| ViewElementDefinition::has(def.pre_aggregation_filter.as_ref()))
    }

    /// Whether `group` carries a non-empty post-aggregation filter.
    #[must_use]
    pub fn has_post_aggregation_filters(&self, group: &str) -> bool {
        self.element(group)
            .is_some_and(|def| ViewElementDefinition::has(def.post_aggregation_filter.as_ref()))
    }
}

///
/// ViewBuilder
///

#[derive(Debug, Default)]
pub struct ViewBuilder {
    view: View,
}

impl ViewBuilder {
    #[must_use]
    pub fn edge(mut self, group: impl Into<String>, def: ViewElementDefinition) -> Self {
        self.view.edges.insert(group.into(), def);
        self
    }

    #[must_use]
    pub fn entity(mut self, group: impl Into<String>, def: ViewElementDefinition) -> Self {
        self.view.entities.insert(group.into(), def);
        self
    }

    #[must_use]
    pub fn build(self) -> View {
        self.view
    }
}
