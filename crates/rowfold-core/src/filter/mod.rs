//! Module: filter
//! Responsibility: element predicates carried by views into filter stages.
//! Does not own: stage ordering or scan execution.

mod predicate;


use crate::{
    model::{Element, ElementKind},
    schema::GroupDefinition,
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;

// re-exports
pub use predicate::Predicate;

///
/// FilterSelection
///
/// Which element field a clause reads.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterSelection {
    Property(String),
    Vertex,
    Source,
    Destination,
}

impl FilterSelection {
    #[must_use]
    pub fn property(name: impl Into<String>) -> Self {
        Self::Property(name.into())
    }

    fn resolve<'a>(&self, element: &'a Element) -> Option<&'a Value> {
        match (self, element) {
            (Self::Property(name), _) => element.property(name),
            (Self::Vertex, Element::Entity { vertex, .. }) => Some(vertex),
            (Self::Source, Element::Edge { source, .. }) => Some(source),
            (Self::Destination, Element::Edge { destination, .. }) => Some(destination),
            _ => None,
        }
    }
}

impl fmt::Display for FilterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(name) => write!(f, "{name}"),
            Self::Vertex => write!(f, "<vertex>"),
            Self::Source => write!(f, "<source>"),
            Self::Destination => write!(f, "<destination>"),
        }
    }
}

///
/// FilterClause
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FilterClause {
    pub selection: FilterSelection,
    pub predicate: Predicate,
}

///
/// ElementFilter
///
/// Conjunction of clauses; an element passes when every clause passes.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ElementFilter {
    clauses: Vec<FilterClause>,
}

impl ElementFilter {
    #[must_use]
    pub fn builder() -> ElementFilterBuilder {
        ElementFilterBuilder::default()
    }

    #[must_use]
    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    #[must_use]
    pub fn test(&self, element: &Element) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.predicate.test(clause.selection.resolve(element)))
    }

    /// Check every clause against the selected group's definition.
    pub fn validate(&self, group: &GroupDefinition) -> Result<(), FilterError> {
        for clause in &self.clauses {
            validate_clause(clause, group)?;
        }

        Ok(())
    }
}

fn validate_clause(clause: &FilterClause, group: &GroupDefinition) -> Result<(), FilterError> {
    if clause.predicate.has_empty_composite() {
        return Err(FilterError::EmptyComposite {
            selection: clause.selection.to_string(),
        });
    }

    let value_type = match &clause.selection {
        FilterSelection::Property(name) => {
            group
                .property_definition(name)
                .ok_or_else(|| FilterError::UnknownProperty {
                    property: name.clone(),
                })?
                .value_type
        }
        FilterSelection::Vertex if group.kind == ElementKind::Entity => return Ok(()),
        FilterSelection::Source | FilterSelection::Destination
            if group.kind == ElementKind::Edge =>
        {
            return Ok(());
        }
        selection => {
            return Err(FilterError::SelectionNotApplicable {
                selection: selection.to_string(),
                kind: group.kind,
            });
        }
    };

    let mut mismatch = None;
    clause.predicate.for_each_literal(&mut |literal| {
        if mismatch.is_none() && !value_type.accepts(literal) {
            mismatch = Some(literal.label());
        }
    });

    match mismatch {
        Some(literal) => Err(FilterError::LiteralTypeMismatch {
            property: clause.selection.to_string(),
            expected: value_type.label(),
            found: literal,
        }),
        None => Ok(()),
    }
}

///
/// ElementFilterBuilder
///
/// Fluent `select(..).execute(..)` builder; each `execute` closes one clause.
///

#[derive(Debug, Default)]
pub struct ElementFilterBuilder {
    clauses: Vec<FilterClause>,
    pending: Option<FilterSelection>,
}

impl ElementFilterBuilder {
    #[must_use]
    pub fn select(mut self, selection: FilterSelection) -> Self {
        self.pending = Some(selection);
        self
    }

    /// Attach a predicate to the pending selection.
    ///
    /// Without a pending selection the predicate is dropped.
    #[must_use]
    pub fn execute(mut self, predicate: Predicate) -> Self {
        if let Some(selection) = self.pending.take() {
            self.clauses.push(FilterClause {
                selection,
                predicate,
            });
        }
        self
    }

    #[must_use]
    pub fn build(self) -> ElementFilter {
        ElementFilter {
            clauses: self.clauses,
        }
    }
}

///
/// FilterError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum FilterError {
    #[error("filter references unknown property '{property}'")]
    UnknownProperty { property: String },

    #[error("selection '{selection}' does not apply to {kind} groups")]
    SelectionNotApplicable {
        selection: String,
        kind: ElementKind,
    },

    #[error("filter on '{property}' expects {expected} literals, found {found}")]
    LiteralTypeMismatch {
        property: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("filter on '{selection}' contains an empty and/or list")]
    EmptyComposite { selection: String },
}
