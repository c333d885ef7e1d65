use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

///
/// Predicate
///
/// Single-value test applied to one selected element field.
/// Comparisons widen numerics; `Exists` is the only predicate that
/// sees a missing field as anything other than a failure.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Exists,
    IsEqual(Value),
    IsLessThan { value: Value, or_equal: bool },
    IsMoreThan { value: Value, or_equal: bool },
    IsIn(Vec<Value>),
    Not(Box<Self>),
    And(Vec<Self>),
    Or(Vec<Self>),
}

impl Predicate {
    #[must_use]
    pub fn eq(value: impl Into<Value>) -> Self {
        Self::IsEqual(value.into())
    }

    #[must_use]
    pub fn lt(value: impl Into<Value>) -> Self {
        Self::IsLessThan {
            value: value.into(),
            or_equal: false,
        }
    }

    #[must_use]
    pub fn lte(value: impl Into<Value>) -> Self {
        Self::IsLessThan {
            value: value.into(),
            or_equal: true,
        }
    }

    #[must_use]
    pub fn gt(value: impl Into<Value>) -> Self {
        Self::IsMoreThan {
            value: value.into(),
            or_equal: false,
        }
    }

    #[must_use]
    pub fn gte(value: impl Into<Value>) -> Self {
        Self::IsMoreThan {
            value: value.into(),
            or_equal: true,
        }
    }

    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Evaluate against one field; `None` means the field is missing.
    #[must_use]
    pub fn test(&self, input: Option<&Value>) -> bool {
        match self {
            Self::Exists => input.is_some_and(|v| !v.is_null()),
            Self::IsEqual(expected) => {
                input.is_some_and(|v| v.cmp_widened(expected) == Ordering::Equal)
            }
            Self::IsLessThan { value, or_equal } => {
                input.is_some_and(|v| match v.cmp_widened(value) {
                    Ordering::Less => true,
                    Ordering::Equal => *or_equal,
                    Ordering::Greater => false,
                })
            }
            Self::IsMoreThan { value, or_equal } => {
                input.is_some_and(|v| match v.cmp_widened(value) {
                    Ordering::Greater => true,
                    Ordering::Equal => *or_equal,
                    Ordering::Less => false,
                })
            }
            Self::IsIn(values) => input.is_some_and(|v| {
                values
                    .iter()
                    .any(|candidate| v.cmp_widened(candidate) == Ordering::Equal)
            }),
            Self::Not(inner) => !inner.test(input),
            Self::And(children) => children.iter().all(|child| child.test(input)),
            Self::Or(children) => children.iter().any(|child| child.test(input)),
        }
    }

    /// Visit literal operands in evaluation order.
    pub(crate) fn for_each_literal(&self, f: &mut impl FnMut(&Value)) {
        match self {
            Self::Exists => {}
            Self::IsEqual(value)
            | Self::IsLessThan { value, .. }
            | Self::IsMoreThan { value, .. } => f(value),
            Self::IsIn(values) => values.iter().for_each(f),
            Self::Not(inner) => inner.for_each_literal(f),
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.for_each_literal(f);
                }
            }
        }
    }

    // Return true when any composite node has no children.
    pub(crate) fn has_empty_composite(&self) -> bool {
        match self {
            Self::And(children) | Self::Or(children) => {
                children.is_empty() || children.iter().any(Self::has_empty_composite)
            }
            Self::Not(inner) => inner.has_empty_composite(),
            _ => false,
        }
    }
}
