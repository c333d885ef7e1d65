use crate::value::{Value, cmp_numeric};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error as ThisError;

///
/// AggregateFunction
///
/// Binary combine declared per property by a group's schema.
/// Row-key aggregation folds every row of one key through these.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    Sum,
    Min,
    Max,
    First,
    Last,
    Count,
    Or,
    And,
}

impl AggregateFunction {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::First => "first",
            Self::Last => "last",
            Self::Count => "count",
            Self::Or => "or",
            Self::And => "and",
        }
    }

    /// Seed value for the first row of a key.
    ///
    /// `Count` ignores the stored value and counts contributing rows.
    #[must_use]
    pub fn init(self, value: Value) -> Value {
        match self {
            Self::Count => Value::Uint(1),
            _ => value,
        }
    }

    /// Fold one more row's value into the running state.
    pub fn combine(self, acc: Value, next: Value) -> Result<Value, AggregateError> {
        match self {
            Self::First => Ok(acc),
            Self::Last => Ok(next),
            Self::Count => match acc {
                Value::Uint(n) => Ok(Value::Uint(n.saturating_add(1))),
                other => Err(AggregateError::TypeMismatch {
                    function: self.label(),
                    left: other.label(),
                    right: "uint",
                }),
            },
            Self::Min | Self::Max => {
                let ordering = cmp_numeric(&acc, &next)
                    .or_else(|| (acc.rank() == next.rank()).then(|| acc.cmp(&next)))
                    .ok_or_else(|| self.mismatch(&acc, &next))?;
                let keep_acc = match self {
                    Self::Min => ordering != Ordering::Greater,
                    _ => ordering != Ordering::Less,
                };

                Ok(if keep_acc { acc } else { next })
            }
            Self::Sum => sum(acc, next).map_err(|(l, r)| self.mismatch(&l, &r)),
            Self::Or | Self::And => match (acc.as_bool(), next.as_bool()) {
                (Some(a), Some(b)) => Ok(Value::Bool(if self == Self::Or {
                    a || b
                } else {
                    a && b
                })),
                _ => Err(self.mismatch(&acc, &next)),
            },
        }
    }

    fn mismatch(self, left: &Value, right: &Value) -> AggregateError {
        AggregateError::TypeMismatch {
            function: self.label(),
            left: left.label(),
            right: right.label(),
        }
    }
}

// Numeric sum; integer variants saturate, mixed kinds widen to float.
#[allow(clippy::cast_precision_loss)]
fn sum(acc: Value, next: Value) -> Result<Value, (Value, Value)> {
    match (acc, next) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.saturating_add(b))),
        (Value::Uint(a), Value::Uint(b)) => Ok(Value::Uint(a.saturating_add(b))),
        (Value::Float64(a), Value::Float64(b)) => Ok(Value::Float64(a + b)),
        (Value::Int(a), Value::Uint(b)) | (Value::Uint(b), Value::Int(a)) => {
            let total = i128::from(a) + i128::from(b);
            Ok(i64::try_from(total)
                .map(Value::Int)
                .unwrap_or(Value::Float64(total as f64)))
        }
        (Value::Float64(a), Value::Int(b)) | (Value::Int(b), Value::Float64(a)) => {
            Ok(Value::Float64(a + b as f64))
        }
        (Value::Float64(a), Value::Uint(b)) | (Value::Uint(b), Value::Float64(a)) => {
            Ok(Value::Float64(a + b as f64))
        }
        (left, right) => Err((left, right)),
    }
}

///
/// AggregateError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum AggregateError {
    #[error("aggregate '{function}' cannot combine {left} with {right}")]
    TypeMismatch {
        function: &'static str,
        left: &'static str,
        right: &'static str,
    },
}
