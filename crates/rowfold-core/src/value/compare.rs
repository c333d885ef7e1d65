use crate::value::Value;
use std::cmp::Ordering;

///
/// NumericRepr
///

enum NumericRepr {
    Signed(i128),
    Float(f64),
}

impl NumericRepr {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(Self::Signed(i128::from(*v))),
            Value::Uint(v) => Some(Self::Signed(i128::from(*v))),
            Value::Float64(v) => Some(Self::Float(*v)),
            _ => None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    const fn as_f64(&self) -> f64 {
        match self {
            Self::Signed(v) => *v as f64,
            Self::Float(v) => *v,
        }
    }
}

/// Compare two numeric values with widening.
///
/// Returns `None` when either side is not numeric.
pub(crate) fn cmp_numeric(left: &Value, right: &Value) -> Option<Ordering> {
    let left = NumericRepr::of(left)?;
    let right = NumericRepr::of(right)?;

    let ordering = match (&left, &right) {
        (NumericRepr::Signed(a), NumericRepr::Signed(b)) => a.cmp(b),
        _ => left.as_f64().total_cmp(&right.as_f64()),
    };

    Some(ordering)
}
