mod compare;


use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

// re-exports
pub(crate) use compare::cmp_numeric;

///
/// Value
///
/// Dynamic property and vertex value carried by graph elements.
/// Ordering is total: variant rank first, then payload.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float64(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Stable rank used by canonical ordering and ordered key encoding.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Null => 0x00,
            Self::Bool(_) => 0x01,
            Self::Int(_) => 0x02,
            Self::Uint(_) => 0x03,
            Self::Float64(_) => 0x04,
            Self::Text(_) => 0x05,
            Self::Blob(_) => 0x06,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float64(_) => "float64",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Uint(_) | Self::Float64(_))
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Compare two values, widening numerics across `Int`, `Uint` and `Float64`.
    ///
    /// Non-numeric pairs fall back to canonical ordering.
    #[must_use]
    pub fn cmp_widened(&self, other: &Self) -> Ordering {
        cmp_numeric(self, other).unwrap_or_else(|| self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Uint(a), Self::Uint(b)) => a.cmp(b),
            (Self::Float64(a), Self::Float64(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Blob(a), Self::Blob(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}u"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Blob(v) => write!(f, "blob[{}]", v.len()),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => Uint,
    u64 => Uint,
    f64 => Float64,
    String => Text,
    &str => Text,
    Vec<u8> => Blob,
}
