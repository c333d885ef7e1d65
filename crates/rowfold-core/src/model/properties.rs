use crate::value::Value;
use derive_more::{Deref, DerefMut, IntoIterator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// Properties
///
/// Ordered property map of one element.
///

#[derive(
    Clone, Debug, Default, Deref, DerefMut, Deserialize, Eq, IntoIterator, PartialEq, Serialize,
)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, Value>);

impl Properties {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
