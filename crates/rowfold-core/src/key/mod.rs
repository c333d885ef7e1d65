//! Module: key
//! Responsibility: seed-to-byte-range encoding and the byte-entity row layout.
//! Does not own: scan execution or row value serialization.
//! Boundary: every key the store sees is produced here.

mod ordered;


use crate::{
    model::{ElementSeed, SeedRangePair},
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;

///
/// CONSTANTS
///

pub const ENTITY_FLAG: u8 = 0x01;
pub const DIRECTED_OUTGOING_FLAG: u8 = 0x02;
pub const DIRECTED_INCOMING_FLAG: u8 = 0x03;
pub const UNDIRECTED_FLAG: u8 = 0x04;

///
/// KeyRange
///
/// Half-open row-key range `[start, end)`.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct KeyRange {
    pub start: Vec<u8>,
    pub end: Vec<u8>,
}

impl KeyRange {
    #[must_use]
    pub fn contains(&self, row: &[u8]) -> bool {
        row >= self.start.as_slice() && row < self.end.as_slice()
    }
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", hex(&self.start), hex(&self.end))
    }
}

fn hex(bytes: &[u8]) -> String {
    use fmt::Write as _;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

///
/// RowOrientation
///
/// Role of the leading vertex in one row key.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum RowOrientation {
    Entity,
    Outgoing,
    Incoming,
    Undirected,
}

impl RowOrientation {
    const fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            ENTITY_FLAG => Some(Self::Entity),
            DIRECTED_OUTGOING_FLAG => Some(Self::Outgoing),
            DIRECTED_INCOMING_FLAG => Some(Self::Incoming),
            UNDIRECTED_FLAG => Some(Self::Undirected),
            _ => None,
        }
    }
}

///
/// SeedRangeEncoder
///
/// Seed-to-key boundary. Implementations must be monotonic with respect to
/// the store's byte ordering; range boundaries rely on it.
///

pub trait SeedRangeEncoder {
    fn encode(&self, seed: &ElementSeed) -> Result<Vec<u8>, KeyError>;

    /// Half-open range covering every row of every seed between `start`
    /// and `end`, both inclusive.
    fn range(&self, pair: &SeedRangePair) -> Result<KeyRange, KeyError> {
        let start = self.encode(&pair.start)?;
        let end_prefix = self.encode(&pair.end)?;
        if start > end_prefix {
            return Err(KeyError::InvertedRange);
        }
        let end = prefix_successor(&end_prefix).ok_or(KeyError::NoSuccessor)?;

        Ok(KeyRange { start, end })
    }
}

impl<E: SeedRangeEncoder + ?Sized> SeedRangeEncoder for &E {
    fn encode(&self, seed: &ElementSeed) -> Result<Vec<u8>, KeyError> {
        (**self).encode(seed)
    }
}

///
/// ByteEntityEncoder
///
/// Default key package. Entities occupy one row keyed by vertex; edges occupy
/// two rows, one led by each endpoint, so a vertex range finds both roles.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct ByteEntityEncoder;

impl ByteEntityEncoder {
    /// Row key of one entity.
    pub fn entity_row(vertex: &Value) -> Result<Vec<u8>, KeyError> {
        let mut out = Vec::new();
        ordered::encode_component(&mut out, vertex)?;
        out.push(ENTITY_FLAG);

        Ok(out)
    }

    /// Row keys of one edge, source-led first.
    ///
    /// An undirected self-loop yields a single row.
    pub fn edge_rows(
        source: &Value,
        destination: &Value,
        directed: bool,
    ) -> Result<Vec<Vec<u8>>, KeyError> {
        let (out_flag, in_flag) = if directed {
            (DIRECTED_OUTGOING_FLAG, DIRECTED_INCOMING_FLAG)
        } else {
            (UNDIRECTED_FLAG, UNDIRECTED_FLAG)
        };

        let forward = Self::edge_row(source, out_flag, destination)?;
        let reverse = Self::edge_row(destination, in_flag, source)?;

        if forward == reverse {
            Ok(vec![forward])
        } else {
            Ok(vec![forward, reverse])
        }
    }

    fn edge_row(first: &Value, flag: u8, second: &Value) -> Result<Vec<u8>, KeyError> {
        let mut out = Vec::new();
        ordered::encode_component(&mut out, first)?;
        out.push(flag);
        ordered::encode_component(&mut out, second)?;

        Ok(out)
    }

    /// Recover the role of the leading vertex from a row key.
    pub fn orientation(row: &[u8]) -> Result<RowOrientation, KeyError> {
        let (_, used) = ordered::decode_component(row)?;
        let flag = *row.get(used).ok_or(KeyError::Truncated)?;

        RowOrientation::from_flag(flag).ok_or(KeyError::UnknownFlag { flag })
    }
}

impl SeedRangeEncoder for ByteEntityEncoder {
    fn encode(&self, seed: &ElementSeed) -> Result<Vec<u8>, KeyError> {
        match seed {
            ElementSeed::Entity { vertex } => {
                let mut out = Vec::new();
                ordered::encode_component(&mut out, vertex)?;
                Ok(out)
            }
            ElementSeed::Edge {
                source,
                destination,
                directed,
            } => {
                let flag = if *directed {
                    DIRECTED_OUTGOING_FLAG
                } else {
                    UNDIRECTED_FLAG
                };
                Self::edge_row(source, flag, destination)
            }
        }
    }
}

/// Smallest key greater than every key starting with `prefix`.
///
/// Returns `None` when `prefix` is empty or all `0xFF`.
#[must_use]
pub fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let last = prefix.iter().rposition(|&b| b != u8::MAX)?;
    let mut out = prefix[..=last].to_vec();
    out[last] += 1;

    Some(out)
}

///
/// KeyError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum KeyError {
    #[error("null values cannot be used as vertices")]
    NullVertex,

    #[error("range start seed sorts after its end seed")]
    InvertedRange,

    #[error("range end has no key successor")]
    NoSuccessor,

    #[error("row key is truncated")]
    Truncated,

    #[error("row key contains invalid utf-8 text")]
    InvalidUtf8,

    #[error("row key has unknown component tag 0x{tag:02x}")]
    UnknownTag { tag: u8 },

    #[error("row key has unknown orientation flag 0x{flag:02x}")]
    UnknownFlag { flag: u8 },
}
