use crate::{
    key::{ByteEntityEncoder, KeyError},
    model::Element,
    store::{RawEntry, StoreKey},
};
use thiserror::Error as ThisError;

///
/// ElementCodec
///
/// Maps elements to physical store entries and back.
///

pub trait ElementCodec {
    /// Every entry storing `element`; `sequence` disambiguates versions
    /// that share a row key.
    fn encode(&self, element: &Element, sequence: u64) -> Result<Vec<RawEntry>, CodecError>;

    fn decode(&self, entry: &RawEntry) -> Result<Element, CodecError>;
}

///
/// CborElementCodec
///
/// Byte-entity row keys, group as column family, big-endian sequence as
/// qualifier, CBOR-encoded element as value.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct CborElementCodec;

impl ElementCodec for CborElementCodec {
    fn encode(&self, element: &Element, sequence: u64) -> Result<Vec<RawEntry>, CodecError> {
        let rows = match element {
            Element::Entity { vertex, .. } => vec![ByteEntityEncoder::entity_row(vertex)?],
            Element::Edge {
                source,
                destination,
                directed,
                ..
            } => ByteEntityEncoder::edge_rows(source, destination, *directed)?,
        };
        let value = encode_value(element)?;
        let qualifier = sequence.to_be_bytes().to_vec();

        Ok(rows
            .into_iter()
            .map(|row| RawEntry {
                key: StoreKey::new(row, element.group(), qualifier.clone()),
                value: value.clone(),
            })
            .collect())
    }

    fn decode(&self, entry: &RawEntry) -> Result<Element, CodecError> {
        let element: Element = serde_cbor::from_slice(&entry.value)
            .map_err(|err| CodecError::Deserialize(err.to_string()))?;

        if element.group() != entry.key.family {
            return Err(CodecError::FamilyMismatch {
                family: entry.key.family.clone(),
                group: element.group().to_string(),
            });
        }

        Ok(element)
    }
}

pub(crate) fn encode_value(element: &Element) -> Result<Vec<u8>, CodecError> {
    serde_cbor::to_vec(element).map_err(|err| CodecError::Serialize(err.to_string()))
}

///
/// CodecError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CodecError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("element serialization failed: {0}")]
    Serialize(String),

    #[error("element deserialization failed: {0}")]
    Deserialize(String),

    #[error("entry in family '{family}' decodes to group '{group}'")]
    FamilyMismatch { family: String, group: String },
}
