//! Module: key::ordered
//! Responsibility: value component bytes whose lexicographic order matches
//! canonical `Value` order.
//! Boundary: used by row-key layout only.

use crate::{key::KeyError, value::Value};

// Escaped terminator used by variable-length payloads.
pub(super) const TERMINATOR: [u8; 2] = [0x00, 0x00];
const ESCAPED_ZERO: [u8; 2] = [0x00, 0xFF];

/// Encode one vertex component: canonical rank byte, then payload.
pub(crate) fn encode_component(out: &mut Vec<u8>, value: &Value) -> Result<(), KeyError> {
    out.push(value.rank());

    match value {
        Value::Null => return Err(KeyError::NullVertex),
        Value::Bool(v) => out.push(u8::from(*v)),
        Value::Int(v) => out.extend_from_slice(&ordered_i64_bytes(*v)),
        Value::Uint(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::Float64(v) => out.extend_from_slice(&ordered_f64_bytes(*v)),
        Value::Text(v) => push_terminated_bytes(out, v.as_bytes()),
        Value::Blob(v) => push_terminated_bytes(out, v),
    }

    Ok(())
}

/// Decode one component written by [`encode_component`], returning the
/// value and the number of bytes consumed.
pub(crate) fn decode_component(bytes: &[u8]) -> Result<(Value, usize), KeyError> {
    let (&rank, payload) = bytes.split_first().ok_or(KeyError::Truncated)?;

    let (value, used) = match rank {
        0x01 => {
            let byte = *payload.first().ok_or(KeyError::Truncated)?;
            (Value::Bool(byte != 0), 1)
        }
        0x02 => (Value::Int(decode_ordered_i64(fixed::<8>(payload)?)), 8),
        0x03 => (Value::Uint(u64::from_be_bytes(fixed::<8>(payload)?)), 8),
        0x04 => (Value::Float64(decode_ordered_f64(fixed::<8>(payload)?)), 8),
        0x05 => {
            let (raw, used) = read_terminated_bytes(payload)?;
            let text = String::from_utf8(raw).map_err(|_| KeyError::InvalidUtf8)?;
            (Value::Text(text), used)
        }
        0x06 => {
            let (raw, used) = read_terminated_bytes(payload)?;
            (Value::Blob(raw), used)
        }
        other => return Err(KeyError::UnknownTag { tag: other }),
    };

    Ok((value, used + 1))
}

fn fixed<const N: usize>(payload: &[u8]) -> Result<[u8; N], KeyError> {
    payload
        .get(..N)
        .and_then(|slice| <[u8; N]>::try_from(slice).ok())
        .ok_or(KeyError::Truncated)
}

const fn ordered_i64_bytes(value: i64) -> [u8; 8] {
    (value.cast_unsigned() ^ (1u64 << 63)).to_be_bytes()
}

const fn decode_ordered_i64(bytes: [u8; 8]) -> i64 {
    (u64::from_be_bytes(bytes) ^ (1u64 << 63)).cast_signed()
}

// Positive floats flip the sign bit; negative floats flip every bit.
const fn ordered_f64_bytes(value: f64) -> [u8; 8] {
    let bits = value.to_bits();
    let ordered = if bits >> 63 == 0 {
        bits ^ (1u64 << 63)
    } else {
        !bits
    };

    ordered.to_be_bytes()
}

const fn decode_ordered_f64(bytes: [u8; 8]) -> f64 {
    let ordered = u64::from_be_bytes(bytes);
    let bits = if ordered >> 63 == 1 {
        ordered ^ (1u64 << 63)
    } else {
        !ordered
    };

    f64::from_bits(bits)
}

// Byte strings are escaped so component boundaries remain unambiguous.
fn push_terminated_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    for &byte in bytes {
        if byte == 0 {
            out.extend_from_slice(&ESCAPED_ZERO);
        } else {
            out.push(byte);
        }
    }

    out.extend_from_slice(&TERMINATOR);
}

fn read_terminated_bytes(bytes: &[u8]) -> Result<(Vec<u8>, usize), KeyError> {
    let mut out = Vec::new();
    let mut index = 0;

    loop {
        match (bytes.get(index), bytes.get(index + 1)) {
            (Some(0x00), Some(0x00)) => return Ok((out, index + 2)),
            (Some(0x00), Some(0xFF)) => {
                out.push(0);
                index += 2;
            }
            (Some(0x00), _) => return Err(KeyError::Truncated),
            (Some(&byte), _) => {
                out.push(byte);
                index += 1;
            }
            (None, _) => return Err(KeyError::Truncated),
        }
    }
}
