//! Decoder for the self describing tagged value trees that the details and tracker streams are
//! serialized with.
//!
//! Every node starts on a byte boundary with a one byte tag:
//!
//! | tag | node      | payload                                        |
//! |-----|-----------|------------------------------------------------|
//! | 0   | array     | vint count followed by that many nodes         |
//! | 1   | bit array | vint length in bits followed by the bytes      |
//! | 2   | blob      | vint length followed by the bytes              |
//! | 3   | choice    | vint tag followed by a node                    |
//! | 4   | optional  | presence byte followed by a node when non-zero |
//! | 5   | struct    | vint count of (vint key, node) pairs           |
//! | 6   | u8        | one byte                                       |
//! | 7   | u32       | four bytes, big endian                         |
//! | 8   | u64       | eight bytes, big endian                        |
//! | 9   | vint      | variable length signed integer                 |

use crate::bits::BitReader;
use crate::errors::DecodeError;
use crate::parsing_utils::{be_u32, be_u64, decode_lossy};
use serde::Serialize;

const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Value {
    Array(Vec<Value>),
    BitArray { len: i64, bytes: Vec<u8> },
    Blob(Vec<u8>),
    Choice(i64, Box<Value>),
    Optional(Option<Box<Value>>),
    Struct(Vec<(i64, Value)>),
    U8(u8),
    U32(u32),
    U64(u64),
    Int(i64),
}

/// Decodes one value tree starting at the next byte boundary
pub fn read_struct(bits: &mut BitReader<'_>) -> Result<Value, DecodeError> {
    bits.byte_align()?;
    read_node(bits, 0)
}

fn malformed(bits: &BitReader<'_>, reason: impl Into<String>) -> DecodeError {
    DecodeError::MalformedVariantStruct {
        byte_pos: bits.byte_pos(),
        reason: reason.into(),
    }
}

fn read_byte(bits: &mut BitReader<'_>) -> Result<u8, DecodeError> {
    match bits.read_aligned_bytes(1) {
        Ok(d) => Ok(d[0]),
        Err(_) => Err(malformed(bits, "unexpected end of input")),
    }
}

fn read_vint(bits: &mut BitReader<'_>) -> Result<i64, DecodeError> {
    let mut b = read_byte(bits)?;
    let negative = b & 1 == 1;
    let mut magnitude = u64::from((b >> 1) & 0x3f);
    let mut shift = 6;
    while b & 0x80 != 0 {
        if shift > 63 {
            return Err(malformed(bits, "varint wider than 64 bits"));
        }

        b = read_byte(bits)?;
        let chunk = u64::from(b & 0x7f);
        if shift > 57 && chunk >> (64 - shift) != 0 {
            return Err(malformed(bits, "varint wider than 64 bits"));
        }

        magnitude |= chunk << shift;
        shift += 7;
    }

    let value =
        i64::try_from(magnitude).map_err(|_| malformed(bits, "varint wider than 64 bits"))?;
    Ok(if negative { -value } else { value })
}

/// A length prefix that is checked against what remains of the input. Every element takes
/// at least `min_width` bytes.
fn read_count(bits: &mut BitReader<'_>, min_width: usize) -> Result<usize, DecodeError> {
    let count = read_vint(bits)?;
    let remaining = bits.bits_remaining() / 8;
    usize::try_from(count)
        .ok()
        .filter(|&c| c.saturating_mul(min_width) <= remaining)
        .ok_or_else(|| {
            malformed(
                bits,
                format!("count of {} exceeds the {} remaining bytes", count, remaining),
            )
        })
}

fn read_fixed<'a>(bits: &mut BitReader<'a>, size: usize) -> Result<&'a [u8], DecodeError> {
    if size > bits.bits_remaining() / 8 {
        return Err(malformed(bits, "unexpected end of input"));
    }
    bits.read_aligned_bytes(size)
}

fn read_node(bits: &mut BitReader<'_>, depth: usize) -> Result<Value, DecodeError> {
    if depth > MAX_DEPTH {
        return Err(malformed(bits, "nested too deeply"));
    }

    let tag = read_byte(bits)?;
    match tag {
        0 => {
            let count = read_count(bits, 1)?;
            let mut res = Vec::with_capacity(count);
            for _ in 0..count {
                res.push(read_node(bits, depth + 1)?);
            }
            Ok(Value::Array(res))
        }
        1 => {
            let len = read_vint(bits)?;
            let size = usize::try_from(len)
                .map(|x| (x + 7) / 8)
                .map_err(|_| malformed(bits, "negative bit array length"))?;
            let bytes = read_fixed(bits, size)?.to_vec();
            Ok(Value::BitArray { len, bytes })
        }
        2 => {
            let size = read_count(bits, 1)?;
            Ok(Value::Blob(read_fixed(bits, size)?.to_vec()))
        }
        3 => {
            let choice = read_vint(bits)?;
            let value = read_node(bits, depth + 1)?;
            Ok(Value::Choice(choice, Box::new(value)))
        }
        4 => {
            if read_byte(bits)? != 0 {
                let value = read_node(bits, depth + 1)?;
                Ok(Value::Optional(Some(Box::new(value))))
            } else {
                Ok(Value::Optional(None))
            }
        }
        5 => {
            let count = read_count(bits, 2)?;
            let mut res = Vec::with_capacity(count);
            for _ in 0..count {
                let key = read_vint(bits)?;
                let value = read_node(bits, depth + 1)?;
                res.push((key, value));
            }
            Ok(Value::Struct(res))
        }
        6 => read_byte(bits).map(Value::U8),
        7 => read_fixed(bits, 4).map(be_u32).map(Value::U32),
        8 => read_fixed(bits, 8).map(be_u64).map(Value::U64),
        9 => read_vint(bits).map(Value::Int),
        x => {
            // report the position of the offending tag
            let byte_pos = bits.byte_pos() - 1;
            Err(DecodeError::MalformedVariantStruct {
                byte_pos,
                reason: format!("unknown tag {}", x),
            })
        }
    }
}

impl Value {
    /// Human readable name of the node type
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Array(_) => "array",
            Value::BitArray { .. } => "bit array",
            Value::Blob(_) => "blob",
            Value::Choice(_, _) => "choice",
            Value::Optional(_) => "optional",
            Value::Struct(_) => "struct",
            Value::U8(_) | Value::U32(_) | Value::U64(_) | Value::Int(_) => "integer",
        }
    }

    /// Looks through an optional wrapper. A present optional yields its contents and an absent
    /// one yields `None`. Anything else is returned as is.
    pub fn unwrap_optional(&self) -> Option<&Value> {
        match self {
            Value::Optional(x) => x.as_deref(),
            x => Some(x),
        }
    }

    /// Struct field by key, when this is a struct that has it
    pub fn field(&self, key: i64) -> Option<&Value> {
        match self.unwrap_optional()? {
            Value::Struct(fields) => fields.iter().find(|(k, _)| *k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn require(&self, key: i64, path: &str) -> Result<&Value, DecodeError> {
        self.field(key)
            .ok_or_else(|| DecodeError::shape("struct field", format!("{}.{}", path, key)))
    }

    pub fn index(&self, index: usize, path: &str) -> Result<&Value, DecodeError> {
        self.as_array(path)?
            .get(index)
            .ok_or_else(|| DecodeError::shape("array element", format!("{}[{}]", path, index)))
    }

    pub fn as_array(&self, path: &str) -> Result<&[Value], DecodeError> {
        match self.unwrap_optional() {
            Some(Value::Array(x)) => Ok(x),
            _ => Err(DecodeError::shape("array", path)),
        }
    }

    pub fn as_i64(&self, path: &str) -> Result<i64, DecodeError> {
        match self.unwrap_optional() {
            Some(Value::U8(x)) => Ok(i64::from(*x)),
            Some(Value::U32(x)) => Ok(i64::from(*x)),
            Some(Value::U64(x)) => {
                i64::try_from(*x).map_err(|_| DecodeError::shape("64 bit signed integer", path))
            }
            Some(Value::Int(x)) => Ok(*x),
            _ => Err(DecodeError::shape("integer", path)),
        }
    }

    /// Integer that has to fit within `T`
    pub fn as_int<T: TryFrom<i64>>(&self, path: &str) -> Result<T, DecodeError> {
        let x = self.as_i64(path)?;
        T::try_from(x).map_err(|_| DecodeError::shape("integer within range", path))
    }

    pub fn as_bool(&self, path: &str) -> Result<bool, DecodeError> {
        self.as_i64(path).map(|x| x != 0)
    }

    pub fn as_bytes(&self, path: &str) -> Result<&[u8], DecodeError> {
        match self.unwrap_optional() {
            Some(Value::Blob(x)) => Ok(x),
            _ => Err(DecodeError::shape("blob", path)),
        }
    }

    pub fn as_text(&self, path: &str) -> Result<String, DecodeError> {
        self.as_bytes(path).map(decode_lossy)
    }

    /// `None` when the node is an absent optional
    pub fn opt<'v, T, F>(&'v self, f: F) -> Result<Option<T>, DecodeError>
    where
        F: FnOnce(&'v Value) -> Result<T, DecodeError>,
    {
        match self {
            Value::Optional(None) => Ok(None),
            x => f(x).map(Some),
        }
    }
}
