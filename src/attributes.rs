use crate::core_parser::ByteReader;
use crate::errors::{DecodeError, StreamKind};
use crate::models::ReplayContext;
use crate::schema::{Line, SchemaTable};
use serde::Serialize;
use std::sync::OnceLock;
use tracing::debug;

/// Bytes taken by one attribute record
const RECORD_SIZE: usize = 13;

/// A lobby setting, such as a player's race or the game speed. The id identifies the setting and
/// the value is a short code like `Prot` or `Fast`.
#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct Attribute {
    pub namespace: u32,
    pub id: u32,

    /// Player the attribute applies to, where 16 is the entire game
    pub player: u8,
    pub value: String,
}

/// Header length of the attributes stream per build
pub fn schemas() -> &'static SchemaTable<usize> {
    static TABLE: OnceLock<SchemaTable<usize>> = OnceLock::new();
    TABLE.get_or_init(|| {
        SchemaTable::new(
            StreamKind::Attributes,
            vec![(15405, Line::Any, 4), (17326, Line::Any, 5)],
        )
    })
}

/// Decodes the attributes stream. Unlike the other streams, it is little endian and byte
/// oriented. Bytes after the last record are ignored.
pub fn decode_attributes(
    data: &[u8],
    context: &ReplayContext,
) -> Result<Vec<Attribute>, DecodeError> {
    let header = *schemas().resolve_for(context)?;
    let mut parser = ByteReader::little_endian(data);
    parser.skip(header)?;
    let count = parser.read_u32()? as usize;

    let mut res = Vec::with_capacity(count.min(parser.remaining() / RECORD_SIZE));
    for _ in 0..count {
        res.push(Attribute {
            namespace: parser.read_u32()?,
            id: parser.read_u32()?,
            player: parser.read_u8()?,
            value: parser.read_reversed_string(4)?,
        });
    }

    debug!(count = res.len(), "decoded attributes");
    Ok(res)
}
