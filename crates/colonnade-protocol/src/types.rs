//! Column type descriptors for result-set metadata
//!
//! A column's wire type is an option: an unsigned 16-bit discriminant,
//! recursive for the collection variants. The tag tree decoded here drives
//! value decoding in [`crate::value`].

use serde::{Deserialize, Serialize};

use crate::buffer::get_option;
use crate::error::{ProtocolError, Result};

/// Wire discriminants for column types.
///
/// `0x0005` (counter) and `0x000A` (text) are reserved on the wire and
/// rejected as column discriminants; text surfaces only as a value-layer
/// alias of varchar.
mod code {
    pub const ASCII: u16 = 0x0001;
    pub const BIGINT: u16 = 0x0002;
    pub const BLOB: u16 = 0x0003;
    pub const BOOLEAN: u16 = 0x0004;
    // pub const COUNTER: u16 = 0x0005;
    pub const DECIMAL: u16 = 0x0006;
    pub const DOUBLE: u16 = 0x0007;
    pub const FLOAT: u16 = 0x0008;
    pub const INT: u16 = 0x0009;
    // pub const TEXT: u16 = 0x000A;
    pub const TIMESTAMP: u16 = 0x000B;
    pub const UUID: u16 = 0x000C;
    pub const VARCHAR: u16 = 0x000D;
    pub const VARINT: u16 = 0x000E;
    pub const TIMEUUID: u16 = 0x000F;
    pub const INET: u16 = 0x0010;
    pub const LIST: u16 = 0x0020;
    pub const MAP: u16 = 0x0021;
    pub const SET: u16 = 0x0022;
}

/// Type of one result-set column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Ascii,
    Bigint,
    Blob,
    Boolean,
    Decimal,
    Double,
    Float,
    Int,
    Timestamp,
    Uuid,
    Varchar,
    Varint,
    Timeuuid,
    Inet,
    List(Box<ColumnType>),
    Map(Box<ColumnType>, Box<ColumnType>),
    Set(Box<ColumnType>),
}

impl ColumnType {
    /// Decode a column type option, recursing into collection element
    /// types. Unknown or reserved discriminants fail.
    pub fn decode(cursor: &mut &[u8]) -> Result<Self> {
        get_option(cursor, |id, cursor| match id {
            code::ASCII => Ok(ColumnType::Ascii),
            code::BIGINT => Ok(ColumnType::Bigint),
            code::BLOB => Ok(ColumnType::Blob),
            code::BOOLEAN => Ok(ColumnType::Boolean),
            code::DECIMAL => Ok(ColumnType::Decimal),
            code::DOUBLE => Ok(ColumnType::Double),
            code::FLOAT => Ok(ColumnType::Float),
            code::INT => Ok(ColumnType::Int),
            code::TIMESTAMP => Ok(ColumnType::Timestamp),
            code::UUID => Ok(ColumnType::Uuid),
            code::VARCHAR => Ok(ColumnType::Varchar),
            code::VARINT => Ok(ColumnType::Varint),
            code::TIMEUUID => Ok(ColumnType::Timeuuid),
            code::INET => Ok(ColumnType::Inet),
            code::LIST => Ok(ColumnType::List(Box::new(ColumnType::decode(cursor)?))),
            code::MAP => {
                let key = Box::new(ColumnType::decode(cursor)?);
                let value = Box::new(ColumnType::decode(cursor)?);
                Ok(ColumnType::Map(key, value))
            }
            code::SET => Ok(ColumnType::Set(Box::new(ColumnType::decode(cursor)?))),
            other => Err(ProtocolError::UnsupportedColumnType(other)),
        })
    }

    /// Check if this type is a collection type.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            ColumnType::List(_) | ColumnType::Map(_, _) | ColumnType::Set(_)
        )
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Ascii => write!(f, "ascii"),
            ColumnType::Bigint => write!(f, "bigint"),
            ColumnType::Blob => write!(f, "blob"),
            ColumnType::Boolean => write!(f, "boolean"),
            ColumnType::Decimal => write!(f, "decimal"),
            ColumnType::Double => write!(f, "double"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Int => write!(f, "int"),
            ColumnType::Timestamp => write!(f, "timestamp"),
            ColumnType::Uuid => write!(f, "uuid"),
            ColumnType::Varchar => write!(f, "varchar"),
            ColumnType::Varint => write!(f, "varint"),
            ColumnType::Timeuuid => write!(f, "timeuuid"),
            ColumnType::Inet => write!(f, "inet"),
            ColumnType::List(inner) => write!(f, "list<{inner}>"),
            ColumnType::Map(key, value) => write!(f, "map<{key}, {value}>"),
            ColumnType::Set(inner) => write!(f, "set<{inner}>"),
        }
    }
}

/// Metadata for one column of a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub keyspace: String,
    pub table: String,
    pub name: String,
    pub data_type: ColumnType,
}
