//! Decoded column values and result rows
//!
//! [`Value`] is the owned, fully materialized form of one column cell.
//! Decoding takes the raw byte run delivered by the row payload (or `None`
//! for a wire null) together with the column's [`ColumnType`] and recurses
//! into collection element types. Decoded values never borrow from the
//! transport buffer.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::ops::Index;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::buffer::{get_i32, get_i64, get_nullable_short_bytes, get_u8, get_u16, get_u32, get_u64};
use crate::error::{ProtocolError, Result};
use crate::types::ColumnType;

/// One decoded cell of a result set.
///
/// `Text` covers ascii, varchar, and the text alias; `Timestamp` carries
/// millisecond precision; `Varint` and `Decimal` are arbitrary precision.
/// Map entries preserve wire order, with later duplicate keys overwriting
/// earlier ones during decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Text(String),
    Bigint(i64),
    Int(i32),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Blob(Vec<u8>),
    Decimal(BigDecimal),
    Varint(BigInt),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    Inet(IpAddr),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Set(Vec<Value>),
}

impl Value {
    /// Decode a cell from its raw byte run. `None` is the wire null and
    /// decodes to [`Value::Null`] regardless of the column type.
    pub fn decode(bytes: Option<&[u8]>, data_type: &ColumnType) -> Result<Value> {
        let Some(raw) = bytes else {
            return Ok(Value::Null);
        };
        Self::decode_raw(raw, data_type)
    }

    fn decode_raw(raw: &[u8], data_type: &ColumnType) -> Result<Value> {
        let mut cursor = raw;
        let value = match data_type {
            ColumnType::Ascii => {
                if !raw.is_ascii() {
                    return Err(ProtocolError::Malformed(
                        "ascii text contains octets above 0x7f".into(),
                    ));
                }
                let text = std::str::from_utf8(raw)
                    .map_err(|e| ProtocolError::Malformed(format!("invalid utf-8 in text: {e}")))?;
                Value::Text(text.to_owned())
            }
            ColumnType::Varchar => {
                let text = std::str::from_utf8(raw)
                    .map_err(|e| ProtocolError::Malformed(format!("invalid utf-8 in text: {e}")))?;
                Value::Text(text.to_owned())
            }
            ColumnType::Bigint => Value::Bigint(get_i64(&mut cursor)?),
            ColumnType::Int => Value::Int(get_i32(&mut cursor)?),
            ColumnType::Float => Value::Float(f32::from_bits(get_u32(&mut cursor)?)),
            ColumnType::Double => Value::Double(f64::from_bits(get_u64(&mut cursor)?)),
            ColumnType::Boolean => Value::Boolean(get_u8(&mut cursor)? == 0x01),
            ColumnType::Blob => Value::Blob(raw.to_vec()),
            ColumnType::Varint => Value::Varint(decode_varint(raw)?),
            ColumnType::Decimal => {
                let scale = get_i32(&mut cursor)?;
                let unscaled = decode_varint(cursor)?;
                Value::Decimal(BigDecimal::new(unscaled, scale as i64))
            }
            ColumnType::Timestamp => {
                let millis = get_i64(&mut cursor)?;
                let instant = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                    ProtocolError::Malformed(format!("timestamp {millis}ms is out of range"))
                })?;
                Value::Timestamp(instant)
            }
            ColumnType::Uuid | ColumnType::Timeuuid => {
                let id = Uuid::from_slice(raw).map_err(|_| {
                    ProtocolError::Malformed(format!("uuid must be 16 octets, got {}", raw.len()))
                })?;
                Value::Uuid(id)
            }
            ColumnType::Inet => Value::Inet(decode_inet_address(raw)?),
            ColumnType::List(inner) => {
                let count = get_u16(&mut cursor)? as usize;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(decode_element(&mut cursor, inner)?);
                }
                Value::List(items)
            }
            ColumnType::Set(inner) => {
                let count = get_u16(&mut cursor)? as usize;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(decode_element(&mut cursor, inner)?);
                }
                Value::Set(items)
            }
            ColumnType::Map(key_type, value_type) => {
                let count = get_u16(&mut cursor)? as usize;
                let mut entries: Vec<(Value, Value)> = Vec::with_capacity(count);
                for _ in 0..count {
                    let key = decode_element(&mut cursor, key_type)?;
                    let value = decode_element(&mut cursor, value_type)?;
                    match entries.iter_mut().find(|(existing, _)| *existing == key) {
                        Some(entry) => entry.1 = value,
                        None => entries.push((key, value)),
                    }
                }
                Value::Map(entries)
            }
        };
        Ok(value)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bigint(&self) -> Option<i64> {
        match self {
            Value::Bigint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&BigDecimal> {
        match self {
            Value::Decimal(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_varint(&self) -> Option<&BigInt> {
        match self {
            Value::Varint(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Value::Uuid(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_inet(&self) -> Option<IpAddr> {
        match self {
            Value::Inet(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&[Value]> {
        match self {
            Value::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Bigint(_) => "bigint",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Boolean(_) => "boolean",
            Value::Blob(_) => "blob",
            Value::Decimal(_) => "decimal",
            Value::Varint(_) => "varint",
            Value::Timestamp(_) => "timestamp",
            Value::Uuid(_) => "uuid",
            Value::Inet(_) => "inet",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
        }
    }
}

/// Two's-complement big-endian integer of any width. The sign comes from
/// the top bit of the first octet; an empty run is not a valid varint.
fn decode_varint(raw: &[u8]) -> Result<BigInt> {
    if raw.is_empty() {
        return Err(ProtocolError::Malformed(
            "varint must be at least one octet".into(),
        ));
    }
    Ok(BigInt::from_signed_bytes_be(raw))
}

fn decode_inet_address(raw: &[u8]) -> Result<IpAddr> {
    match raw.len() {
        4 => {
            let mut octets = [0u8; 4];
            octets.copy_from_slice(raw);
            Ok(IpAddr::V4(Ipv4Addr::from(octets)))
        }
        16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(raw);
            Ok(IpAddr::V6(Ipv6Addr::from(octets)))
        }
        n => Err(ProtocolError::Malformed(format!(
            "inet address must be 4 or 16 octets, got {n}"
        ))),
    }
}

/// One collection element: a signed 16-bit length prefix, negative meaning
/// a null element rather than an empty one.
fn decode_element(cursor: &mut &[u8], data_type: &ColumnType) -> Result<Value> {
    let raw = get_nullable_short_bytes(cursor)?;
    Value::decode(raw.as_deref(), data_type)
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Bigint(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Blob(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Varint(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Inet(v) => write!(f, "{v}"),
            Value::List(items) => {
                let rendered: Vec<String> = items.iter().map(Value::to_string).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Value::Map(entries) => {
                let rendered: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
            Value::Set(items) => {
                let rendered: Vec<String> = items.iter().map(Value::to_string).collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
        }
    }
}

static NULL: Value = Value::Null;

/// One result row: column name to decoded value, in declared column order.
///
/// Duplicate column names within one result overwrite; the last cell wins.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(IndexMap<String, Value>);

impl Row {
    pub(crate) fn with_capacity(columns: usize) -> Self {
        Row(IndexMap::with_capacity(columns))
    }

    pub(crate) fn insert(&mut self, name: String, value: Value) {
        self.0.insert(name, value);
    }

    /// Get a cell by column name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Column names in declared order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Index<&str> for Row {
    type Output = Value;

    fn index(&self, name: &str) -> &Self::Output {
        self.0.get(name).unwrap_or(&NULL)
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Row(iter.into_iter().collect())
    }
}
