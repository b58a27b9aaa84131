//! Primitive cursor reads for the response wire format
//!
//! Every multi-byte quantity on the wire is big-endian. Each read either
//! consumes exactly its encoded width and returns the value, or fails with
//! [`ProtocolError::ShortRead`] without a defined cursor position. Higher
//! decoder layers are pure composition over these functions.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::consistency::Consistency;
use crate::error::{ProtocolError, Result};

#[inline]
fn need(cursor: &[u8], needed: usize) -> Result<()> {
    if cursor.len() < needed {
        return Err(ProtocolError::ShortRead {
            needed,
            remaining: cursor.len(),
        });
    }
    Ok(())
}

#[inline]
pub fn get_u8(cursor: &mut &[u8]) -> Result<u8> {
    need(cursor, 1)?;
    let v = cursor[0];
    *cursor = &cursor[1..];
    Ok(v)
}

#[inline]
pub fn get_u16(cursor: &mut &[u8]) -> Result<u16> {
    need(cursor, 2)?;
    let v = u16::from_be_bytes([cursor[0], cursor[1]]);
    *cursor = &cursor[2..];
    Ok(v)
}

#[inline]
pub fn get_i16(cursor: &mut &[u8]) -> Result<i16> {
    Ok(get_u16(cursor)? as i16)
}

#[inline]
pub fn get_u32(cursor: &mut &[u8]) -> Result<u32> {
    need(cursor, 4)?;
    let v = u32::from_be_bytes([cursor[0], cursor[1], cursor[2], cursor[3]]);
    *cursor = &cursor[4..];
    Ok(v)
}

#[inline]
pub fn get_i32(cursor: &mut &[u8]) -> Result<i32> {
    Ok(get_u32(cursor)? as i32)
}

#[inline]
pub fn get_u64(cursor: &mut &[u8]) -> Result<u64> {
    need(cursor, 8)?;
    let v = u64::from_be_bytes([
        cursor[0], cursor[1], cursor[2], cursor[3], cursor[4], cursor[5], cursor[6], cursor[7],
    ]);
    *cursor = &cursor[8..];
    Ok(v)
}

#[inline]
pub fn get_i64(cursor: &mut &[u8]) -> Result<i64> {
    Ok(get_u64(cursor)? as i64)
}

fn get_utf8(cursor: &mut &[u8], len: usize) -> Result<String> {
    need(cursor, len)?;
    let s = std::str::from_utf8(&cursor[..len])
        .map_err(|e| ProtocolError::Malformed(format!("invalid utf-8 in string: {e}")))?
        .to_owned();
    *cursor = &cursor[len..];
    Ok(s)
}

/// String with an unsigned 16-bit length prefix.
#[inline]
pub fn get_string(cursor: &mut &[u8]) -> Result<String> {
    let len = get_u16(cursor)? as usize;
    get_utf8(cursor, len)
}

/// String with an unsigned 32-bit length prefix.
#[inline]
pub fn get_long_string(cursor: &mut &[u8]) -> Result<String> {
    let len = get_u32(cursor)? as usize;
    get_utf8(cursor, len)
}

/// Byte run with a signed 32-bit length prefix; a negative length is the
/// wire encoding of null.
pub fn get_bytes(cursor: &mut &[u8]) -> Result<Option<Vec<u8>>> {
    let len = get_i32(cursor)?;
    if len < 0 {
        return Ok(None);
    }
    let len = len as usize;
    need(cursor, len)?;
    let v = cursor[..len].to_vec();
    *cursor = &cursor[len..];
    Ok(Some(v))
}

/// Byte run with an unsigned 16-bit length prefix.
pub fn get_short_bytes(cursor: &mut &[u8]) -> Result<Vec<u8>> {
    let len = get_u16(cursor)? as usize;
    need(cursor, len)?;
    let v = cursor[..len].to_vec();
    *cursor = &cursor[len..];
    Ok(v)
}

/// Collection-element byte run: signed 16-bit length, negative meaning a
/// null element.
pub fn get_nullable_short_bytes(cursor: &mut &[u8]) -> Result<Option<Vec<u8>>> {
    let len = get_i16(cursor)?;
    if len < 0 {
        return Ok(None);
    }
    let len = len as usize;
    need(cursor, len)?;
    let v = cursor[..len].to_vec();
    *cursor = &cursor[len..];
    Ok(Some(v))
}

/// Reads an unsigned 16-bit option discriminant and hands it, with the
/// cursor, to the variant-specific decoder.
#[inline]
pub fn get_option<T>(
    cursor: &mut &[u8],
    f: impl FnOnce(u16, &mut &[u8]) -> Result<T>,
) -> Result<T> {
    let id = get_u16(cursor)?;
    f(id, cursor)
}

/// Address/port pair: a one-byte address length (4 or 16), the address
/// octets, then a signed 32-bit port.
pub fn get_inet(cursor: &mut &[u8]) -> Result<(IpAddr, i32)> {
    let len = get_u8(cursor)? as usize;
    need(cursor, len)?;
    let address = match len {
        4 => {
            let mut octets = [0u8; 4];
            octets.copy_from_slice(&cursor[..4]);
            IpAddr::V4(Ipv4Addr::from(octets))
        }
        16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&cursor[..16]);
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        n => {
            return Err(ProtocolError::Malformed(format!(
                "inet address must be 4 or 16 octets, got {n}"
            )));
        }
    };
    *cursor = &cursor[len..];
    let port = get_i32(cursor)?;
    Ok((address, port))
}

#[inline]
pub fn get_consistency(cursor: &mut &[u8]) -> Result<Consistency> {
    let code = get_u16(cursor)?;
    Consistency::from_code(code).ok_or(ProtocolError::UnsupportedConsistency(code))
}

pub fn get_string_list(cursor: &mut &[u8]) -> Result<Vec<String>> {
    let count = get_u16(cursor)? as usize;
    let mut list = Vec::with_capacity(count);
    for _ in 0..count {
        list.push(get_string(cursor)?);
    }
    Ok(list)
}

pub fn get_string_multimap(cursor: &mut &[u8]) -> Result<HashMap<String, Vec<String>>> {
    let count = get_u16(cursor)? as usize;
    let mut map = HashMap::with_capacity(count);
    for _ in 0..count {
        let key = get_string(cursor)?;
        let values = get_string_list(cursor)?;
        map.insert(key, values);
    }
    Ok(map)
}
