//! Response body variants and per-opcode body decoders
//!
//! A body decoder receives a cursor over exactly the frame's body octets;
//! the assembler in [`crate::frame`] owns header handling and buffer
//! trimming. Server-reported errors decode into [`ErrorResponse`] values,
//! surfaced to the caller for policy handling rather than raised here.

use std::collections::HashMap;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::buffer::{
    get_bytes, get_consistency, get_i32, get_inet, get_short_bytes, get_string,
    get_string_multimap, get_u8,
};
use crate::consistency::Consistency;
use crate::error::{ProtocolError, Result};
use crate::types::{ColumnSpec, ColumnType};
use crate::value::{Row, Value};

/// Server error codes, as carried in `ERROR` bodies.
pub mod error_code {
    pub const SERVER_ERROR: i32 = 0x0000;
    pub const PROTOCOL_ERROR: i32 = 0x000A;
    pub const BAD_CREDENTIALS: i32 = 0x0100;
    pub const UNAVAILABLE: i32 = 0x1000;
    pub const OVERLOADED: i32 = 0x1001;
    pub const IS_BOOTSTRAPPING: i32 = 0x1002;
    pub const TRUNCATE_ERROR: i32 = 0x1003;
    pub const WRITE_TIMEOUT: i32 = 0x1100;
    pub const READ_TIMEOUT: i32 = 0x1200;
    pub const SYNTAX_ERROR: i32 = 0x2000;
    pub const UNAUTHORIZED: i32 = 0x2100;
    pub const INVALID: i32 = 0x2200;
    pub const CONFIG_ERROR: i32 = 0x2300;
    pub const ALREADY_EXISTS: i32 = 0x2400;
    pub const UNPREPARED: i32 = 0x2500;
}

mod result_kind {
    pub const VOID: i32 = 0x0001;
    pub const ROWS: i32 = 0x0002;
    pub const SET_KEYSPACE: i32 = 0x0003;
    pub const PREPARED: i32 = 0x0004;
    pub const SCHEMA_CHANGE: i32 = 0x0005;
}

/// Body of one decoded response frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponseBody {
    /// Server-reported failure for the correlated request.
    Error(ErrorResponse),
    /// Startup handshake acknowledgment.
    Ready,
    /// Option multimap answering an OPTIONS request.
    Supported { options: HashMap<String, Vec<String>> },
    /// Outcome of a query, prepare, or execute request.
    Result(ResultBody),
    /// Asynchronous cluster event on a registered connection.
    Event(EventBody),
}

/// A decoded `ERROR` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: i32,
    pub message: String,
    pub details: Option<ErrorDetails>,
}

impl ErrorResponse {
    /// Get a short error kind name for the server code
    pub fn kind(&self) -> &'static str {
        match self.code {
            error_code::SERVER_ERROR => "server_error",
            error_code::PROTOCOL_ERROR => "protocol_error",
            error_code::BAD_CREDENTIALS => "bad_credentials",
            error_code::UNAVAILABLE => "unavailable",
            error_code::OVERLOADED => "overloaded",
            error_code::IS_BOOTSTRAPPING => "is_bootstrapping",
            error_code::TRUNCATE_ERROR => "truncate_error",
            error_code::WRITE_TIMEOUT => "write_timeout",
            error_code::READ_TIMEOUT => "read_timeout",
            error_code::SYNTAX_ERROR => "syntax_error",
            error_code::UNAUTHORIZED => "unauthorized",
            error_code::INVALID => "invalid",
            error_code::CONFIG_ERROR => "config_error",
            error_code::ALREADY_EXISTS => "already_exists",
            error_code::UNPREPARED => "unprepared",
            _ => "unknown",
        }
    }
}

/// Structured payload following the message for a subset of error codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ErrorDetails {
    Unavailable {
        consistency: Consistency,
        required: i32,
        alive: i32,
    },
    WriteTimeout {
        consistency: Consistency,
        received: i32,
        blockfor: i32,
        write_type: String,
    },
    ReadTimeout {
        consistency: Consistency,
        received: i32,
        blockfor: i32,
        data_present: bool,
    },
    AlreadyExists {
        keyspace: String,
        table: String,
    },
    Unprepared {
        id: Vec<u8>,
    },
}

/// Body of a `RESULT` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResultBody {
    Void,
    Rows {
        metadata: Vec<ColumnSpec>,
        rows: Vec<Row>,
    },
    SetKeyspace {
        keyspace: String,
    },
    Prepared {
        id: Vec<u8>,
        metadata: Vec<ColumnSpec>,
    },
    SchemaChange {
        change: String,
        keyspace: String,
        table: String,
    },
}

/// Body of an `EVENT` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventBody {
    SchemaChange {
        change: String,
        keyspace: String,
        table: String,
    },
    StatusChange {
        change: String,
        address: IpAddr,
        port: i32,
    },
    TopologyChange {
        change: String,
        address: IpAddr,
        port: i32,
    },
}

pub(crate) fn decode_error(cursor: &mut &[u8]) -> Result<ResponseBody> {
    let code = get_i32(cursor)?;
    let message = get_string(cursor)?;
    let details = match code {
        error_code::UNAVAILABLE => Some(ErrorDetails::Unavailable {
            consistency: get_consistency(cursor)?,
            required: get_i32(cursor)?,
            alive: get_i32(cursor)?,
        }),
        error_code::WRITE_TIMEOUT => Some(ErrorDetails::WriteTimeout {
            consistency: get_consistency(cursor)?,
            received: get_i32(cursor)?,
            blockfor: get_i32(cursor)?,
            write_type: get_string(cursor)?,
        }),
        error_code::READ_TIMEOUT => Some(ErrorDetails::ReadTimeout {
            consistency: get_consistency(cursor)?,
            received: get_i32(cursor)?,
            blockfor: get_i32(cursor)?,
            data_present: get_u8(cursor)? != 0x00,
        }),
        error_code::ALREADY_EXISTS => Some(ErrorDetails::AlreadyExists {
            keyspace: get_string(cursor)?,
            table: get_string(cursor)?,
        }),
        error_code::UNPREPARED => Some(ErrorDetails::Unprepared {
            id: get_short_bytes(cursor)?,
        }),
        _ => None,
    };
    Ok(ResponseBody::Error(ErrorResponse {
        code,
        message,
        details,
    }))
}

pub(crate) fn decode_supported(cursor: &mut &[u8]) -> Result<ResponseBody> {
    Ok(ResponseBody::Supported {
        options: get_string_multimap(cursor)?,
    })
}

pub(crate) fn decode_result(cursor: &mut &[u8]) -> Result<ResponseBody> {
    let kind = get_i32(cursor)?;
    let body = match kind {
        result_kind::VOID => ResultBody::Void,
        result_kind::ROWS => decode_rows(cursor)?,
        result_kind::SET_KEYSPACE => ResultBody::SetKeyspace {
            keyspace: get_string(cursor)?,
        },
        result_kind::PREPARED => ResultBody::Prepared {
            id: get_short_bytes(cursor)?,
            metadata: decode_metadata(cursor)?,
        },
        result_kind::SCHEMA_CHANGE => ResultBody::SchemaChange {
            change: get_string(cursor)?,
            keyspace: get_string(cursor)?,
            table: get_string(cursor)?,
        },
        other => return Err(ProtocolError::UnsupportedResultKind(other)),
    };
    Ok(ResponseBody::Result(body))
}

/// Rows/Prepared metadata block. Bit 0 of the flags word announces a
/// global table spec: one keyspace/table pair shared by every column.
fn decode_metadata(cursor: &mut &[u8]) -> Result<Vec<ColumnSpec>> {
    let flags = get_i32(cursor)?;
    let columns_count = get_i32(cursor)?;
    let global = if flags & 0x01 != 0 {
        Some((get_string(cursor)?, get_string(cursor)?))
    } else {
        None
    };

    let mut specs = Vec::with_capacity(columns_count.max(0) as usize);
    for _ in 0..columns_count {
        let (keyspace, table) = match &global {
            Some((keyspace, table)) => (keyspace.clone(), table.clone()),
            None => (get_string(cursor)?, get_string(cursor)?),
        };
        specs.push(ColumnSpec {
            keyspace,
            table,
            name: get_string(cursor)?,
            data_type: ColumnType::decode(cursor)?,
        });
    }
    Ok(specs)
}

fn decode_rows(cursor: &mut &[u8]) -> Result<ResultBody> {
    let metadata = decode_metadata(cursor)?;
    let rows_count = get_i32(cursor)?;

    let mut rows = Vec::with_capacity(rows_count.max(0) as usize);
    for _ in 0..rows_count {
        let mut row = Row::with_capacity(metadata.len());
        for spec in &metadata {
            let raw = get_bytes(cursor)?;
            let value = Value::decode(raw.as_deref(), &spec.data_type)?;
            row.insert(spec.name.clone(), value);
        }
        rows.push(row);
    }
    Ok(ResultBody::Rows { metadata, rows })
}

pub(crate) fn decode_event(cursor: &mut &[u8]) -> Result<ResponseBody> {
    let kind = get_string(cursor)?;
    let event = match kind.as_str() {
        "SCHEMA_CHANGE" => EventBody::SchemaChange {
            change: get_string(cursor)?,
            keyspace: get_string(cursor)?,
            table: get_string(cursor)?,
        },
        "STATUS_CHANGE" => {
            let change = get_string(cursor)?;
            let (address, port) = get_inet(cursor)?;
            EventBody::StatusChange {
                change,
                address,
                port,
            }
        }
        "TOPOLOGY_CHANGE" => {
            let change = get_string(cursor)?;
            let (address, port) = get_inet(cursor)?;
            EventBody::TopologyChange {
                change,
                address,
                port,
            }
        }
        _ => return Err(ProtocolError::UnsupportedEventType(kind)),
    };
    Ok(ResponseBody::Event(event))
}
