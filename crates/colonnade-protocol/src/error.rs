//! Error definitions for the Colonnade wire codec

use thiserror::Error;

/// Errors raised while decoding server responses.
///
/// These are decoder failures, not server-reported errors: an `ERROR`
/// frame that decodes cleanly is a successful decode and surfaces as
/// [`ErrorResponse`](crate::response::ErrorResponse). Any variant here is
/// fatal for the connection. The stream has no delimiter beyond the
/// header length field, so the transport must tear the connection down.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("frame version 0x{0:02x} is not a response frame")]
    UnsupportedFrameType(u8),

    #[error("unsupported response opcode 0x{0:02x}")]
    UnsupportedOperation(u8),

    #[error("unsupported result kind 0x{0:04x}")]
    UnsupportedResultKind(i32),

    #[error("unsupported column type 0x{0:04x}")]
    UnsupportedColumnType(u16),

    #[error("unsupported event type {0:?}")]
    UnsupportedEventType(String),

    #[error("unsupported consistency code 0x{0:04x}")]
    UnsupportedConsistency(u16),

    #[error("short read: needed {needed} more bytes, {remaining} remaining")]
    ShortRead { needed: usize, remaining: usize },

    #[error("malformed frame body: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

impl ProtocolError {
    /// Get a short error kind name
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolError::UnsupportedFrameType(_) => "unsupported_frame_type",
            ProtocolError::UnsupportedOperation(_) => "unsupported_operation",
            ProtocolError::UnsupportedResultKind(_) => "unsupported_result_kind",
            ProtocolError::UnsupportedColumnType(_) => "unsupported_column_type",
            ProtocolError::UnsupportedEventType(_) => "unsupported_event_type",
            ProtocolError::UnsupportedConsistency(_) => "unsupported_consistency",
            ProtocolError::ShortRead { .. } => "short_read",
            ProtocolError::Malformed(_) => "malformed",
        }
    }
}
