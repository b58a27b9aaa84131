//! Wire protocol codec for the Colonnade client driver
//!
//! This crate decodes server-to-client response frames of the binary
//! protocol. It reassembles discrete frames from an incrementally filled
//! byte buffer and materializes a typed body for each opcode, including
//! tabular result sets whose columns carry the full column type system
//! (primitives, arbitrary-precision numerics, uuids, addresses, and
//! nested collections).
//!
//! Socket I/O, request encoding, pooling, and retry policy live in the
//! surrounding driver crates; this crate only consumes bytes the transport
//! has buffered and hands back owned response values.
//!
//! Modules:
//! * `error`: Decoder error types and handling.
//! * `buffer`: Primitive big-endian cursor reads.
//! * `frame`: Header parsing and the incremental frame assembler.
//! * `response`: Response body variants and per-opcode decoders.
//! * `types`: Column type descriptors for result metadata.
//! * `value`: Decoded values and result rows.
//! * `consistency`: Consistency levels carried in error payloads.
//! * `cluster`: Host distance contract for load-balancing collaborators.

pub mod buffer;
pub mod cluster;
pub mod consistency;
pub mod error;
pub mod frame;
pub mod response;
pub mod types;
pub mod value;

// Re-export commonly used types at the base
pub use cluster::HostDistance;
pub use consistency::Consistency;
pub use error::{ProtocolError, Result};
pub use frame::{FrameDecoder, HEADER_LENGTH, ResponseFrame};
pub use response::{ErrorDetails, ErrorResponse, EventBody, ResponseBody, ResultBody};
pub use types::{ColumnSpec, ColumnType};
pub use value::{Row, Value};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PROTOCOL_VERSION: u8 = 1;
