//! Incremental response frame assembly
//!
//! The transport appends whatever the socket delivered to a `BytesMut` it
//! owns and calls [`FrameDecoder::decode`] until it returns `Ok(None)`.
//! The decoder consumes exactly one header plus one body per completed
//! frame; octets belonging to subsequent frames stay at the head of the
//! buffer untouched. Decode errors are fatal for the connection: with no
//! frame delimiter beyond the header's length field there is no way to
//! resynchronize the stream.

use bytes::BytesMut;
use tracing::trace;

use crate::buffer::{get_u8, get_u32};
use crate::error::{ProtocolError, Result};
use crate::response::{self, ResponseBody};

/// Response opcodes. Request opcodes are invalid on this side of the
/// connection and rejected wholesale.
mod opcode {
    pub const ERROR: u8 = 0x00;
    pub const READY: u8 = 0x02;
    pub const SUPPORTED: u8 = 0x06;
    pub const RESULT: u8 = 0x08;
    pub const EVENT: u8 = 0x0C;
}

/// Wire size of a frame header.
pub const HEADER_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameHeader {
    version: u8,
    flags: u8,
    stream_id: i8,
    opcode: u8,
    body_length: u32,
}

impl FrameHeader {
    /// Parse the fixed 8-octet header. The version octet's high bit must
    /// be set (response direction); it is masked off so the surfaced
    /// version is the numeric protocol version.
    fn parse(cursor: &mut &[u8]) -> Result<Self> {
        let version = get_u8(cursor)?;
        if version & 0x80 == 0 {
            return Err(ProtocolError::UnsupportedFrameType(version));
        }
        let version = version & 0x7F;
        let flags = get_u8(cursor)?;
        let stream_id = get_u8(cursor)? as i8;
        let opcode = get_u8(cursor)?;
        if !matches!(
            opcode,
            opcode::ERROR | opcode::READY | opcode::SUPPORTED | opcode::RESULT | opcode::EVENT
        ) {
            return Err(ProtocolError::UnsupportedOperation(opcode));
        }
        let body_length = get_u32(cursor)?;
        Ok(FrameHeader {
            version,
            flags,
            stream_id,
            opcode,
            body_length,
        })
    }
}

/// One complete decoded response frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseFrame {
    /// Numeric protocol version (direction bit already masked off).
    pub version: u8,
    pub flags: u8,
    /// Correlation token echoed from the request; opaque at this layer.
    pub stream_id: i8,
    pub body_length: u32,
    pub body: ResponseBody,
}

impl ResponseFrame {
    pub const HEADER_LENGTH: usize = HEADER_LENGTH;
}

/// Streaming frame assembler for one connection.
///
/// Two states: awaiting the 8-octet header, then awaiting `body_length`
/// octets of body. Each connection owns its own decoder; there is no
/// shared state across frames beyond the pending header.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending: Option<FrameHeader>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        FrameDecoder { pending: None }
    }

    /// Attempt to complete one frame from the buffered bytes.
    ///
    /// Returns `Ok(None)` when more bytes are needed; call again after the
    /// next append. On `Ok(Some(frame))` exactly the frame's header and
    /// body octets have been consumed from `buf`.
    pub fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<ResponseFrame>> {
        let header = match self.pending.take() {
            Some(header) => header,
            None => {
                if buf.len() < HEADER_LENGTH {
                    return Ok(None);
                }
                let header_bytes = buf.split_to(HEADER_LENGTH);
                let mut cursor = &header_bytes[..];
                let header = FrameHeader::parse(&mut cursor)?;
                trace!(
                    version = header.version,
                    stream = header.stream_id,
                    opcode = header.opcode,
                    length = header.body_length,
                    "response header accepted"
                );
                header
            }
        };

        if buf.len() < header.body_length as usize {
            self.pending = Some(header);
            return Ok(None);
        }

        let body_bytes = buf.split_to(header.body_length as usize);
        let mut cursor = &body_bytes[..];
        let body = match header.opcode {
            opcode::ERROR => response::decode_error(&mut cursor)?,
            opcode::READY => ResponseBody::Ready,
            opcode::SUPPORTED => response::decode_supported(&mut cursor)?,
            opcode::RESULT => response::decode_result(&mut cursor)?,
            opcode::EVENT => response::decode_event(&mut cursor)?,
            other => return Err(ProtocolError::UnsupportedOperation(other)),
        };
        trace!(stream = header.stream_id, "response frame decoded");

        Ok(Some(ResponseFrame {
            version: header.version,
            flags: header.flags,
            stream_id: header.stream_id,
            body_length: header.body_length,
            body,
        }))
    }

    /// Discard any partially assembled frame so the decoder can serve a
    /// fresh connection. This is not resynchronization: after a decode
    /// error the old connection must be torn down.
    pub fn reset(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::Consistency;
    use crate::response::{ErrorDetails, EventBody, ResultBody};
    use crate::value::Value;

    fn put_string(out: &mut Vec<u8>, s: &str) {
        out.extend_from_slice(&(s.len() as u16).to_be_bytes());
        out.extend_from_slice(s.as_bytes());
    }

    fn frame_bytes(stream_id: i8, opcode: u8, body: &[u8]) -> Vec<u8> {
        let mut out = vec![0x81, 0x00, stream_id as u8, opcode];
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    fn decode_one(bytes: &[u8]) -> ResponseFrame {
        let mut decoder = FrameDecoder::new();
        let mut buf = BytesMut::from(bytes);
        let frame = decoder.decode(&mut buf).unwrap().unwrap();
        assert!(buf.is_empty(), "decoder left unconsumed bytes");
        frame
    }

    #[test]
    fn decodes_ready_frame() {
        let frame = decode_one(&[0x81, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(frame.version, 1);
        assert_eq!(frame.stream_id, 0);
        assert_eq!(frame.body_length, 0);
        assert_eq!(frame.body, ResponseBody::Ready);
    }

    #[test]
    fn decodes_bare_error_frame() {
        let frame = decode_one(&[
            0x81, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x06,
            0x66, 0x61, 0x69, 0x6C, 0x65, 0x64,
        ]);
        assert_eq!(frame.stream_id, 1);
        let ResponseBody::Error(error) = frame.body else {
            panic!("expected error body");
        };
        assert_eq!(error.code, 10);
        assert_eq!(error.message, "failed");
        assert_eq!(error.details, None);
    }

    #[test]
    fn decodes_unavailable_error_frame() {
        let mut body = 0x1000i32.to_be_bytes().to_vec();
        put_string(&mut body, "no");
        body.extend_from_slice(&0x0004u16.to_be_bytes());
        body.extend_from_slice(&3i32.to_be_bytes());
        body.extend_from_slice(&1i32.to_be_bytes());

        let frame = decode_one(&frame_bytes(2, 0x00, &body));
        let ResponseBody::Error(error) = frame.body else {
            panic!("expected error body");
        };
        assert_eq!(error.code, 0x1000);
        assert_eq!(error.message, "no");
        assert_eq!(
            error.details,
            Some(ErrorDetails::Unavailable {
                consistency: Consistency::Quorum,
                required: 3,
                alive: 1,
            })
        );
    }

    #[test]
    fn decodes_rows_frame_with_int_column() {
        let mut body = 2i32.to_be_bytes().to_vec();
        body.extend_from_slice(&1i32.to_be_bytes());
        body.extend_from_slice(&1i32.to_be_bytes());
        put_string(&mut body, "ks");
        put_string(&mut body, "t");
        put_string(&mut body, "n");
        body.extend_from_slice(&0x0009u16.to_be_bytes());
        body.extend_from_slice(&2i32.to_be_bytes());
        body.extend_from_slice(&[0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x2A]);
        body.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);

        let frame = decode_one(&frame_bytes(0, 0x08, &body));
        let ResponseBody::Result(ResultBody::Rows { metadata, rows }) = frame.body else {
            panic!("expected rows");
        };
        assert_eq!(metadata.len(), 1);
        assert_eq!(rows[0]["n"], Value::Int(42));
        assert_eq!(rows[1]["n"], Value::Null);
    }

    #[test]
    fn decodes_schema_change_event_frame() {
        let mut body = Vec::new();
        put_string(&mut body, "SCHEMA_CHANGE");
        put_string(&mut body, "CREATED");
        put_string(&mut body, "ks");
        put_string(&mut body, "t");

        let frame = decode_one(&frame_bytes(-1, 0x0C, &body));
        assert_eq!(frame.stream_id, -1);
        assert_eq!(
            frame.body,
            ResponseBody::Event(EventBody::SchemaChange {
                change: "CREATED".into(),
                keyspace: "ks".into(),
                table: "t".into(),
            })
        );
    }

    #[test]
    fn request_frames_are_rejected() {
        let mut decoder = FrameDecoder::new();
        let mut buf = BytesMut::from(&[0x01u8, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00][..]);
        assert_eq!(
            decoder.decode(&mut buf).unwrap_err(),
            ProtocolError::UnsupportedFrameType(0x01)
        );
    }

    #[test]
    fn request_opcodes_are_rejected() {
        let mut decoder = FrameDecoder::new();
        // 0x07 is QUERY, never valid server-to-client
        let mut buf = BytesMut::from(&[0x81u8, 0x00, 0x00, 0x07, 0x00, 0x00, 0x00, 0x00][..]);
        assert_eq!(
            decoder.decode(&mut buf).unwrap_err(),
            ProtocolError::UnsupportedOperation(0x07)
        );
    }

    #[test]
    fn header_and_body_may_arrive_in_fragments() {
        let bytes = frame_bytes(5, 0x02, &[]);
        let mut decoder = FrameDecoder::new();
        let mut buf = BytesMut::new();

        buf.extend_from_slice(&bytes[..5]);
        assert_eq!(decoder.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(&bytes[5..]);
        let frame = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.stream_id, 5);
        assert_eq!(frame.body, ResponseBody::Ready);
    }

    #[test]
    fn body_waits_for_full_length() {
        let mut body = 3i32.to_be_bytes().to_vec();
        put_string(&mut body, "ks");
        let bytes = frame_bytes(0, 0x08, &body);

        let mut decoder = FrameDecoder::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&bytes[..HEADER_LENGTH + 2]);
        assert_eq!(decoder.decode(&mut buf).unwrap(), None);
        // header already consumed, the partial body stays put
        assert_eq!(buf.len(), 2);

        buf.extend_from_slice(&bytes[HEADER_LENGTH + 2..]);
        let frame = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(
            frame.body,
            ResponseBody::Result(ResultBody::SetKeyspace {
                keyspace: "ks".into()
            })
        );
    }

    #[test]
    fn trailing_bytes_of_the_next_frame_are_retained() {
        let first = frame_bytes(1, 0x02, &[]);
        let second = frame_bytes(2, 0x02, &[]);
        let mut decoder = FrameDecoder::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&first);
        buf.extend_from_slice(&second[..3]);

        let before = buf.len();
        let frame = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.stream_id, 1);
        assert_eq!(buf.len(), before - HEADER_LENGTH - frame.body_length as usize);

        assert_eq!(decoder.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(&second[3..]);
        let frame = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.stream_id, 2);
        assert!(buf.is_empty());
    }

    #[test]
    fn emits_concatenated_frames_in_wire_order() {
        let mut error_body = 10i32.to_be_bytes().to_vec();
        put_string(&mut error_body, "failed");
        let mut event_body = Vec::new();
        put_string(&mut event_body, "SCHEMA_CHANGE");
        put_string(&mut event_body, "UPDATED");
        put_string(&mut event_body, "ks");
        put_string(&mut event_body, "t");

        let mut buf = BytesMut::new();
        buf.extend_from_slice(&frame_bytes(3, 0x02, &[]));
        buf.extend_from_slice(&frame_bytes(-4, 0x00, &error_body));
        buf.extend_from_slice(&frame_bytes(5, 0x0C, &event_body));

        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        while let Some(frame) = decoder.decode(&mut buf).unwrap() {
            frames.push(frame);
        }

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].stream_id, 3);
        assert_eq!(frames[0].body, ResponseBody::Ready);
        assert_eq!(frames[1].stream_id, -4);
        assert!(matches!(frames[1].body, ResponseBody::Error(_)));
        assert_eq!(frames[2].stream_id, 5);
        assert!(matches!(frames[2].body, ResponseBody::Event(_)));
    }

    #[test]
    fn reset_discards_a_pending_header() {
        let mut decoder = FrameDecoder::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&frame_bytes(9, 0x08, &1i32.to_be_bytes())[..HEADER_LENGTH]);
        assert_eq!(decoder.decode(&mut buf).unwrap(), None);

        decoder.reset();
        let mut buf = BytesMut::from(&frame_bytes(0, 0x02, &[])[..]);
        let frame = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.body, ResponseBody::Ready);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn sample_stream() -> Vec<u8> {
            let mut error_body = 0x1000i32.to_be_bytes().to_vec();
            put_string(&mut error_body, "no");
            error_body.extend_from_slice(&0x0004u16.to_be_bytes());
            error_body.extend_from_slice(&3i32.to_be_bytes());
            error_body.extend_from_slice(&1i32.to_be_bytes());

            let mut rows_body = 2i32.to_be_bytes().to_vec();
            rows_body.extend_from_slice(&1i32.to_be_bytes());
            rows_body.extend_from_slice(&1i32.to_be_bytes());
            put_string(&mut rows_body, "ks");
            put_string(&mut rows_body, "t");
            put_string(&mut rows_body, "n");
            rows_body.extend_from_slice(&0x0009u16.to_be_bytes());
            rows_body.extend_from_slice(&1i32.to_be_bytes());
            rows_body.extend_from_slice(&[0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x2A]);

            let mut stream = Vec::new();
            stream.extend_from_slice(&frame_bytes(1, 0x02, &[]));
            stream.extend_from_slice(&frame_bytes(2, 0x00, &error_body));
            stream.extend_from_slice(&frame_bytes(3, 0x08, &rows_body));
            stream
        }

        fn decode_stream(chunks: &[&[u8]]) -> Vec<ResponseFrame> {
            let mut decoder = FrameDecoder::new();
            let mut buf = BytesMut::new();
            let mut frames = Vec::new();
            for chunk in chunks {
                buf.extend_from_slice(chunk);
                while let Some(frame) = decoder.decode(&mut buf).unwrap() {
                    frames.push(frame);
                }
            }
            assert!(buf.is_empty());
            frames
        }

        proptest! {
            #[test]
            fn chunking_never_changes_the_decoded_frames(
                splits in prop::collection::vec(any::<prop::sample::Index>(), 0..8)
            ) {
                let stream = sample_stream();
                let expected = decode_stream(&[&stream]);
                prop_assert_eq!(expected.len(), 3);

                let mut points: Vec<usize> =
                    splits.iter().map(|index| index.index(stream.len())).collect();
                points.sort_unstable();
                points.dedup();

                let mut chunks: Vec<&[u8]> = Vec::with_capacity(points.len() + 1);
                let mut start = 0;
                for point in points {
                    chunks.push(&stream[start..point]);
                    start = point;
                }
                chunks.push(&stream[start..]);

                let chunked = decode_stream(&chunks);
                prop_assert_eq!(chunked, expected);
            }
        }
    }
}
