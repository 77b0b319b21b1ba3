//! Protocol codec
//!
//! Mapping between messages and wire records, and the framing used to
//! carry records over a byte stream.
//!
//! ## Record Format
//! A flat JSON object with the `ty` discriminant plus the variant's fields:
//! ```text
//! {"ty": "compare", "request_id": 3, "left": 0, "right": 2}
//! ```
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │     Payload (JSON / text)   │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```

use std::io::{Read, Write};

use bytes::{BufMut, Bytes, BytesMut};
use serde_json::Value;

use crate::error::{Result, SelectError};
use super::{Frame, Message, MessageKind, Status};

/// A decoded-but-untyped message: field name → JSON value
pub type WireRecord = serde_json::Map<String, Value>;

/// Name of the discriminant field
pub const TAG_FIELD: &str = "ty";

/// Header size: 1 byte status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Record Encoding/Decoding
// =============================================================================

/// Encode a message to a wire record
///
/// Always includes the discriminant and every field of the variant.
pub fn encode(message: &Message) -> WireRecord {
    let mut record = WireRecord::new();
    record.insert(TAG_FIELD.to_string(), Value::from(message.tag()));

    match *message {
        Message::ComputeMin { length } | Message::ComputeMax { length } => {
            record.insert("length".to_string(), Value::from(length));
        }
        Message::Compare {
            request_id,
            left,
            right,
        } => {
            record.insert("request_id".to_string(), Value::from(request_id));
            record.insert("left".to_string(), Value::from(left));
            record.insert("right".to_string(), Value::from(right));
        }
        Message::ComparisonResult { request_id, answer } => {
            record.insert("request_id".to_string(), Value::from(request_id));
            record.insert("answer".to_string(), Value::from(answer));
        }
        Message::Done { result } => {
            record.insert("result".to_string(), Value::from(result));
        }
    }

    record
}

/// Decode a wire record into a message
///
/// An unrecognised `ty` is `UnknownVariant`; anything else wrong with the
/// record (missing tag, missing or mistyped fields) is `MalformedMessage`.
/// Unknown extra fields are ignored.
pub fn decode(record: WireRecord) -> Result<Message> {
    let kind = match record.get(TAG_FIELD) {
        Some(Value::String(tag)) => MessageKind::from_tag(tag)
            .ok_or_else(|| SelectError::UnknownVariant(tag.clone()))?,
        Some(other) => {
            return Err(SelectError::MalformedMessage(format!(
                "`{}` must be a string, got {}",
                TAG_FIELD, other
            )))
        }
        None => {
            return Err(SelectError::MalformedMessage(format!(
                "missing `{}` discriminant",
                TAG_FIELD
            )))
        }
    };

    serde_json::from_value(Value::Object(record))
        .map_err(|e| SelectError::MalformedMessage(format!("{}: {}", kind.tag(), e)))
}

/// Decode an arbitrary JSON value; only objects are records
pub fn decode_value(value: Value) -> Result<Message> {
    match value {
        Value::Object(record) => decode(record),
        other => Err(SelectError::MalformedMessage(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Serialize a message as a JSON document
pub fn to_bytes(message: &Message) -> Vec<u8> {
    Value::Object(encode(message)).to_string().into_bytes()
}

/// Parse a JSON document into a message
pub fn from_bytes(bytes: &[u8]) -> Result<Message> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| SelectError::MalformedMessage(format!("invalid JSON: {}", e)))?;
    decode_value(value)
}

// =============================================================================
// Frame Encoding/Decoding
// =============================================================================

/// Encode a frame to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_frame(frame: &Frame) -> Result<Bytes> {
    let payload_len = u32::try_from(frame.payload.len())
        .ok()
        .filter(|len| *len <= MAX_PAYLOAD_SIZE)
        .ok_or_else(|| {
            SelectError::Transport(format!(
                "Payload too large: {} bytes (max {})",
                frame.payload.len(),
                MAX_PAYLOAD_SIZE
            ))
        })?;

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + frame.payload.len());
    buf.put_u8(frame.status as u8);
    buf.put_u32(payload_len);
    buf.put_slice(&frame.payload);
    Ok(buf.freeze())
}

/// Decode a frame from bytes
pub fn decode_frame(bytes: &[u8]) -> Result<Frame> {
    if bytes.len() < HEADER_SIZE {
        return Err(SelectError::Transport(format!(
            "Incomplete frame header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let status = parse_status(bytes[0])?;
    let payload_len = parse_payload_len(&bytes[1..HEADER_SIZE])?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(SelectError::Transport(format!(
            "Incomplete frame payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    Ok(Frame {
        status,
        payload: bytes[HEADER_SIZE..total_len].to_vec(),
    })
}

fn parse_status(byte: u8) -> Result<Status> {
    match byte {
        0x00 => Ok(Status::Ok),
        0x01 => Ok(Status::Error),
        _ => Err(SelectError::Transport(format!(
            "Unknown frame status: 0x{:02x}",
            byte
        ))),
    }
}

fn parse_payload_len(len_bytes: &[u8]) -> Result<usize> {
    let payload_len = u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]);

    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(SelectError::Transport(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    Ok(payload_len as usize)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete frame from a stream
///
/// Blocks until a complete frame is received or an error occurs
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Frame> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let status = parse_status(header[0])?;
    let payload_len = parse_payload_len(&header[1..])?;

    let mut payload = vec![0u8; payload_len];
    if payload_len > 0 {
        reader.read_exact(&mut payload)?;
    }

    Ok(Frame { status, payload })
}

/// Write a frame to a stream
///
/// Oversized frames are rejected before anything is written
pub fn write_frame<W: Write>(writer: &mut W, frame: &Frame) -> Result<()> {
    let bytes = encode_frame(frame)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
