//! Protocol Module
//!
//! Defines the messages of a selection session and how they travel.
//!
//! ## Messages
//! | Tag           | Direction         | Fields                        |
//! |---------------|-------------------|-------------------------------|
//! | `compute_min` | caller → service  | `length`                      |
//! | `compute_max` | caller → service  | `length`                      |
//! | `compare`     | service → caller  | `request_id`, `left`, `right` |
//! | `comp_result` | caller → service  | `request_id`, `answer`        |
//! | `done`        | service → caller  | `result`                      |
//!
//! Each message is a JSON record, wrapped in a status + length frame when
//! sent over TCP.

mod message;
mod frame;
mod codec;

pub use message::{Message, MessageKind, Operation};
pub use frame::{Frame, Status};
pub use codec::{
    encode, decode, decode_value, to_bytes, from_bytes,
    encode_frame, decode_frame, read_frame, write_frame,
    WireRecord, TAG_FIELD, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
