//! Frame definitions
//!
//! The transport envelope wrapped around every JSON record.

use serde_json::Value;

use crate::error::{Result, SelectError};
use super::codec::{self, WireRecord};
use super::Message;

/// Frame status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    Error = 0x01,
}

/// A frame on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Status code
    pub status: Status,

    /// JSON message record for OK, UTF-8 reason for ERROR
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create an OK frame carrying a raw record
    pub fn record(record: WireRecord) -> Self {
        Self {
            status: Status::Ok,
            payload: Value::Object(record).to_string().into_bytes(),
        }
    }

    /// Create an OK frame carrying `message`
    pub fn message(message: &Message) -> Self {
        Self {
            status: Status::Ok,
            payload: codec::to_bytes(message),
        }
    }

    /// Create an ERROR frame
    pub fn error(reason: &str) -> Self {
        Self {
            status: Status::Error,
            payload: reason.as_bytes().to_vec(),
        }
    }

    /// Unwrap the carried record
    ///
    /// ERROR frames surface as `SelectError::Remote`.
    pub fn into_record(self) -> Result<WireRecord> {
        match self.status {
            Status::Ok => match serde_json::from_slice::<Value>(&self.payload) {
                Ok(Value::Object(record)) => Ok(record),
                Ok(other) => Err(SelectError::MalformedMessage(format!(
                    "expected a JSON object, got {}",
                    other
                ))),
                Err(e) => Err(SelectError::MalformedMessage(format!("invalid JSON: {}", e))),
            },
            Status::Error => Err(SelectError::Remote(self.reason())),
        }
    }

    /// Unwrap and decode the carried message
    pub fn into_message(self) -> Result<Message> {
        codec::decode(self.into_record()?)
    }

    /// Payload read as text (the reason of an ERROR frame)
    pub fn reason(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}
