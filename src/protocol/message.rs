//! Message definitions
//!
//! The closed set of messages exchanged during a selection session.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::SelectError;

/// Message discriminants, one per wire tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    ComputeMin,
    ComputeMax,
    Compare,
    ComparisonResult,
    Done,
}

impl MessageKind {
    /// Every known kind, in wire-tag order
    pub const ALL: [MessageKind; 5] = [
        MessageKind::ComputeMin,
        MessageKind::ComputeMax,
        MessageKind::Compare,
        MessageKind::ComparisonResult,
        MessageKind::Done,
    ];

    /// The value carried in the `ty` field
    pub fn tag(self) -> &'static str {
        match self {
            MessageKind::ComputeMin => "compute_min",
            MessageKind::ComputeMax => "compute_max",
            MessageKind::Compare => "compare",
            MessageKind::ComparisonResult => "comp_result",
            MessageKind::Done => "done",
        }
    }

    /// Look up a kind by its wire tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

/// A protocol message
///
/// `ComputeMin`, `ComputeMax` and `ComparisonResult` travel caller → service;
/// `Compare` and `Done` travel service → caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "ty", rename_all = "snake_case")]
pub enum Message {
    /// Start a minimum selection over indices `0..length`
    ComputeMin { length: usize },

    /// Start a maximum selection over indices `0..length`
    ComputeMax { length: usize },

    /// Ask whether `value[left] < value[right]`
    Compare {
        request_id: u32,
        left: usize,
        right: usize,
    },

    /// Answer to the `Compare` carrying the same `request_id`
    #[serde(rename = "comp_result")]
    ComparisonResult { request_id: u32, answer: bool },

    /// Session finished; `result` is the winning index
    Done { result: usize },
}

impl Message {
    /// Get the message kind
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::ComputeMin { .. } => MessageKind::ComputeMin,
            Message::ComputeMax { .. } => MessageKind::ComputeMax,
            Message::Compare { .. } => MessageKind::Compare,
            Message::ComparisonResult { .. } => MessageKind::ComparisonResult,
            Message::Done { .. } => MessageKind::Done,
        }
    }

    pub fn tag(&self) -> &'static str {
        self.kind().tag()
    }

    /// Only `Done` ends a session
    pub fn is_terminal(&self) -> bool {
        matches!(self, Message::Done { .. })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::ComputeMin { length } | Message::ComputeMax { length } => {
                write!(f, "{}(length={})", self.tag(), length)
            }
            Message::Compare {
                request_id,
                left,
                right,
            } => write!(
                f,
                "compare(request_id={}, left={}, right={})",
                request_id, left, right
            ),
            Message::ComparisonResult { request_id, answer } => {
                write!(f, "comp_result(request_id={}, answer={})", request_id, answer)
            }
            Message::Done { result } => write!(f, "done(result={})", result),
        }
    }
}

/// Which extreme a session selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Min,
    Max,
}

impl Operation {
    /// The request that opens a session of this operation over `length` values
    pub fn request(self, length: usize) -> Message {
        match self {
            Operation::Min => Message::ComputeMin { length },
            Operation::Max => Message::ComputeMax { length },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Min => "min",
            Operation::Max => "max",
        }
    }
}

impl FromStr for Operation {
    type Err = SelectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "min" => Ok(Operation::Min),
            "max" => Ok(Operation::Max),
            other => Err(SelectError::UnsupportedOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
