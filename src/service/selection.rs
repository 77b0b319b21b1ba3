//! Selection service implementation
//!
//! Session table behind a Mutex, session ids from an atomic counter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Result, SelectError};
use crate::protocol::{Message, Operation};

/// Progress of one live session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEntry {
    /// Which extreme is being selected
    pub op: Operation,

    /// Left candidate index
    pub left: usize,

    /// Right candidate index
    pub right: usize,
}

impl SessionEntry {
    /// Apply `answer` (`value[left] < value[right]`) and discard one candidate
    fn eliminate(&mut self, answer: bool) {
        let keep_right = match self.op {
            Operation::Max => answer,
            Operation::Min => !answer,
        };

        if keep_right {
            self.left += 1;
        } else {
            self.right -= 1;
        }
    }

    fn is_settled(&self) -> bool {
        self.left == self.right
    }
}

/// Answers caller messages, one at a time per session
pub struct SelectionService {
    /// Live sessions keyed by request id
    sessions: Mutex<HashMap<u32, SessionEntry>>,

    /// Monotonically increasing id source (0 is never handed out)
    next_id: AtomicU32,

    /// Maximum number of live sessions
    max_sessions: usize,
}

impl SelectionService {
    pub fn new(config: &Config) -> Self {
        Self::with_capacity(config.max_sessions)
    }

    pub fn with_capacity(max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU32::new(1),
            max_sessions,
        }
    }

    /// Number of sessions still waiting for an answer
    pub fn live_sessions(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Look up a live session
    pub fn session(&self, request_id: u32) -> Option<SessionEntry> {
        self.sessions.lock().get(&request_id).copied()
    }

    /// Drop a session whose caller went away before `Done`
    ///
    /// Returns false if no such session was live.
    pub fn abandon(&self, request_id: u32) -> bool {
        let removed = self.sessions.lock().remove(&request_id).is_some();
        if removed {
            tracing::debug!("Session {} abandoned", request_id);
        }
        removed
    }

    /// Handle one caller message and produce the reply
    pub fn handle(&self, message: Message) -> Result<Message> {
        match message {
            Message::ComputeMin { length } => self.start(Operation::Min, length),
            Message::ComputeMax { length } => self.start(Operation::Max, length),
            Message::ComparisonResult { request_id, answer } => self.answer(request_id, answer),
            other => {
                let reason = format!("{} is not a caller message", other.tag());
                Err(SelectError::violation(other, reason))
            }
        }
    }

    fn start(&self, op: Operation, length: usize) -> Result<Message> {
        if length == 0 {
            return Err(SelectError::EmptySequence);
        }

        if length == 1 {
            tracing::debug!("{} over a single value, done immediately", op);
            return Ok(Message::Done { result: 0 });
        }

        let entry = SessionEntry {
            op,
            left: 0,
            right: length - 1,
        };

        let mut sessions = self.sessions.lock();
        if sessions.len() >= self.max_sessions {
            return Err(SelectError::CapacityExceeded(self.max_sessions));
        }

        let request_id = self.allocate_id(&sessions);
        sessions.insert(request_id, entry);

        tracing::debug!("Session {} started: {} over {} values", request_id, op, length);

        Ok(Message::Compare {
            request_id,
            left: entry.left,
            right: entry.right,
        })
    }

    fn answer(&self, request_id: u32, answer: bool) -> Result<Message> {
        let mut sessions = self.sessions.lock();
        let entry = sessions
            .get_mut(&request_id)
            .ok_or(SelectError::SessionNotFound(request_id))?;

        entry.eliminate(answer);

        if entry.is_settled() {
            let result = entry.left;
            sessions.remove(&request_id);
            tracing::debug!("Session {} done: result index {}", request_id, result);
            return Ok(Message::Done { result });
        }

        Ok(Message::Compare {
            request_id,
            left: entry.left,
            right: entry.right,
        })
    }

    /// Next unused id; wraps past `u32::MAX` and skips ids still live
    fn allocate_id(&self, sessions: &HashMap<u32, SessionEntry>) -> u32 {
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            if id != 0 && !sessions.contains_key(&id) {
                return id;
            }
        }
    }
}

impl Default for SelectionService {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
