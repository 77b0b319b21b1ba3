//! Selection driver
//!
//! Runs one selection session to completion, acting as the comparison
//! oracle for the remote service.

use crate::config::Config;
use crate::error::{Result, SelectError};
use crate::protocol::{decode, encode, Message, Operation};
use super::transport::{TcpTransport, Transport};

/// Where a session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The compute request is out, nothing has come back yet
    AwaitingInitialResponse,

    /// A comparison answer is out; its `request_id` is the one we echoed
    AwaitingComparisonAck { request_id: u32 },

    /// `Done` was received
    Terminated,
}

/// What the driver does after a service message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Send this answer and wait for the next message
    Reply(Message),

    /// The session is over; the winning index
    Finished(usize),
}

/// State of a single session over a caller-owned sequence
///
/// The values are only ever read, and only to answer `Compare` queries.
#[derive(Debug)]
pub struct Session<'a, V> {
    values: &'a [V],
    op: Operation,
    state: SessionState,
    comparisons: usize,
}

impl<'a, V: PartialOrd> Session<'a, V> {
    /// Open a session; returns it together with the request to send
    pub fn start(values: &'a [V], op: Operation) -> (Self, Message) {
        let session = Self {
            values,
            op,
            state: SessionState::AwaitingInitialResponse,
            comparisons: 0,
        };
        (session, op.request(values.len()))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn op(&self) -> Operation {
        self.op
    }

    /// Number of comparisons answered so far
    pub fn comparisons(&self) -> usize {
        self.comparisons
    }

    /// Consume one message from the service
    pub fn advance(&mut self, message: Message) -> Result<Step> {
        if self.state == SessionState::Terminated {
            return Err(SelectError::violation(message, "session already terminated"));
        }

        match message {
            Message::Done { result } => {
                self.check_index(result, &message)?;
                self.state = SessionState::Terminated;
                Ok(Step::Finished(result))
            }
            Message::Compare {
                request_id,
                left,
                right,
            } => {
                self.check_index(left, &message)?;
                self.check_index(right, &message)?;

                let answer = self.values[left] < self.values[right];
                self.comparisons += 1;
                self.state = SessionState::AwaitingComparisonAck { request_id };
                Ok(Step::Reply(Message::ComparisonResult { request_id, answer }))
            }
            other => {
                let reason = match self.state {
                    SessionState::AwaitingComparisonAck { request_id } => format!(
                        "unexpected {} from service while awaiting the reply to request {}",
                        other.tag(),
                        request_id
                    ),
                    _ => format!("unexpected {} from service", other.tag()),
                };
                Err(SelectError::violation(other, reason))
            }
        }
    }

    fn check_index(&self, index: usize, message: &Message) -> Result<()> {
        if index >= self.values.len() {
            return Err(SelectError::violation(
                message.clone(),
                format!("index {} out of range for length {}", index, self.values.len()),
            ));
        }
        Ok(())
    }
}

/// Client side of the protocol
pub struct Client<T> {
    transport: T,
}

impl Client<TcpTransport> {
    /// Connect to the service at `config.server_addr`
    pub fn connect(config: &Config) -> Result<Self> {
        Ok(Self::new(TcpTransport::connect(config)?))
    }
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// One round-trip: encode, deliver, decode
    pub fn send(&mut self, message: &Message) -> Result<Message> {
        tracing::trace!("-> {}", message);
        let reply = decode(self.transport.deliver(encode(message))?)?;
        tracing::trace!("<- {}", reply);
        Ok(reply)
    }

    /// Select the minimum (`"min"`) or maximum (`"max"`) of `values`
    ///
    /// Fails with `UnsupportedOperation` before anything is sent if `op`
    /// is neither.
    pub fn compute<V>(&mut self, values: &[V], op: &str) -> Result<V>
    where
        V: PartialOrd + Clone,
    {
        let op = op.parse::<Operation>()?;
        self.compute_with(values, op)
    }

    pub fn compute_with<V>(&mut self, values: &[V], op: Operation) -> Result<V>
    where
        V: PartialOrd + Clone,
    {
        let index = self.compute_index(values, op)?;
        Ok(values[index].clone())
    }

    /// Run a session and return the winning index
    pub fn compute_index<V: PartialOrd>(&mut self, values: &[V], op: Operation) -> Result<usize> {
        let (mut session, request) = Session::start(values, op);
        tracing::debug!("Starting {} session over {} values", op, values.len());

        let mut reply = self.send(&request)?;
        loop {
            match session.advance(reply) {
                Ok(Step::Reply(answer)) => reply = self.send(&answer)?,
                Ok(Step::Finished(index)) => {
                    tracing::debug!(
                        "{} session finished at index {} after {} comparisons",
                        op,
                        index,
                        session.comparisons()
                    );
                    return Ok(index);
                }
                Err(e) => {
                    tracing::warn!("Aborting {} session: {}", op, e);
                    return Err(e);
                }
            }
        }
    }
}
