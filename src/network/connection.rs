//! Connection Handler
//!
//! Handles individual client connections.

use std::collections::HashSet;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, SelectError};
use crate::protocol::{read_frame, write_frame, Frame, Message};
use crate::service::SelectionService;

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Reference to the selection service
    service: Arc<SelectionService>,

    /// Peer address for logging
    peer_addr: String,

    /// Sessions started on this connection that have not reached `Done`
    open_sessions: HashSet<u32>,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O
    pub fn new(stream: TcpStream, service: Arc<SelectionService>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Every exchange is a tiny request/response pair
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            service,
            peer_addr,
            open_sessions: HashSet::new(),
        })
    }

    /// Configure connection timeouts (0 leaves a direction unbounded)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads frames in a loop and answers each one. Protocol and session
    /// errors are reported back to the client and the connection stays open;
    /// I/O errors end it. Sessions left unfinished are released on return.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        let result = self.serve();
        self.release_sessions();
        result
    }

    fn serve(&mut self) -> Result<()> {
        loop {
            let frame = match read_frame(&mut self.reader) {
                Ok(frame) => frame,
                Err(SelectError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(SelectError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    let _ = write_frame(&mut self.writer, &Frame::error(&e.to_string()));
                    return Err(e);
                }
            };

            let reply = match frame.into_message().and_then(|m| self.dispatch(m)) {
                Ok(message) => Frame::message(&message),
                Err(e) => {
                    tracing::warn!("Rejecting request from {}: {}", self.peer_addr, e);
                    Frame::error(&e.to_string())
                }
            };

            if let Err(e) = write_frame(&mut self.writer, &reply) {
                if let SelectError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) || io_err.kind() == ErrorKind::BrokenPipe {
                        tracing::debug!(
                            "Client {} disconnected before reply could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Run one message through the service, tracking which sessions this
    /// connection still owns
    fn dispatch(&mut self, message: Message) -> Result<Message> {
        tracing::trace!("Received from {}: {}", self.peer_addr, message);

        // One exchange at a time per connection: a new compute request means
        // the client gave up on whatever it had open
        if matches!(message, Message::ComputeMin { .. } | Message::ComputeMax { .. }) {
            self.release_sessions();
        }
        let finished = match message {
            Message::ComparisonResult { request_id, .. } => Some(request_id),
            _ => None,
        };

        let reply = self.service.handle(message)?;

        match reply {
            Message::Compare { request_id, .. } => {
                self.open_sessions.insert(request_id);
            }
            Message::Done { .. } => {
                if let Some(request_id) = finished {
                    self.open_sessions.remove(&request_id);
                }
            }
            _ => {}
        }

        Ok(reply)
    }

    fn release_sessions(&mut self) {
        if self.open_sessions.is_empty() {
            return;
        }
        tracing::debug!(
            "Releasing {} unfinished session(s) of {}",
            self.open_sessions.len(),
            self.peer_addr
        );
        for request_id in self.open_sessions.drain() {
            self.service.abandon(request_id);
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted
    )
}
