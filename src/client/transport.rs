//! Client transport
//!
//! One synchronous request/response exchange per `deliver` call.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use crate::config::Config;
use crate::error::{Result, SelectError};
use crate::protocol::{read_frame, write_frame, Frame, WireRecord};

/// Carries one wire record to the selection service and returns its reply
///
/// Implementations must not reorder, drop or duplicate records, and must
/// report failures as errors for which `SelectError::is_transport` holds
/// (or pass decode errors through untouched) rather than return a bogus record.
pub trait Transport {
    fn deliver(&mut self, record: WireRecord) -> Result<WireRecord>;
}

impl<F> Transport for F
where
    F: FnMut(WireRecord) -> Result<WireRecord>,
{
    fn deliver(&mut self, record: WireRecord) -> Result<WireRecord> {
        self(record)
    }
}

/// Framed TCP transport holding a single connection
pub struct TcpTransport {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Server address for logging
    server_addr: String,

    /// Set once an exchange failed mid-stream; the stream may still hold a
    /// late reply, so it is never read again
    broken: Option<String>,
}

impl TcpTransport {
    /// Connect to `config.server_addr` and apply the configured timeouts
    pub fn connect(config: &Config) -> Result<Self> {
        let stream = TcpStream::connect(&config.server_addr)?;
        stream.set_nodelay(true)?;

        if config.read_timeout_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))?;
        }
        if config.write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(config.write_timeout_ms)))?;
        }

        let read_stream = stream.try_clone()?;

        tracing::debug!("Connected to selection service at {}", config.server_addr);

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            server_addr: config.server_addr.clone(),
            broken: None,
        })
    }

    /// Get the server address string
    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    /// True once a failed exchange made the connection unusable
    pub fn is_broken(&self) -> bool {
        self.broken.is_some()
    }

    /// Stop using the stream after a failed write or read
    fn poison(&mut self, error: SelectError) -> SelectError {
        let error = self.classify(error);
        tracing::warn!("Dropping connection to {}: {}", self.server_addr, error);
        let _ = self.writer.get_ref().shutdown(Shutdown::Both);
        self.broken = Some(error.to_string());
        error
    }

    fn classify(&self, error: SelectError) -> SelectError {
        match error {
            SelectError::Io(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                SelectError::Timeout(format!("no reply from {}", self.server_addr))
            }
            SelectError::Io(ref e) if e.kind() == ErrorKind::UnexpectedEof => {
                SelectError::Transport(format!("{} closed the connection", self.server_addr))
            }
            other => other,
        }
    }
}

impl Transport for TcpTransport {
    fn deliver(&mut self, record: WireRecord) -> Result<WireRecord> {
        if let Some(cause) = &self.broken {
            return Err(SelectError::Transport(format!(
                "connection to {} unusable after: {}",
                self.server_addr, cause
            )));
        }

        if let Err(e) = write_frame(&mut self.writer, &Frame::record(record)) {
            return Err(self.poison(e));
        }
        let reply = match read_frame(&mut self.reader) {
            Ok(frame) => frame,
            Err(e) => return Err(self.poison(e)),
        };

        // ERROR frames and bad records leave the stream in step
        reply.into_record()
    }
}
