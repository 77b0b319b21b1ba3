//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single non-blocking acceptor loop
//! - Worker thread pool fed over a bounded channel
//! - Each frame routed through the SelectionService

mod server;
mod connection;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
