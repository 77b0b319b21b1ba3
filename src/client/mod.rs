//! Client Module
//!
//! The caller side of a selection session. The caller keeps its values and
//! only answers the comparison queries the service sends back.
//!
//! ## Control Flow
//! ```text
//! compute_min / compute_max ──► service
//!        ┌────────────────────── compare(id, l, r)
//!        ▼
//! comp_result(id, v[l] < v[r]) ──► service   (repeat)
//!                         ◄────── done(result)
//! ```

mod transport;
mod driver;

pub use transport::{Transport, TcpTransport};
pub use driver::{Client, Session, SessionState, Step};
