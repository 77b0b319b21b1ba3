//! Service Module
//!
//! The remote side of a selection session. The service never sees the
//! caller's values: it only knows the sequence length and the answers to the
//! comparisons it asks for.
//!
//! ## Strategy
//! Two-pointer elimination. `left` starts at 0 and `right` at `length - 1`;
//! every answer discards one of the two candidates, so a session takes
//! exactly `length - 1` comparisons. On ties the left candidate survives.

mod selection;

pub use selection::{SelectionService, SessionEntry};
