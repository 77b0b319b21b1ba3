//! # oracle-select
//!
//! Remote min/max selection where the values never leave the caller:
//! - The caller sends only the sequence length
//! - The service drives the selection and asks comparison queries
//! - The caller answers each query from its private values
//! - The service reports the winning index
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────┐            ┌──────────────────────────┐
//! │          Client          │  compute   │      TCP Server          │
//! │  (private values, oracle)│ ─────────► │  (thread per connection) │
//! │                          │  compare   │                          │
//! │   Session state machine  │ ◄───────── │   SelectionService       │
//! │                          │ comp_result│   (two-pointer sessions) │
//! │                          │ ─────────► │                          │
//! │                          │    done    │                          │
//! │                          │ ◄───────── │                          │
//! └──────────────────────────┘            └──────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod client;
pub mod service;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{SelectError, Result};
pub use config::Config;
pub use client::Client;
pub use protocol::{Message, Operation};
pub use service::SelectionService;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of oracle-select
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
