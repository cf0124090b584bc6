//! rita-core: Connection reports for rita
//!
//! This crate provides the query-sort-render pipeline behind
//! `rita show-long-connections`.
//!
//! # Architecture
//!
//! ```text
//! RecordSource (SQLite / memory) → LongConnections → TableRenderer (human)
//!                                                  → DelimitedRenderer
//! ```
//!
//! # Modules
//!
//! - `conn`: Connection record shape
//! - `storage`: Record sources and sort keys
//! - `report`: The long-connections report
//! - `output`: Delimited and table renderers
//! - `config`: Configuration management
//! - `logging`: Structured logging setup
//! - `error`: Error types with remediation hints
//!
//! # Safety
//!
//! This crate forbids unsafe code.

#![forbid(unsafe_code)]

pub mod config;
pub mod conn;
pub mod error;
pub mod logging;
pub mod output;
pub mod report;
pub mod storage;

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
