//! # abicodec-observability
//!
//! Structured logging for abicodec binaries.
//!
//! Library crates only emit `tracing` events; this crate installs the
//! subscriber. Logs go to stderr as text or JSON (ELK, Loki, CloudWatch),
//! with levels configurable per component.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, LogConfig};
