//! Logging utilities.
//!
//! The engine only ever talks to the `log` facade. This module wires up the
//! `env_logger` backend for binaries that want one.

mod init;

pub use init::{init_logging, LoggingConfig};
