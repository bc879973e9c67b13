//! Logging utilities.
//!
//! Centralizes logger initialization for hosts that do not bring their own.
//! The engine itself only emits through the standard `log` facade, so any
//! backend works.

mod init;

pub use init::{LoggingConfig, init_logging};
