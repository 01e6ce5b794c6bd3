//! # buildsrv-pipe
//!
//! Async transport glue for buildsrv responses.
//!
//! This crate provides:
//! - A connection wrapper that sends or receives one response over any
//!   tokio byte stream, with timeouts
//! - Layered configuration (defaults, YAML file, environment)
//! - The client-side outcome of a received response

pub mod config;
pub mod connection;
pub mod error;
pub mod outcome;

pub use config::{Config, ConfigError, PipeConfig};
pub use connection::Connection;
pub use error::PipeError;
pub use outcome::{ClientOutcome, FallbackReason};
