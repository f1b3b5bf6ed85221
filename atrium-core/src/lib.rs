//! Atrium Core Library
//!
//! This crate provides the shared pieces of the Atrium static file
//! server: configuration management, error handling, the handler and
//! middleware abstractions, and the HTTP accept loop.

pub mod config;
pub mod error;
pub mod handler;
pub mod server;

pub use error::{Error, Result};

/// Atrium version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
