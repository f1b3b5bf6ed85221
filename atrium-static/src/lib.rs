//! Atrium Static File Serving
//!
//! The request resolution and content-delivery pipeline:
//! - Accept-Encoding negotiation
//! - Response body compression (gzip, brotli, deflate)
//! - Dotfile-hiding filesystem view
//! - Path resolution and content dispatch
//! - Directory listings and custom error documents

pub mod content;
pub mod encoder;
pub mod file_server;
pub mod fs;
pub mod negotiate;

pub use encoder::BodyEncoder;
pub use file_server::{FileServer, FileServerConfig};
pub use fs::ServeRoot;
pub use negotiate::{AcceptEncoding, Encoding, OFFERED_ENCODINGS, negotiate};
