//! Atrium Request Middleware
//!
//! Cross-cutting handlers composed around the file server:
//! - Basic authentication against an htpasswd-style credential table
//! - Literal path prefix stripping

mod auth;
mod strip_prefix;

pub use auth::{BasicAuth, Credentials};
pub use strip_prefix::StripPrefix;
