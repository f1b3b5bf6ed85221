//! Content metadata helpers
//!
//! Content-type inference from the file name and conditional-request
//! handling from the modification time.

use atrium_core::handler::HttpRequest;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Guess the Content-Type for a file name
pub fn content_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .to_string()
}

/// Format a modification time as an HTTP date
pub fn last_modified(modified: SystemTime) -> String {
    httpdate::fmt_http_date(modified)
}

/// Whether an If-Modified-Since precondition holds for the entry, i.e.
/// the client's copy is still fresh and a 304 should be returned.
pub fn is_unmodified(req: &HttpRequest, modified: Option<SystemTime>) -> bool {
    let Some(modified) = modified else {
        return false;
    };

    let Some(header) = req
        .headers()
        .get(http::header::IF_MODIFIED_SINCE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    let Ok(since) = httpdate::parse_http_date(header) else {
        return false;
    };

    // HTTP dates carry second precision
    truncate_to_secs(modified) <= since
}

fn truncate_to_secs(time: SystemTime) -> SystemTime {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => UNIX_EPOCH + Duration::from_secs(elapsed.as_secs()),
        Err(_) => time,
    }
}
