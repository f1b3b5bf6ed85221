//! Accept-Encoding negotiation
//!
//! Scores the client's encoding preferences against the server's
//! ordered offer list and picks the response content encoding.

use atrium_core::error::{Error, Result};
use std::collections::HashMap;

/// Supported content encodings, in the server's priority order
pub const OFFERED_ENCODINGS: &[Encoding] = &[Encoding::Brotli, Encoding::Gzip, Encoding::Deflate];

/// A response content encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Brotli,
    Gzip,
    Deflate,
    Identity,
}

impl Encoding {
    /// The Content-Encoding header token
    pub fn token(&self) -> &'static str {
        match self {
            Encoding::Brotli => "br",
            Encoding::Gzip => "gzip",
            Encoding::Deflate => "deflate",
            Encoding::Identity => "identity",
        }
    }
}

/// Parsed Accept-Encoding preference table, token to q-value.
///
/// Derived fresh per request and never shared across requests.
#[derive(Debug, Default)]
pub struct AcceptEncoding(HashMap<String, f64>);

impl AcceptEncoding {
    /// Parse an Accept-Encoding header value. An absent header is
    /// implicit wildcard acceptance at weight 1.0.
    pub fn parse(header: Option<&str>) -> Result<Self> {
        let mut table = HashMap::new();

        let Some(header) = header else {
            table.insert("*".to_string(), 1.0);
            return Ok(Self(table));
        };

        for entry in header.split(',') {
            let entry = entry.trim();
            let parts: Vec<&str> = entry.split(";q=").collect();

            let mut qvalue = 1.0;
            if parts.len() == 2 {
                qvalue = parts[1]
                    .parse::<f64>()
                    .map_err(|_| Error::EncodingHeaderMalformed(entry.to_string()))?;
            }

            table.insert(parts[0].to_string(), qvalue);
        }

        Ok(Self(table))
    }

    /// Weight for an encoding token, falling back to the wildcard entry
    pub fn qvalue(&self, token: &str) -> Option<f64> {
        self.0.get(token).or_else(|| self.0.get("*")).copied()
    }
}

/// Pick the best offered encoding for the given Accept-Encoding header.
///
/// Offers are scanned in priority order and ties keep the earlier one.
/// When nothing scores above zero, identity is the fallback unless the
/// client weighted it (directly or via wildcard) at exactly zero, which
/// is a hard rejection.
pub fn negotiate(header: Option<&str>, offers: &[Encoding]) -> Result<Encoding> {
    let accept = AcceptEncoding::parse(header)?;

    let mut best = None;
    let mut best_qvalue = 0.0;

    for &offer in offers {
        if let Some(qvalue) = accept.qvalue(offer.token()) {
            if qvalue > best_qvalue {
                best = Some(offer);
                best_qvalue = qvalue;
            }
        }
    }

    if let Some(encoding) = best {
        return Ok(encoding);
    }

    match accept.qvalue(Encoding::Identity.token()) {
        Some(qvalue) if qvalue == 0.0 => Err(Error::NotAcceptable),
        _ => Ok(Encoding::Identity),
    }
}
