//! Basic authentication middleware
//!
//! Gates the rest of the chain behind a read-only credential table
//! loaded once at startup. Missing credentials get a 401 challenge,
//! failing ones get a 403.

use atrium_core::error::{Error, Result};
use atrium_core::handler::{Handler, HttpRequest, HttpResponse, Middleware, empty_response};
use base64::Engine;
use http::{StatusCode, header};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Read-only credential table, username to bcrypt password hash
#[derive(Debug, Clone, Default)]
pub struct Credentials(HashMap<String, String>);

impl Credentials {
    /// Parse htpasswd-style `user:bcrypt-hash` lines. A malformed line
    /// or a non-bcrypt hash fails the whole load.
    pub fn parse(input: &str) -> Result<Self> {
        let mut table = HashMap::new();

        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let parts: Vec<&str> = line.split(':').collect();
            if parts.len() != 2 || !is_bcrypt_hash(parts[1]) {
                return Err(Error::UnsupportedCredentialEncoding(
                    "only bcrypt password hashes are supported".to_string(),
                ));
            }

            table.insert(parts[0].to_string(), parts[1].to_string());
        }

        Ok(Self(table))
    }

    /// Load credentials from an htpasswd-style file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    fn matches(&self, user: &str, password: &str) -> bool {
        match self.0.get(user) {
            Some(hash) => bcrypt::verify(password, hash).unwrap_or(false),
            None => false,
        }
    }
}

fn is_bcrypt_hash(hash: &str) -> bool {
    hash.starts_with("$2a$") || hash.starts_with("$2b$") || hash.starts_with("$2y$")
}

/// Basic auth middleware
pub struct BasicAuth {
    credentials: Arc<Credentials>,
    realm: String,
}

impl BasicAuth {
    pub fn new(credentials: Credentials, realm: impl Into<String>) -> Self {
        Self {
            credentials: Arc::new(credentials),
            realm: realm.into(),
        }
    }
}

impl Middleware for BasicAuth {
    fn wrap(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler> {
        Arc::new(BasicAuthHandler {
            credentials: self.credentials.clone(),
            realm: self.realm.clone(),
            next,
        })
    }
}

struct BasicAuthHandler {
    credentials: Arc<Credentials>,
    realm: String,
    next: Arc<dyn Handler>,
}

#[async_trait::async_trait]
impl Handler for BasicAuthHandler {
    async fn handle(&self, req: HttpRequest) -> HttpResponse {
        let Some((user, password)) = basic_credentials(&req) else {
            let mut response = empty_response(StatusCode::UNAUTHORIZED);
            let challenge = format!("Basic realm=\"{}\"", self.realm);
            if let Ok(value) = header::HeaderValue::from_str(&challenge) {
                response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
            }
            return response;
        };

        if !self.credentials.matches(&user, &password) {
            tracing::debug!("Rejected credentials for user: {}", user);
            return empty_response(StatusCode::FORBIDDEN);
        }

        self.next.handle(req).await
    }
}

/// Extract the username and password of a basic auth header
fn basic_credentials(req: &HttpRequest) -> Option<(String, String)> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?;

    let (scheme, payload) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Basic") {
        return None;
    }

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}
