//! Prefix-stripping middleware

use atrium_core::handler::{Handler, HttpRequest, HttpResponse, Middleware};
use std::sync::Arc;

/// Removes a fixed literal prefix from the request path before
/// delegating. Requests without the prefix pass through untouched.
pub struct StripPrefix {
    prefix: String,
}

impl StripPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Middleware for StripPrefix {
    fn wrap(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler> {
        Arc::new(StripPrefixHandler {
            prefix: self.prefix.clone(),
            next,
        })
    }
}

struct StripPrefixHandler {
    prefix: String,
    next: Arc<dyn Handler>,
}

#[async_trait::async_trait]
impl Handler for StripPrefixHandler {
    async fn handle(&self, mut req: HttpRequest) -> HttpResponse {
        let path = req.uri().path();

        if let Some(stripped) = path.strip_prefix(self.prefix.as_str()) {
            let stripped = if stripped.starts_with('/') {
                stripped.to_string()
            } else {
                format!("/{}", stripped)
            };

            let path_and_query = match req.uri().query() {
                Some(query) => format!("{}?{}", stripped, query),
                None => stripped,
            };

            if let Ok(uri) = path_and_query.parse::<http::Uri>() {
                *req.uri_mut() = uri;
            }
        }

        self.next.handle(req).await
    }
}
