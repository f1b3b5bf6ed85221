//! Request handler and middleware abstractions
//!
//! A request flows through an ordered middleware chain into a terminal
//! handler. The chain is composed once at server construction time and
//! is immutable afterwards; every request sees the same fixed sequence
//! unless a middleware short-circuits with its own response.

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use std::sync::Arc;

/// Request type seen by handlers. Atrium only serves GET/HEAD, so the
/// request body is dropped at the transport boundary.
pub type HttpRequest = http::Request<()>;

/// Response type produced by handlers
pub type HttpResponse = http::Response<Full<Bytes>>;

/// A request handler
#[async_trait::async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, req: HttpRequest) -> HttpResponse;
}

/// A middleware wraps the next handler and returns a new handler that
/// may inspect or rewrite the request, short-circuit, or delegate.
pub trait Middleware: Send + Sync {
    fn wrap(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler>;
}

/// Ordered middleware chain. Construction order is outer-to-inner
/// execution order for requests.
#[derive(Default)]
pub struct Chain {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware to the chain
    pub fn then(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Box::new(middleware));
        self
    }

    /// Compose the chain around a terminal handler
    pub fn build(self, inner: Arc<dyn Handler>) -> Arc<dyn Handler> {
        self.middlewares
            .into_iter()
            .rev()
            .fold(inner, |next, middleware| middleware.wrap(next))
    }
}

/// Create an empty-bodied response with the given status
pub fn empty_response(status: StatusCode) -> HttpResponse {
    let mut response = http::Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
