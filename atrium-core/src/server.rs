//! HTTP accept loop
//!
//! Binds a TCP listener and drives each connection through hyper's
//! HTTP/1.1 connection handling. Every connection gets its own task;
//! the composed handler chain is shared behind an `Arc`.

use crate::error::{Error, Result};
use crate::handler::Handler;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// HTTP server bound to a single address
pub struct Server {
    addr: SocketAddr,
    handler: Arc<dyn Handler>,
}

impl Server {
    pub fn new(addr: SocketAddr, handler: Arc<dyn Handler>) -> Self {
        Self { addr, handler }
    }

    /// Run the accept loop until the process is stopped
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| Error::Server(format!("Failed to bind {}: {}", self.addr, e)))?;

        tracing::info!("🌐 Server listening on http://{}", self.addr);

        loop {
            let (stream, peer_addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!("Accept error: {}", e);
                    continue;
                }
            };

            let io = TokioIo::new(stream);
            let handler = self.handler.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                    let handler = handler.clone();
                    async move {
                        // GET/HEAD only, the body is irrelevant.
                        let response = handler.handle(req.map(|_| ())).await;
                        Ok::<_, Infallible>(response)
                    }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::debug!("Connection from {} ended: {:?}", peer_addr, err);
                }
            });
        }
    }
}
