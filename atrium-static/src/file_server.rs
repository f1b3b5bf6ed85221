//! File server implementation
//!
//! Resolves a request path against the filesystem view and decides
//! between serving a file, redirecting to add a trailing slash, serving
//! an index document, rendering a directory listing, or responding with
//! an error.

use crate::content;
use crate::encoder;
use crate::fs::{ChildEntry, OpenEntry, ServeRoot, clean_path};
use crate::negotiate::{Encoding, OFFERED_ENCODINGS, negotiate};
use atrium_core::error::Error;
use atrium_core::handler::{Handler, HttpRequest, HttpResponse, empty_response};
use bytes::Bytes;
use http::{Method, StatusCode, header};
use http_body_util::Full;
use std::io;
use std::path::PathBuf;

/// Configuration for the file server
#[derive(Debug, Clone)]
pub struct FileServerConfig {
    /// Root directory to serve
    pub root: PathBuf,
    /// Index file to look for in directories
    pub index: String,
    /// Enable auto-generated directory listings
    pub auto_index: bool,
    /// Hide dotfiles and everything beneath them
    pub hide_dotfiles: bool,
    /// Negotiate and apply response compression
    pub compress: bool,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            index: "index.html".to_string(),
            auto_index: false,
            hide_dotfiles: true,
            compress: true,
        }
    }
}

/// Static file server
pub struct FileServer {
    fs: ServeRoot,
    index: String,
    auto_index: bool,
    compress: bool,
}

impl FileServer {
    /// Create a new file server
    pub fn new(config: FileServerConfig) -> Self {
        Self {
            fs: ServeRoot::new(config.root, config.hide_dotfiles),
            index: config.index,
            auto_index: config.auto_index,
            compress: config.compress,
        }
    }

    /// Create a file server for a directory with default options
    pub fn serve_dir(root: impl Into<PathBuf>) -> Self {
        Self::new(FileServerConfig {
            root: root.into(),
            ..Default::default()
        })
    }

    /// Enable directory listings
    pub fn with_auto_index(mut self, enable: bool) -> Self {
        self.auto_index = enable;
        self
    }

    async fn respond(&self, req: &HttpRequest) -> HttpResponse {
        let raw_path = req.uri().path();
        let url_path = clean_path(raw_path);

        tracing::debug!("📁 Resolving request: {} -> {}", raw_path, url_path);

        let entry = match self.fs.open(&url_path).await {
            Ok(entry) => entry,
            Err(err) => return self.error_response(req, &err).await,
        };

        if !entry.metadata.is_dir() {
            return self.serve_file(req, entry).await;
        }

        // Relative links inside served documents only resolve correctly
        // when directory URLs end with a slash.
        if !raw_path.ends_with('/') {
            return redirect_adding_slash(req);
        }

        let index_path = if url_path == "/" {
            format!("/{}", self.index)
        } else {
            format!("{}/{}", url_path, self.index)
        };

        match self.open_index(&index_path).await {
            Ok(index_entry) => self.serve_file(req, index_entry).await,
            Err(err) if err.kind() == io::ErrorKind::NotFound && self.auto_index => {
                self.serve_listing(req, &url_path).await
            }
            Err(err) => self.error_response(req, &err).await,
        }
    }

    /// Resolve the index document of a directory. A directory named
    /// like the index file counts as missing, so index resolution never
    /// re-enters the directory branch.
    async fn open_index(&self, index_path: &str) -> io::Result<OpenEntry> {
        let entry = self.fs.open(index_path).await?;
        if entry.metadata.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "index is a directory",
            ));
        }
        Ok(entry)
    }

    async fn serve_file(&self, req: &HttpRequest, entry: OpenEntry) -> HttpResponse {
        let accept_encoding = req
            .headers()
            .get(header::ACCEPT_ENCODING)
            .and_then(|value| value.to_str().ok());

        let encoding = if self.compress {
            match negotiate(accept_encoding, OFFERED_ENCODINGS) {
                Ok(encoding) => encoding,
                Err(Error::NotAcceptable) => {
                    return empty_response(StatusCode::NOT_ACCEPTABLE);
                }
                Err(Error::EncodingHeaderMalformed(value)) => {
                    tracing::debug!("Rejecting malformed Accept-Encoding: {}", value);
                    return empty_response(StatusCode::BAD_REQUEST);
                }
                Err(err) => {
                    tracing::error!("Content negotiation failed: {}", err);
                    return empty_response(StatusCode::INTERNAL_SERVER_ERROR);
                }
            }
        } else {
            Encoding::Identity
        };

        let modified = entry.metadata.modified().ok();
        if content::is_unmodified(req, modified) {
            return empty_response(StatusCode::NOT_MODIFIED);
        }

        let body = match tokio::fs::read(&entry.path).await {
            Ok(body) => body,
            Err(err) => return self.error_response(req, &err).await,
        };

        let body = if encoding == Encoding::Identity {
            body
        } else {
            match encoder::encode(encoding, &body).await {
                Ok(compressed) => compressed,
                Err(err) => {
                    tracing::error!("Failed to compress {}: {}", entry.path.display(), err);
                    return empty_response(StatusCode::INTERNAL_SERVER_ERROR);
                }
            }
        };

        let mut builder = http::Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content::content_type(&entry.name));

        if let Some(modified) = modified {
            builder = builder.header(header::LAST_MODIFIED, content::last_modified(modified));
        }

        if encoding != Encoding::Identity {
            builder = builder.header(header::CONTENT_ENCODING, encoding.token());
        }

        let body = if req.method() == Method::HEAD {
            Bytes::new()
        } else {
            Bytes::from(body)
        };

        builder.body(Full::new(body)).unwrap()
    }

    async fn serve_listing(&self, req: &HttpRequest, url_path: &str) -> HttpResponse {
        let children = match self.fs.read_dir(url_path).await {
            Ok(children) => children,
            Err(err) => return self.error_response(req, &err).await,
        };

        let html = render_listing(req.uri().path(), url_path, &children);

        let body = if req.method() == Method::HEAD {
            Bytes::new()
        } else {
            Bytes::from(html)
        };

        http::Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
            .body(Full::new(body))
            .unwrap()
    }

    /// Classify a filesystem error and respond, serving the matching
    /// `<status>.html` document from the root when one exists.
    async fn error_response(&self, req: &HttpRequest, err: &io::Error) -> HttpResponse {
        let status = classify(err);

        let document_path = format!("/{}.html", status.as_u16());
        if let Ok(entry) = self.open_index(&document_path).await {
            if let Ok(body) = tokio::fs::read(&entry.path).await {
                let body = if req.method() == Method::HEAD {
                    Bytes::new()
                } else {
                    Bytes::from(body)
                };

                return http::Response::builder()
                    .status(status)
                    .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
                    .body(Full::new(body))
                    .unwrap();
            }
        }

        empty_response(status)
    }
}

#[async_trait::async_trait]
impl Handler for FileServer {
    async fn handle(&self, req: HttpRequest) -> HttpResponse {
        self.respond(&req).await
    }
}

/// Map a filesystem error to an HTTP status. Permission errors are
/// reported as 404 so the existence of restricted paths does not leak.
fn classify(err: &io::Error) -> StatusCode {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => StatusCode::NOT_FOUND,
        _ => {
            tracing::error!("Unexpected filesystem error: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// 301 to the same path with a trailing slash, query string preserved
fn redirect_adding_slash(req: &HttpRequest) -> HttpResponse {
    let mut location = format!("{}/", req.uri().path());
    if let Some(query) = req.uri().query() {
        location.push('?');
        location.push_str(query);
    }

    http::Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(header::LOCATION, location)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Generate an HTML directory listing
fn render_listing(display_path: &str, url_path: &str, children: &[ChildEntry]) -> String {
    let mut html = format!(
        "<html><head><title>Index of {}</title></head><body><h1>Index of {}</h1><hr><pre>\n",
        display_path, display_path
    );

    if url_path != "/" {
        html.push_str("<a href=\"../\">../</a>\n");
    }

    for child in children {
        let name = if child.is_dir {
            format!("{}/", child.name)
        } else {
            child.name.clone()
        };
        html.push_str(&format!("<a href=\"{}\">{}</a>\n", name, name));
    }

    html.push_str("</pre><hr></body></html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::io::Read;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.txt"), "quarterly numbers").unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/a.txt"), "alpha").unwrap();
        std::fs::write(dir.path().join("docs/.secret"), "hidden").unwrap();
        dir
    }

    fn get(path_and_query: &str) -> HttpRequest {
        http::Request::builder()
            .uri(path_and_query)
            .body(())
            .unwrap()
    }

    fn get_with_encoding(path: &str, accept_encoding: &str) -> HttpRequest {
        http::Request::builder()
            .uri(path)
            .header(header::ACCEPT_ENCODING, accept_encoding)
            .body(())
            .unwrap()
    }

    async fn body_bytes(response: HttpResponse) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    #[tokio::test]
    async fn test_serves_plain_file() {
        let dir = site();
        let server = FileServer::serve_dir(dir.path());

        let response = server
            .handle(get_with_encoding("/report.txt", "identity"))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain"
        );
        assert!(response.headers().get(header::LAST_MODIFIED).is_some());
        assert!(response.headers().get(header::CONTENT_ENCODING).is_none());
        assert_eq!(body_bytes(response).await, b"quarterly numbers");
    }

    #[tokio::test]
    async fn test_absent_header_compresses_with_top_offer() {
        // No Accept-Encoding means implicit wildcard acceptance, so the
        // highest-priority offer wins.
        let dir = site();
        let server = FileServer::serve_dir(dir.path());

        let response = server.handle(get("/report.txt")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_ENCODING).unwrap(),
            "br"
        );

        let compressed = body_bytes(response).await;
        let mut decoder = async_compression::tokio::write::BrotliDecoder::new(Vec::new());
        use tokio::io::AsyncWriteExt;
        decoder.write_all(&compressed).await.unwrap();
        decoder.shutdown().await.unwrap();
        assert_eq!(decoder.into_inner(), b"quarterly numbers");
    }

    #[tokio::test]
    async fn test_head_omits_body() {
        let dir = site();
        let server = FileServer::serve_dir(dir.path());

        let req = http::Request::builder()
            .method(Method::HEAD)
            .uri("/report.txt")
            .body(())
            .unwrap();

        let response = server.handle(req).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain"
        );
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = site();
        let server = FileServer::serve_dir(dir.path());

        let response = server.handle(get("/nope.txt")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_dotfile_is_404_not_forbidden() {
        let dir = site();
        let server = FileServer::serve_dir(dir.path());

        let response = server.handle(get("/docs/.secret")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_directory_without_slash_redirects() {
        let dir = site();
        let server = FileServer::serve_dir(dir.path());

        let response = server.handle(get("/docs")).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/docs/");
    }

    #[tokio::test]
    async fn test_redirect_preserves_query() {
        let dir = site();
        let server = FileServer::serve_dir(dir.path());

        let response = server.handle(get("/docs?page=2&sort=name")).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/docs/?page=2&sort=name"
        );
    }

    #[tokio::test]
    async fn test_root_serves_index_document() {
        let dir = site();
        let server = FileServer::serve_dir(dir.path());

        let response = server.handle(get_with_encoding("/", "identity")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html"
        );
        assert_eq!(body_bytes(response).await, b"<h1>home</h1>");
    }

    #[tokio::test]
    async fn test_directory_without_index_is_404_when_listings_off() {
        let dir = site();
        let server = FileServer::serve_dir(dir.path());

        let response = server.handle(get("/docs/")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_listing_shows_visible_children_only() {
        let dir = site();
        let server = FileServer::serve_dir(dir.path()).with_auto_index(true);

        let response = server.handle(get("/docs/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );

        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(html.contains("<a href=\"a.txt\">a.txt</a>"));
        assert!(!html.contains(".secret"));
        assert!(html.contains("<a href=\"../\">../</a>"));
    }

    #[tokio::test]
    async fn test_listing_marks_directories() {
        let dir = site();
        std::fs::create_dir(dir.path().join("docs/img")).unwrap();
        let server = FileServer::serve_dir(dir.path()).with_auto_index(true);

        let response = server.handle(get("/docs/")).await;
        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(html.contains("<a href=\"img/\">img/</a>"));
    }

    #[tokio::test]
    async fn test_index_directory_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("index.html")).unwrap();
        let server = FileServer::serve_dir(dir.path());

        let response = server.handle(get("/")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_brotli_preferred_over_gzip() {
        let dir = site();
        let server = FileServer::serve_dir(dir.path());

        let response = server
            .handle(get_with_encoding(
                "/report.txt",
                "gzip;q=0.5, br;q=0.8",
            ))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_ENCODING).unwrap(),
            "br"
        );

        let compressed = body_bytes(response).await;
        let mut decoder =
            async_compression::tokio::write::BrotliDecoder::new(Vec::new());
        use tokio::io::AsyncWriteExt;
        decoder.write_all(&compressed).await.unwrap();
        decoder.shutdown().await.unwrap();
        assert_eq!(decoder.into_inner(), b"quarterly numbers");
    }

    #[tokio::test]
    async fn test_gzip_round_trip() {
        let dir = site();
        let server = FileServer::serve_dir(dir.path());

        let response = server
            .handle(get_with_encoding("/report.txt", "gzip"))
            .await;
        assert_eq!(
            response.headers().get(header::CONTENT_ENCODING).unwrap(),
            "gzip"
        );

        let compressed = body_bytes(response).await;
        let mut decoder = flate2::read::GzDecoder::new(compressed.as_slice());
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).unwrap();
        assert_eq!(decompressed, b"quarterly numbers");
    }

    #[tokio::test]
    async fn test_identity_rejection_is_406() {
        let dir = site();
        let server = FileServer::serve_dir(dir.path());

        let response = server
            .handle(get_with_encoding("/report.txt", "identity;q=0, zstd"))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    }

    #[tokio::test]
    async fn test_malformed_qvalue_is_400() {
        let dir = site();
        let server = FileServer::serve_dir(dir.path());

        let response = server
            .handle(get_with_encoding("/report.txt", "gzip;q=banana"))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_if_modified_since_yields_304() {
        let dir = site();
        let server = FileServer::serve_dir(dir.path());

        let fresh = httpdate::fmt_http_date(std::time::SystemTime::now());
        let req = http::Request::builder()
            .uri("/report.txt")
            .header(header::IF_MODIFIED_SINCE, fresh)
            .body(())
            .unwrap();

        let response = server.handle(req).await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_custom_error_document() {
        let dir = site();
        std::fs::write(dir.path().join("404.html"), "<h1>lost</h1>").unwrap();
        let server = FileServer::serve_dir(dir.path());

        let response = server.handle(get("/nope.txt")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_bytes(response).await, b"<h1>lost</h1>");
    }

    #[tokio::test]
    async fn test_docs_scenario() {
        // GET /docs (dir, no index.html, listings on, a.txt + .secret)
        let dir = site();
        let server = FileServer::serve_dir(dir.path()).with_auto_index(true);

        let response = server.handle(get("/docs")).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/docs/");

        let response = server.handle(get("/docs/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(html.matches("a.txt").count(), 2); // href and label
        assert!(!html.contains(".secret"));
    }

    #[tokio::test]
    async fn test_path_traversal_stays_inside_root() {
        let dir = site();
        let server = FileServer::serve_dir(dir.path());

        let response = server.handle(get("/../../etc/passwd")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
