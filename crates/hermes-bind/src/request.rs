//! The server-side request model consumed by argument binders.
//!
//! A [`ServerRequest`] aggregates everything binders extract from: method,
//! URI, headers, the request body in whichever state it is in (absent,
//! fully buffered, or still streaming), and the multiplexed part-event
//! source for multipart uploads.

use crate::observer::UploadObserver;
use bytes::Bytes;
use futures_core::Stream;
use http::{HeaderMap, Method, Uri};
use parking_lot::Mutex;
use std::pin::Pin;
use std::sync::Arc;
use uuid::Uuid;

/// Item type of a raw streaming request body.
pub type ChunkResult = Result<Bytes, std::io::Error>;

type BoxChunkStream = Pin<Box<dyn Stream<Item = ChunkResult> + Send>>;

/// Shared, single-consumer handle over a raw streaming request body.
///
/// Cloning shares the handle; the first caller to [`BodyChunks::take`] owns
/// the chunk stream.
#[derive(Clone)]
pub struct BodyChunks {
    inner: Arc<Mutex<Option<BoxChunkStream>>>,
}

impl BodyChunks {
    /// Wraps a raw chunk stream.
    #[must_use]
    pub fn new(stream: impl Stream<Item = ChunkResult> + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(Box::pin(stream)))),
        }
    }

    /// Takes the chunk stream out of the handle, if not already taken.
    #[must_use]
    pub fn take(&self) -> Option<impl Stream<Item = ChunkResult> + Send> {
        self.inner.lock().take()
    }
}

impl std::fmt::Debug for BodyChunks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyChunks")
            .field("taken", &self.inner.lock().is_none())
            .finish()
    }
}

/// The request body in whichever state the transport has it.
#[derive(Debug, Clone, Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// Fully buffered body.
    Complete(Bytes),
    /// Body still arriving as chunks.
    Streaming(BodyChunks),
}

/// An inbound HTTP request as seen by the binding engine.
///
/// # Example
///
/// ```rust
/// use hermes_bind::ServerRequest;
/// use http::{Method, Uri};
///
/// let request = ServerRequest::builder()
///     .method(Method::GET)
///     .uri(Uri::from_static("/users/5?verbose=true"))
///     .build();
///
/// assert_eq!(request.path(), "/users/5");
/// assert_eq!(request.query_string(), Some("verbose=true"));
/// ```
#[derive(Debug)]
pub struct ServerRequest {
    id: Uuid,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
    uploads: UploadObserver,
}

impl ServerRequest {
    /// Returns a builder for constructing requests.
    #[must_use]
    pub fn builder() -> ServerRequestBuilder {
        ServerRequestBuilder::default()
    }

    /// Returns the request identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the query string if present.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a specific header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the request body.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Returns the fully buffered body bytes, if the body is complete.
    #[must_use]
    pub fn body_bytes(&self) -> Option<&Bytes> {
        match &self.body {
            Body::Complete(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Takes the raw chunk stream if the body is streaming and not yet
    /// claimed.
    #[must_use]
    pub fn take_chunks(&self) -> Option<impl Stream<Item = ChunkResult> + Send> {
        match &self.body {
            Body::Streaming(chunks) => chunks.take(),
            _ => None,
        }
    }

    /// Returns the multiplexed part-event source for multipart uploads.
    #[must_use]
    pub fn uploads(&self) -> &UploadObserver {
        &self.uploads
    }
}

/// Builder for [`ServerRequest`].
#[derive(Debug, Default)]
pub struct ServerRequestBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Body,
    uploads: Option<UploadObserver>,
}

impl ServerRequestBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI.
    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Adds a single header.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets all headers at once.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets a fully buffered body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Body::Complete(body.into());
        self
    }

    /// Sets a streaming body.
    #[must_use]
    pub fn streaming_body(
        mut self,
        stream: impl Stream<Item = ChunkResult> + Send + 'static,
    ) -> Self {
        self.body = Body::Streaming(BodyChunks::new(stream));
        self
    }

    /// Sets the upload observer.
    #[must_use]
    pub fn uploads(mut self, uploads: UploadObserver) -> Self {
        self.uploads = Some(uploads);
        self
    }

    /// Builds the request.
    ///
    /// # Panics
    ///
    /// Panics if method or uri were not set.
    #[must_use]
    pub fn build(self) -> ServerRequest {
        ServerRequest {
            id: Uuid::now_v7(),
            method: self.method.expect("method is required"),
            uri: self.uri.expect("uri is required"),
            headers: self.headers,
            body: self.body,
            uploads: self.uploads.unwrap_or_default(),
        }
    }
}
