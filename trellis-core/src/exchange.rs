//! Raw host primitives.
//!
//! [`Request`] and [`Response`] are the minimal request/response pair a host
//! transport fills in and drains. Everything above this module talks to them
//! through an [`Event`](crate::Event).

use crate::error::ResponseError;
use bytes::{Bytes, BytesMut};
use http::{
    HeaderMap, HeaderValue, Method, StatusCode, Uri,
    header::{AsHeaderName, HeaderName},
};

/// An incoming request as handed over by the host.
#[derive(Debug, Clone, Default)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    /// Create a request with no headers and an empty body.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            ..Self::default()
        }
    }

    /// Add a header, keeping any previous values for the same name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replace the buffered body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request target.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// All request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the request headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// First value of a header.
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    /// The buffered body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        }
    }
}

/// An outgoing response being built for the host.
///
/// Once [`end`](Response::end) has been called the response is finalized and
/// every further write fails with [`ResponseError::Finalized`].
#[derive(Debug, Default)]
pub struct Response {
    status: StatusCode,
    status_message: Option<String>,
    headers: HeaderMap,
    chunks: Vec<Bytes>,
    finalized: bool,
}

impl Response {
    /// Create an empty `200 OK` response.
    pub fn new() -> Self {
        Self::default()
    }

    /// The status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Set the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// The status message: the explicit override, or the canonical reason phrase.
    pub fn status_message(&self) -> &str {
        match &self.status_message {
            Some(message) => message,
            None => self.status.canonical_reason().unwrap_or_default(),
        }
    }

    /// Override the status message.
    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// All response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// First value of a header.
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    /// Append a body chunk.
    pub fn write(&mut self, chunk: impl Into<Bytes>) -> Result<(), ResponseError> {
        if self.finalized {
            return Err(ResponseError::Finalized);
        }
        let chunk = chunk.into();
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
        Ok(())
    }

    /// Write an optional last chunk and finalize the response.
    pub fn end(&mut self, chunk: Option<Bytes>) -> Result<(), ResponseError> {
        if let Some(chunk) = chunk {
            self.write(chunk)?;
        }
        if self.finalized {
            return Err(ResponseError::Finalized);
        }
        self.finalized = true;
        Ok(())
    }

    /// Whether the response has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// The body chunks written so far, in order.
    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }

    /// Discard the body chunks written so far.
    pub fn clear_body(&mut self) -> Result<(), ResponseError> {
        if self.finalized {
            return Err(ResponseError::Finalized);
        }
        self.chunks.clear();
        Ok(())
    }

    /// The body written so far as one buffer.
    pub fn body(&self) -> Bytes {
        match self.chunks.as_slice() {
            [] => Bytes::new(),
            [single] => single.clone(),
            chunks => {
                let mut buf = BytesMut::with_capacity(chunks.iter().map(Bytes::len).sum());
                for chunk in chunks {
                    buf.extend_from_slice(chunk);
                }
                buf.freeze()
            }
        }
    }

    /// Convert a finalized response into an `http::Response` for the host to flush.
    ///
    /// `http::Response` has no reason phrase; an overridden status message is
    /// carried as a [`StatusMessage`] extension.
    pub fn into_http(self) -> Result<http::Response<Bytes>, ResponseError> {
        if !self.finalized {
            return Err(ResponseError::Pending);
        }
        let body = self.body();
        let mut res = http::Response::new(body);
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        if let Some(message) = self.status_message {
            res.extensions_mut().insert(StatusMessage(message));
        }
        Ok(res)
    }
}

/// Custom status message of a converted response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_defaults_to_reason() {
        let mut res = Response::new();
        res.set_status(StatusCode::NOT_FOUND);
        assert_eq!(res.status_message(), "Not Found");
        res.set_status_message("Gone Fishing");
        assert_eq!(res.status_message(), "Gone Fishing");
    }

    #[test]
    fn test_write_after_end_fails() {
        let mut res = Response::new();
        res.write("a").unwrap();
        res.end(Some(Bytes::from_static(b"b"))).unwrap();
        assert!(res.is_finalized());
        assert_eq!(res.body(), Bytes::from_static(b"ab"));
        assert!(matches!(res.write("c"), Err(ResponseError::Finalized)));
        assert!(matches!(res.end(None), Err(ResponseError::Finalized)));
    }

    #[test]
    fn test_into_http_requires_finalize() {
        let res = Response::new();
        assert!(matches!(res.into_http(), Err(ResponseError::Pending)));

        let mut res = Response::new();
        res.set_status(StatusCode::CREATED);
        res.end(Some(Bytes::from_static(b"done"))).unwrap();
        let http = res.into_http().unwrap();
        assert_eq!(http.status(), StatusCode::CREATED);
        assert_eq!(http.body(), &Bytes::from_static(b"done"));
        assert!(http.extensions().get::<StatusMessage>().is_none());
    }

    #[test]
    fn test_into_http_carries_status_message() {
        let mut res = Response::new();
        res.set_status(StatusCode::BAD_REQUEST);
        res.set_status_message("Invalid Order");
        res.end(None).unwrap();
        let http = res.into_http().unwrap();
        assert_eq!(
            http.extensions().get::<StatusMessage>(),
            Some(&StatusMessage("Invalid Order".to_owned()))
        );
    }

    #[test]
    fn test_clear_body() {
        let mut res = Response::new();
        res.write("partial").unwrap();
        res.clear_body().unwrap();
        assert!(res.chunks().is_empty());
        res.end(None).unwrap();
        assert!(matches!(res.clear_body(), Err(ResponseError::Finalized)));
    }

    #[test]
    fn test_request_from_http() {
        let req = http::Request::builder()
            .method(Method::POST)
            .uri("/submit")
            .header("x-id", "7")
            .body(Bytes::from_static(b"{}"))
            .unwrap();
        let req = Request::from(req);
        assert_eq!(req.method(), &Method::POST);
        assert_eq!(req.uri().path(), "/submit");
        assert_eq!(req.header("x-id").unwrap(), "7");
        assert_eq!(req.body(), &Bytes::from_static(b"{}"));
    }
}
