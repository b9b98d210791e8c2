//! Testing utilities for Trellis.
//!
//! This module provides utilities to make testing handlers easier.
//!
//! # Features
//!
//! - [`TestExchange`]: Builds an [`Event`] around a synthetic request
//! - [`body_text`] / [`body_json`]: Read back what a handler wrote
//! - [`response_header_values`]: All values of a response header, in order
//! - [`RecordingNext`]: A host continuation that records every call

use http::{HeaderName, HeaderValue, Method, Uri};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use trellis_core::{Event, HttpError, Next, Request, Response, create_event};

// ============================================================================
// Exchange Builder
// ============================================================================

/// Builds an [`Event`] around a synthetic request.
///
/// # Example
///
/// ```rust,ignore
/// let event = TestExchange::get("/login")
///     .header("cookie", "session=abc")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct TestExchange {
    request: Request,
    next: Option<Next>,
}

impl TestExchange {
    /// Start a request with the given method and target.
    ///
    /// # Panics
    ///
    /// Panics if `uri` is not a valid request target.
    pub fn new(method: Method, uri: &str) -> Self {
        let uri: Uri = uri.parse().expect("test uri must be valid");
        Self {
            request: Request::new(method, uri),
            next: None,
        }
    }

    /// Start a `GET` request.
    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Start a `POST` request.
    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Add a request header.
    ///
    /// # Panics
    ///
    /// Panics if the name or value is not a valid header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name = HeaderName::from_bytes(name.as_bytes()).expect("test header name must be valid");
        let value = HeaderValue::from_str(value).expect("test header value must be valid");
        self.request = self.request.with_header(name, value);
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.request = self.request.with_body(body);
        self
    }

    /// Attach a host continuation.
    pub fn next(mut self, next: Next) -> Self {
        self.next = Some(next);
        self
    }

    /// Build the event with a fresh response.
    pub fn build(self) -> Event {
        let event = create_event(self.request, Response::new());
        if let Some(next) = self.next {
            event.set_next(next);
        }
        event
    }
}

// ============================================================================
// Response Inspection
// ============================================================================

/// The response body written so far, as UTF-8 text.
pub fn body_text(event: &Event) -> String {
    let body = event.with_response(|res| res.body());
    String::from_utf8_lossy(&body).into_owned()
}

/// The response body written so far, parsed as JSON.
pub fn body_json(event: &Event) -> Result<Value, serde_json::Error> {
    let body = event.with_response(|res| res.body());
    serde_json::from_slice(&body)
}

/// All values of a response header, in insertion order.
pub fn response_header_values(event: &Event, name: &str) -> Vec<String> {
    event.with_response(|res| {
        res.headers()
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect()
    })
}

// ============================================================================
// Recording Continuation
// ============================================================================

/// A host continuation that records every call.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingNext::new();
/// let event = TestExchange::get("/").next(recorder.next()).build();
///
/// handler.call(event).await?;
///
/// assert_eq!(recorder.count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct RecordingNext {
    calls: Arc<Mutex<Vec<Option<HttpError>>>>,
}

impl RecordingNext {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A continuation feeding this recorder.
    pub fn next(&self) -> Next {
        let calls = self.calls.clone();
        Next::new(move |err| calls.lock().unwrap().push(err))
    }

    /// Number of recorded calls.
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// The errors passed on each call, `None` for plain continues.
    pub fn calls(&self) -> Vec<Option<HttpError>> {
        self.calls.lock().unwrap().clone()
    }
}

impl std::fmt::Debug for RecordingNext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingNext")
            .field("count", &self.count())
            .finish()
    }
}
