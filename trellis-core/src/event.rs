//! # Event Model
//!
//! An [`Event`] bundles one in-flight exchange: the raw [`Request`], the raw
//! [`Response`] and, for middleware-style handlers, a continuation ([`Next`]).
//!
//! # Navigation
//!
//! Normalized handlers receive the `Event` itself. Classic and middleware
//! handlers receive an [`EventRequest`] / [`EventResponse`] pair instead,
//! and both halves can reach the event and each other:
//!
//! ```rust,ignore
//! let handler = normalize(|req: EventRequest, res: EventResponse| async move {
//!     let event = req.event();              // request -> event
//!     assert!(Event::ptr_eq(&event, &res.event()));
//!     let same_res = req.response();        // request -> response
//!     same_res.set_status(StatusCode::ACCEPTED);
//! });
//! ```
//!
//! All handles share the exchange through an `Arc`, so nothing is mutated
//! behind the caller's back to make this work. Exactly one handler chain
//! drives an exchange at a time; the locks only guard short, non-async
//! sections.

use crate::{
    error::{HttpError, ResponseError},
    exchange::{Request, Response},
};
use bytes::Bytes;
use http::{
    HeaderValue, Method, StatusCode, Uri,
    header::{AsHeaderName, HeaderName},
};
use std::{
    fmt,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A continuation handed to middleware-style handlers.
///
/// Calling it with `None` asks the host to continue with the next handler;
/// calling it with an error hands the failure back to the host.
#[derive(Clone)]
pub struct Next(Arc<dyn Fn(Option<HttpError>) + Send + Sync>);

impl Next {
    /// Wrap a callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<HttpError>) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// A continuation that does nothing.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Invoke the continuation.
    pub fn call(&self, err: Option<HttpError>) {
        (self.0)(err)
    }

    /// Continue without error.
    pub fn proceed(&self) {
        self.call(None)
    }

    /// Continue with an error.
    pub fn fail(&self, err: impl Into<HttpError>) {
        self.call(Some(err.into()))
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Next(..)")
    }
}

struct Exchange {
    request: Mutex<Request>,
    response: Mutex<Response>,
    host_next: Mutex<Option<Next>>,
    next_called: AtomicBool,
    next_error: Mutex<Option<HttpError>>,
}

/// One in-flight exchange.
///
/// Cloning an `Event` is cheap and every clone refers to the same exchange;
/// use [`Event::ptr_eq`] to check identity.
#[derive(Clone)]
pub struct Event {
    exchange: Arc<Exchange>,
}

/// Wrap a raw request/response pair into an [`Event`].
pub fn create_event(request: Request, response: Response) -> Event {
    Event::new(request, response)
}

impl Event {
    /// Wrap a raw request/response pair.
    pub fn new(request: Request, response: Response) -> Self {
        Self {
            exchange: Arc::new(Exchange {
                request: Mutex::new(request),
                response: Mutex::new(response),
                host_next: Mutex::new(None),
                next_called: AtomicBool::new(false),
                next_error: Mutex::new(None),
            }),
        }
    }

    /// Attach the host's continuation.
    pub fn with_next(self, next: Next) -> Self {
        self.set_next(next);
        self
    }

    /// Attach or replace the host's continuation.
    pub fn set_next(&self, next: Next) {
        *lock(&self.exchange.host_next) = Some(next);
    }

    /// Whether two handles refer to the same exchange.
    pub fn ptr_eq(a: &Event, b: &Event) -> bool {
        Arc::ptr_eq(&a.exchange, &b.exchange)
    }

    /// The request half of the compatibility facade.
    pub fn request(&self) -> EventRequest {
        EventRequest {
            event: self.clone(),
        }
    }

    /// The response half of the compatibility facade.
    pub fn response(&self) -> EventResponse {
        EventResponse {
            event: self.clone(),
        }
    }

    /// Run `f` with the raw request.
    ///
    /// Do not call back into the same `Event` from inside `f`.
    pub fn with_request<R>(&self, f: impl FnOnce(&mut Request) -> R) -> R {
        f(&mut lock(&self.exchange.request))
    }

    /// Run `f` with the raw response.
    ///
    /// Do not call back into the same `Event` from inside `f`.
    pub fn with_response<R>(&self, f: impl FnOnce(&mut Response) -> R) -> R {
        f(&mut lock(&self.exchange.response))
    }

    /// The request method.
    pub fn method(&self) -> Method {
        self.with_request(|req| req.method().clone())
    }

    /// The request target.
    pub fn uri(&self) -> Uri {
        self.with_request(|req| req.uri().clone())
    }

    /// First value of a request header.
    pub fn request_header<K: AsHeaderName>(&self, name: K) -> Option<HeaderValue> {
        self.with_request(|req| req.header(name).cloned())
    }

    /// First value of a response header.
    pub fn response_header<K: AsHeaderName>(&self, name: K) -> Option<HeaderValue> {
        self.with_response(|res| res.header(name).cloned())
    }

    /// The response status.
    pub fn status(&self) -> StatusCode {
        self.with_response(|res| res.status())
    }

    /// Set the response status.
    pub fn set_status(&self, status: StatusCode) {
        self.with_response(|res| res.set_status(status))
    }

    /// Whether the response has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.with_response(|res| res.is_finalized())
    }

    /// Build the continuation passed to a middleware-style handler.
    ///
    /// The returned [`Next`] records the call on this event and then forwards
    /// to the host's continuation, if one was attached.
    pub fn continuation(&self) -> Next {
        let exchange: Weak<Exchange> = Arc::downgrade(&self.exchange);
        Next::new(move |err| {
            let Some(exchange) = exchange.upgrade() else {
                return;
            };
            exchange.next_called.store(true, Ordering::SeqCst);
            let host = lock(&exchange.host_next).clone();
            match host {
                Some(next) => next.call(err),
                None => *lock(&exchange.next_error) = err,
            }
        })
    }

    /// Whether a middleware handler invoked its continuation.
    pub fn next_called(&self) -> bool {
        self.exchange.next_called.load(Ordering::SeqCst)
    }

    /// The error a middleware handler passed to its continuation, when no
    /// host continuation was attached to receive it.
    pub fn take_next_error(&self) -> Option<HttpError> {
        lock(&self.exchange.next_error).take()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (method, uri) = self.with_request(|req| (req.method().clone(), req.uri().clone()));
        let (status, finalized) = self.with_response(|res| (res.status(), res.is_finalized()));
        f.debug_struct("Event")
            .field("method", &method)
            .field("uri", &uri)
            .field("status", &status)
            .field("finalized", &finalized)
            .finish()
    }
}

/// The request side of an exchange, as seen by classic and middleware handlers.
#[derive(Clone, Debug)]
pub struct EventRequest {
    event: Event,
}

impl EventRequest {
    /// The owning event.
    pub fn event(&self) -> Event {
        self.event.clone()
    }

    /// The response of the same exchange.
    pub fn response(&self) -> EventResponse {
        self.event.response()
    }

    /// The request method.
    pub fn method(&self) -> Method {
        self.event.method()
    }

    /// The request target.
    pub fn uri(&self) -> Uri {
        self.event.uri()
    }

    /// First value of a header.
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<HeaderValue> {
        self.event.request_header(name)
    }

    /// The buffered body.
    pub fn body(&self) -> Bytes {
        self.event.with_request(|req| req.body().clone())
    }

    /// Run `f` with the raw request.
    pub fn with<R>(&self, f: impl FnOnce(&mut Request) -> R) -> R {
        self.event.with_request(f)
    }
}

/// The response side of an exchange, as seen by classic and middleware handlers.
#[derive(Clone, Debug)]
pub struct EventResponse {
    event: Event,
}

impl EventResponse {
    /// The owning event.
    pub fn event(&self) -> Event {
        self.event.clone()
    }

    /// The request of the same exchange.
    pub fn request(&self) -> EventRequest {
        self.event.request()
    }

    /// The status code.
    pub fn status(&self) -> StatusCode {
        self.event.status()
    }

    /// Set the status code.
    pub fn set_status(&self, status: StatusCode) {
        self.event.set_status(status)
    }

    /// First value of a header.
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<HeaderValue> {
        self.event.response_header(name)
    }

    /// Set a header, replacing previous values.
    ///
    /// Fails with [`ResponseError::Finalized`] once the response has ended.
    pub fn set_header(&self, name: &str, value: &str) -> Result<(), ResponseError> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value =
            HeaderValue::from_str(value).map_err(|source| ResponseError::InvalidHeaderValue {
                name: name.to_string(),
                source,
            })?;
        self.event.with_response(|res| {
            if res.is_finalized() {
                return Err(ResponseError::Finalized);
            }
            res.headers_mut().insert(name, value);
            Ok(())
        })
    }

    /// Append a body chunk.
    pub fn write(&self, chunk: impl Into<Bytes>) -> Result<(), ResponseError> {
        let chunk = chunk.into();
        self.event.with_response(|res| res.write(chunk))
    }

    /// Write an optional last chunk and finalize.
    pub fn end(&self, chunk: Option<Bytes>) -> Result<(), ResponseError> {
        self.event.with_response(|res| res.end(chunk))
    }

    /// Whether the response has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.event.is_finalized()
    }

    /// Run `f` with the raw response.
    pub fn with<R>(&self, f: impl FnOnce(&mut Response) -> R) -> R {
        self.event.with_response(f)
    }
}
