//! # Handler Normalizer
//!
//! Handlers come in three calling conventions:
//!
//! | Shape                        | Signature                                          |
//! |------------------------------|----------------------------------------------------|
//! | [`HandlerShape::Event`]      | `Fn(Event) -> Fut`                                 |
//! | [`HandlerShape::Classic`]    | `Fn(EventRequest, EventResponse) -> Fut`           |
//! | [`HandlerShape::Middleware`] | `Fn(EventRequest, EventResponse, Next) -> Fut`     |
//!
//! [`normalize`] erases the difference: every shape becomes an
//! [`EventHandler`] that is invoked with a single [`Event`]. The shape is
//! picked once, at registration, from the closure's parameter list; a
//! handler taking a continuation is always treated as middleware, whether or
//! not it ever calls it.
//!
//! Normalizing an [`EventHandler`] again returns it unchanged.
//!
//! # Usage Patterns
//!
//! 1. **Event closure**: `normalize(|event: Event| async move { ... })`
//! 2. **Classic closure**: `normalize(|req: EventRequest, res: EventResponse| async move { ... })`
//! 3. **Middleware closure**: `normalize(|req: EventRequest, res: EventResponse, next: Next| async move { ... })`
//! 4. **Synchronous**: `sync_handler(|event: Event| "done")`

use crate::{
    error::BoxError,
    event::{Event, EventRequest, EventResponse, Next},
    reply::{IntoReply, Reply},
};
use futures::{FutureExt, future::BoxFuture};
use std::{fmt, future::Future, sync::Arc};

/// The future returned by a normalized handler.
pub type HandlerFuture = BoxFuture<'static, Result<Reply, BoxError>>;

/// The calling convention a handler was registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerShape {
    /// Receives the [`Event`].
    Event,
    /// Receives the request and response halves.
    Classic,
    /// Receives the request and response halves plus a continuation.
    Middleware,
}

/// A handler in normalized, single-event form.
///
/// Cheap to clone; clones share the wrapped handler.
#[derive(Clone)]
pub struct EventHandler {
    shape: HandlerShape,
    inner: Arc<dyn Fn(Event) -> HandlerFuture + Send + Sync>,
}

impl EventHandler {
    /// Wrap an already event-shaped function, tagging it with the shape it
    /// was adapted from.
    pub fn from_fn<F>(shape: HandlerShape, f: F) -> Self
    where
        F: Fn(Event) -> HandlerFuture + Send + Sync + 'static,
    {
        Self {
            shape,
            inner: Arc::new(f),
        }
    }

    /// The calling convention the handler was adapted from.
    pub fn shape(&self) -> HandlerShape {
        self.shape
    }

    /// Invoke the handler with an event.
    pub fn call(&self, event: Event) -> HandlerFuture {
        (self.inner)(event)
    }

    /// Whether two handlers share the same wrapped function.
    pub fn ptr_eq(a: &EventHandler, b: &EventHandler) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler")
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

/// Marker for handlers that receive the [`Event`].
#[derive(Debug)]
pub struct EventArgs;

/// Marker for handlers that receive `(request, response)`.
#[derive(Debug)]
pub struct ClassicArgs;

/// Marker for handlers that receive `(request, response, next)`.
#[derive(Debug)]
pub struct MiddlewareArgs;

/// Marker for handlers that are already normalized.
#[derive(Debug)]
pub struct Normalized;

/// Conversion of any supported handler shape into an [`EventHandler`].
///
/// `M` is a marker selecting the adapter; it is inferred from the closure's
/// parameter list and never needs to be written out.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a supported handler",
    label = "not `Fn(Event)`, `Fn(EventRequest, EventResponse)` or `Fn(EventRequest, EventResponse, Next)`",
    note = "Handlers must be async functions whose output implements `IntoReply`. Annotate closure parameter types."
)]
pub trait IntoEventHandler<M>: Send + Sync + 'static {
    /// Whether the value is already in normalized form.
    const NORMALIZED: bool = false;

    /// Adapt into the single-event form.
    fn into_event_handler(self) -> EventHandler;
}

impl IntoEventHandler<Normalized> for EventHandler {
    const NORMALIZED: bool = true;

    fn into_event_handler(self) -> EventHandler {
        self
    }
}

impl<F, Fut> IntoEventHandler<(EventArgs, Fut)> for F
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoReply,
{
    fn into_event_handler(self) -> EventHandler {
        EventHandler::from_fn(HandlerShape::Event, move |event| {
            let fut = (self)(event);
            async move { fut.await.into_reply() }.boxed()
        })
    }
}

impl<F, Fut> IntoEventHandler<(ClassicArgs, Fut)> for F
where
    F: Fn(EventRequest, EventResponse) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoReply,
{
    fn into_event_handler(self) -> EventHandler {
        EventHandler::from_fn(HandlerShape::Classic, move |event| {
            let fut = (self)(event.request(), event.response());
            async move { fut.await.into_reply() }.boxed()
        })
    }
}

impl<F, Fut> IntoEventHandler<(MiddlewareArgs, Fut)> for F
where
    F: Fn(EventRequest, EventResponse, Next) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoReply,
{
    fn into_event_handler(self) -> EventHandler {
        EventHandler::from_fn(HandlerShape::Middleware, move |event| {
            let next = event.continuation();
            let fut = (self)(event.request(), event.response(), next);
            async move { fut.await.into_reply() }.boxed()
        })
    }
}

/// Adapt a handler of any supported shape into an [`EventHandler`].
///
/// Idempotent: an `EventHandler` is returned unchanged.
pub fn normalize<H, M>(handler: H) -> EventHandler
where
    H: IntoEventHandler<M>,
{
    handler.into_event_handler()
}

/// Whether `handler` is already in normalized form.
pub fn is_normalized<H, M>(_handler: &H) -> bool
where
    H: IntoEventHandler<M>,
{
    H::NORMALIZED
}

/// Define an event-shaped handler.
pub fn define_event_handler<F, Fut>(handler: F) -> EventHandler
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoReply,
{
    normalize(handler)
}

/// Adapt a synchronous event-shaped function.
pub fn sync_handler<F, R>(handler: F) -> EventHandler
where
    F: Fn(Event) -> R + Send + Sync + 'static,
    R: IntoReply,
{
    EventHandler::from_fn(HandlerShape::Event, move |event| {
        futures::future::ready((handler)(event).into_reply()).boxed()
    })
}
