//! # trellis-core
//!
//! Core model of the Trellis HTTP compatibility layer.
//!
//! This crate has minimal dependencies and is what host adapters and handler
//! libraries import. The response primitives, error dispatcher and cookie
//! helpers live in `trellis-std`.
//!
//! # Model
//!
//! ## Host primitives ([`Request`], [`Response`])
//!
//! The raw pair a host transport hands over and later flushes. Parsing,
//! sockets and TLS stay on the host's side.
//!
//! ## Event ([`Event`])
//!
//! One value per exchange, bundling the request, the response and an
//! optional continuation. [`EventRequest`] and [`EventResponse`] let code
//! written against the two-argument style reach the event and each other.
//!
//! ## Handlers ([`EventHandler`], [`normalize`])
//!
//! Event, classic and middleware handlers are adapted once, at registration,
//! into a single [`EventHandler`] invoked with an [`Event`]. Their outputs
//! become a [`Reply`] through [`IntoReply`].
//!
//! # Error Types
//!
//! - [`HttpError`] - Failure with status code, status message and payload
//! - [`ErrorInput`] - Partial failure description merged by [`create_error`]
//! - [`ResponseError`] - Failures of the response primitives

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;
mod event;
mod exchange;
mod handler;
mod reply;

// Re-exports
pub use error::{
    BoxError, DEFAULT_STATUS_MESSAGE, ErrorInput, HttpError, ResponseError, create_error,
    to_http_error,
};
pub use event::{Event, EventRequest, EventResponse, Next, create_event};
pub use exchange::{Request, Response, StatusMessage};
pub use handler::{
    ClassicArgs, EventArgs, EventHandler, HandlerFuture, HandlerShape, IntoEventHandler,
    MiddlewareArgs, Normalized, define_event_handler, is_normalized, normalize, sync_handler,
};
pub use reply::{BodyStream, IntoReply, Json, Reply, body_stream};

pub use bytes;
pub use http;
