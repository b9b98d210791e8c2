//! # trellis - Uniform Handlers over a Host HTTP Runtime
//!
//! `trellis` sits between a host's raw request/response pair and handlers
//! written in any of three calling conventions. Every handler is adapted once
//! into an [`EventHandler`] invoked with a single [`Event`], and every failure
//! ends up as a JSON error body produced by one dispatcher.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trellis::prelude::*;
//!
//! // Any of the three shapes works.
//! let handler = normalize(|req: EventRequest, res: EventResponse| async move {
//!     res.set_status(StatusCode::CREATED);
//!     "<p>created</p>"
//! });
//!
//! // The host wraps its raw pair and lets trellis answer it.
//! let event = create_event(request, Response::new());
//! serve(&event, &handler, &ServeOptions::from_env()).await?;
//! let response = event.with_response(std::mem::take).into_http()?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use trellis_core::{
    // Error types
    BoxError,
    // Reply
    BodyStream,
    // Handler
    ClassicArgs,
    DEFAULT_STATUS_MESSAGE,
    ErrorInput,
    // Event
    Event,
    EventArgs,
    EventHandler,
    EventRequest,
    EventResponse,
    HandlerFuture,
    HandlerShape,
    HttpError,
    IntoEventHandler,
    IntoReply,
    Json,
    MiddlewareArgs,
    Next,
    Normalized,
    Reply,
    // Host primitives
    Request,
    Response,
    ResponseError,
    StatusMessage,
    body_stream,
    create_error,
    create_event,
    define_event_handler,
    is_normalized,
    normalize,
    sync_handler,
    to_http_error,
};

pub use trellis_core::{bytes, http};

// Standard building blocks
pub use trellis_std::{
    cookie::{CookieOptions, delete_cookie, set_cookie, use_cookie, use_cookies},
    dispatch::{ErrorBody, dispatch_error, send_error},
    logging::LoggingHandler,
    response::{
        append_header, default_content_type, is_stream, send, send_json, send_redirect,
        send_redirect_with_status, send_stream, set_header,
    },
    serve::{ServeOptions, serve, write_reply},
};

/// Content types used by the response helpers.
pub mod mime {
    pub use trellis_std::mime::{HTML, JSON, JSON_UTF8, OCTET_STREAM, TEXT};
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use trellis_std::testing::*;
}

/// Prelude module - common imports for Trellis.
///
/// # Usage
///
/// ```rust,ignore
/// use trellis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::http::StatusCode;
    pub use crate::{
        BoxError, CookieOptions, Event, EventHandler, EventRequest, EventResponse, HttpError,
        IntoReply, Json, Next, Reply, Request, Response, ServeOptions, append_header,
        create_error, create_event, delete_cookie, normalize, send, send_error, send_redirect,
        send_stream, serve, set_cookie, use_cookie, use_cookies,
    };
}
