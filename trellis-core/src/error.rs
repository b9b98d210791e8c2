//! Error types for Trellis.
//!
//! This module provides the error taxonomy of the compatibility layer:
//!
//! - [`HttpError`] - A failure carrying HTTP semantics (status, message, payload)
//! - [`ErrorInput`] - A partial description of a failure, merged by [`create_error`]
//! - [`ResponseError`] - Failures of the response primitives themselves
//!
//! Every failure a handler produces ends up as an [`HttpError`] before it
//! reaches the client. Use [`to_http_error`] to coerce an arbitrary
//! [`BoxError`] into one.

use http::StatusCode;
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Status message used when nothing more specific is known.
pub const DEFAULT_STATUS_MESSAGE: &str = "Internal Server Error";

/// A failure with HTTP semantics.
///
/// Carries a status code (default `500`), a status message (default
/// [`DEFAULT_STATUS_MESSAGE`]), an optional structured payload for the client
/// and an optional trace text that is only ever exposed in debug mode.
///
/// # Example
///
/// ```rust,ignore
/// return Err(HttpError::not_found()
///     .with_message("no such user")
///     .with_data(json!({ "id": id })));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct HttpError {
    status_code: StatusCode,
    status_message: String,
    message: String,
    data: Option<Value>,
    stack: Option<String>,
}

impl Default for HttpError {
    fn default() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl HttpError {
    /// Create an error for the given status.
    ///
    /// The status message starts as the generic [`DEFAULT_STATUS_MESSAGE`]
    /// for `500`, and as the canonical reason phrase for any other status.
    pub fn new(status_code: StatusCode) -> Self {
        let status_message = if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            DEFAULT_STATUS_MESSAGE.to_owned()
        } else {
            status_code.canonical_reason().unwrap_or_default().to_owned()
        };
        Self {
            status_code,
            message: status_message.clone(),
            status_message,
            data: None,
            stack: None,
        }
    }

    /// `400 Bad Request`.
    pub fn bad_request() -> Self {
        Self::new(StatusCode::BAD_REQUEST)
    }

    /// `401 Unauthorized`.
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED)
    }

    /// `403 Forbidden`.
    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN)
    }

    /// `404 Not Found`.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    /// `405 Method Not Allowed`.
    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED)
    }

    /// `500 Internal Server Error`.
    pub fn internal() -> Self {
        Self::default()
    }

    /// Build an error from any other failure.
    ///
    /// The message is the failure's `Display` output, the status stays `500`
    /// and the trace text records the `source()` chain, one cause per line.
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        let message = err.to_string();
        let mut stack = format!("Error: {message}");
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push_str("\n    caused by: ");
            stack.push_str(&cause.to_string());
            source = cause.source();
        }
        Self {
            message,
            stack: Some(stack),
            ..Self::default()
        }
    }

    /// Replace the status code.
    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status_code = status_code;
        self
    }

    /// Replace the status message sent on the status line and in the body.
    pub fn with_status_message(mut self, status_message: impl Into<String>) -> Self {
        self.status_message = status_message.into();
        self
    }

    /// Replace the human readable message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach a structured payload for the client.
    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Attach trace text. Only exposed to clients in debug mode.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// The HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// The HTTP status message.
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// The human readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The client payload, if any.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// The raw trace text, if any.
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    /// The trace split into trimmed lines.
    ///
    /// Errors without captured trace text yield a single summary line.
    pub fn stack_lines(&self) -> Vec<String> {
        match &self.stack {
            Some(stack) => stack.lines().map(|line| line.trim().to_owned()).collect(),
            None => vec![format!("HttpError: {}", self.message)],
        }
    }
}

/// A partial description of a failure.
///
/// Only the fields that are present override the defaults of [`HttpError`];
/// see [`create_error`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorInput {
    /// Human readable message.
    pub message: Option<String>,
    /// Numeric status code. Values that are not valid HTTP statuses are ignored.
    pub status_code: Option<u16>,
    /// Status message.
    pub status_message: Option<String>,
    /// Client payload.
    pub data: Option<Value>,
}

impl ErrorInput {
    /// Create an empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the status code.
    pub fn status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Set the status message.
    pub fn status_message(mut self, status_message: impl Into<String>) -> Self {
        self.status_message = Some(status_message.into());
        self
    }

    /// Set the payload.
    pub fn data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }
}

impl fmt::Display for ErrorInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .message
            .as_deref()
            .or(self.status_message.as_deref())
            .unwrap_or(DEFAULT_STATUS_MESSAGE);
        f.write_str(text)
    }
}

impl StdError for ErrorInput {}

impl From<ErrorInput> for HttpError {
    fn from(input: ErrorInput) -> Self {
        create_error(input)
    }
}

/// Merge a partial input into a fresh [`HttpError`].
///
/// The message comes from `message`, falling back to `status_message`.
/// `status_code`, `status_message` and `data` are copied only when present;
/// everything else keeps the defaults (`500`, generic message, no payload).
pub fn create_error(input: ErrorInput) -> HttpError {
    let mut err = HttpError::default();

    if let Some(message) = input.message.as_ref().or(input.status_message.as_ref()) {
        err.message = message.clone();
    }

    if let Some(status_code) = input
        .status_code
        .and_then(|code| StatusCode::from_u16(code).ok())
    {
        err.status_code = status_code;
    }

    if let Some(status_message) = input.status_message {
        err.status_message = status_message;
    }

    if let Some(data) = input.data {
        err.data = Some(data);
    }

    err
}

/// Coerce any boxed failure into an [`HttpError`].
///
/// An `HttpError` is unboxed and returned as is. An [`ErrorInput`] is merged
/// with [`create_error`]. Anything else goes through [`HttpError::from_error`].
pub fn to_http_error(err: BoxError) -> HttpError {
    match err.downcast::<HttpError>() {
        Ok(http) => *http,
        Err(err) => match err.downcast::<ErrorInput>() {
            Ok(input) => create_error(*input),
            Err(err) => HttpError::from_error(&*err),
        },
    }
}

/// Errors raised by the response primitives.
#[derive(Error, Debug)]
pub enum ResponseError {
    /// The response was already finalized; no further writes are valid.
    #[error("response has already been finalized")]
    Finalized,

    /// The response has not been finalized yet.
    #[error("response has not been finalized")]
    Pending,

    /// A header name could not be parsed.
    #[error("invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    /// A header value could not be parsed.
    #[error("invalid value for header {name}")]
    InvalidHeaderValue {
        /// The header being written.
        name: String,
        /// The underlying parse failure.
        #[source]
        source: http::header::InvalidHeaderValue,
    },

    /// A body could not be serialized.
    #[error("failed to serialize body: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<ResponseError> for HttpError {
    fn from(err: ResponseError) -> Self {
        HttpError::from_error(&err)
    }
}
