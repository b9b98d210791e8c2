//! Reply conversion traits.

use crate::error::BoxError;
use bytes::Bytes;
use futures::{Stream, StreamExt, stream::BoxStream};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A boxed stream of body chunks.
pub type BodyStream = BoxStream<'static, Result<Bytes, BoxError>>;

/// Box any chunk producer into a [`BodyStream`].
///
/// Any `futures::Stream` of fallible byte chunks qualifies; the concrete
/// producer type does not matter.
pub fn body_stream<S, B, E>(stream: S) -> BodyStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: Into<Bytes>,
    E: Into<BoxError>,
{
    stream
        .map(|item: Result<B, E>| -> Result<Bytes, BoxError> {
            item.map(Into::into).map_err(Into::into)
        })
        .boxed()
}

/// What a handler produced.
pub enum Reply {
    /// Nothing; the handler either finalized the response itself or left it
    /// for the host.
    Empty,
    /// Plain text.
    Text(String),
    /// An HTML document. Plain string returns land here.
    Html(String),
    /// A JSON document.
    Json(Value),
    /// Raw bytes.
    Bytes(Bytes),
    /// A chunk stream to pipe into the response.
    Stream(BodyStream),
}

impl Reply {
    /// Whether this reply carries a stream.
    pub fn is_stream(&self) -> bool {
        matches!(self, Reply::Stream(_))
    }

    /// Whether this reply carries nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, Reply::Empty)
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Empty => f.write_str("Empty"),
            Reply::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Reply::Html(html) => f.debug_tuple("Html").field(html).finish(),
            Reply::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Reply::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            Reply::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Serializes the wrapped value as a JSON reply.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

/// Trait for converting a handler's output into a [`Reply`].
///
/// # Default Implementations
///
/// - `()` → `Empty`
/// - `String` / `&'static str` → `Html`
/// - `serde_json::Value`, [`Json<T>`] → `Json`
/// - `Bytes` / `Vec<u8>` → `Bytes`
/// - [`BodyStream`] → `Stream`
/// - `Option<T>` → `None` is `Empty`
/// - `Result<T, E>` → Delegates to inner `T` or propagates the error
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `IntoReply`",
    label = "missing `IntoReply` implementation",
    note = "Handler outputs must convert into a `Reply`."
)]
pub trait IntoReply {
    /// Convert the output into a reply or a failure.
    fn into_reply(self) -> Result<Reply, BoxError>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Reply, BoxError> {
        Ok(self)
    }
}

impl IntoReply for () {
    fn into_reply(self) -> Result<Reply, BoxError> {
        Ok(Reply::Empty)
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Result<Reply, BoxError> {
        Ok(Reply::Html(self))
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Result<Reply, BoxError> {
        Ok(Reply::Html(self.to_owned()))
    }
}

impl IntoReply for Value {
    fn into_reply(self) -> Result<Reply, BoxError> {
        Ok(Reply::Json(self))
    }
}

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> Result<Reply, BoxError> {
        Ok(Reply::Json(serde_json::to_value(self.0)?))
    }
}

impl IntoReply for Bytes {
    fn into_reply(self) -> Result<Reply, BoxError> {
        Ok(Reply::Bytes(self))
    }
}

impl IntoReply for Vec<u8> {
    fn into_reply(self) -> Result<Reply, BoxError> {
        Ok(Reply::Bytes(Bytes::from(self)))
    }
}

impl IntoReply for BodyStream {
    fn into_reply(self) -> Result<Reply, BoxError> {
        Ok(Reply::Stream(self))
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Result<Reply, BoxError> {
        match self {
            Some(t) => t.into_reply(),
            None => Ok(Reply::Empty),
        }
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<BoxError>,
{
    fn into_reply(self) -> Result<Reply, BoxError> {
        match self {
            Ok(t) => t.into_reply(),
            Err(e) => Err(e.into()),
        }
    }
}
