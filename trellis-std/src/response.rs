//! Response primitives.
//!
//! Low-level operations that finish a response: buffered [`send`], streamed
//! [`send_stream`], [`send_redirect`] and the header helpers.
//!
//! # Deferred finalize
//!
//! [`send`] applies its default content type right away but only finalizes
//! the response after yielding once to the scheduler. Header writes made
//! between calling `send` and the finalize still land in the response:
//!
//! ```rust,ignore
//! let pending = send(&event, "<p>ok</p>", Some(mime::HTML));
//! set_header(&event, "cache-control", "no-store")?; // still applied
//! pending.await?;
//! ```

use crate::mime;
use bytes::Bytes;
use futures::{
    Stream, StreamExt,
    future::{self, Either},
};
use http::{
    HeaderName, HeaderValue, StatusCode,
    header::{CONTENT_TYPE, LOCATION},
};
use serde::Serialize;
use std::future::Future;
use trellis_core::{BoxError, Event, HttpError, Reply, ResponseError, body_stream, to_http_error};

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), ResponseError> {
    let name = HeaderName::from_bytes(name.as_bytes())?;
    let value = HeaderValue::from_str(value).map_err(|source| ResponseError::InvalidHeaderValue {
        name: name.to_string(),
        source,
    })?;
    Ok((name, value))
}

/// Set `Content-Type` unless the handler already set one.
pub fn default_content_type(event: &Event, content_type: &str) -> Result<(), ResponseError> {
    let (name, value) = parse_header(CONTENT_TYPE.as_str(), content_type)?;
    event.with_response(|res| {
        if !res.headers().contains_key(&name) {
            res.headers_mut().insert(name, value);
        }
    });
    Ok(())
}

/// Set a header, replacing any previous values.
pub fn set_header(event: &Event, name: &str, value: &str) -> Result<(), ResponseError> {
    let (name, value) = parse_header(name, value)?;
    event.with_response(|res| {
        if res.is_finalized() {
            return Err(ResponseError::Finalized);
        }
        res.headers_mut().insert(name, value);
        Ok(())
    })
}

/// Add a header value without overwriting earlier ones.
///
/// An unset header gets the single value; a header that already has values
/// keeps them, in order, and gains `value` at the end.
pub fn append_header(event: &Event, name: &str, value: &str) -> Result<(), ResponseError> {
    let (name, value) = parse_header(name, value)?;
    event.with_response(|res| {
        if res.is_finalized() {
            return Err(ResponseError::Finalized);
        }
        res.headers_mut().append(name, value);
        Ok(())
    })
}

/// Write `data` and finalize the response.
///
/// `content_type` is applied immediately, and only if no content type is set.
/// The write itself happens after one yield to the scheduler, when the
/// returned future is driven.
pub fn send(
    event: &Event,
    data: impl Into<Bytes>,
    content_type: Option<&str>,
) -> impl Future<Output = Result<(), ResponseError>> + Send + 'static {
    let typed = match content_type {
        Some(content_type) => default_content_type(event, content_type),
        None => Ok(()),
    };
    let event = event.clone();
    let data = data.into();
    async move {
        typed?;
        tokio::task::yield_now().await;
        event.with_response(|res| res.end(Some(data)))
    }
}

/// Serialize `value` and send it with a JSON content type.
pub fn send_json<T: Serialize + ?Sized>(
    event: &Event,
    value: &T,
) -> impl Future<Output = Result<(), ResponseError>> + Send + 'static {
    match serde_json::to_vec(value) {
        Ok(body) => Either::Left(send(event, body, Some(mime::JSON))),
        Err(err) => Either::Right(future::ready(Err(ResponseError::from(err)))),
    }
}

/// Redirect with `302 Found`.
pub fn send_redirect(
    event: &Event,
    location: &str,
) -> impl Future<Output = Result<(), ResponseError>> + Send + 'static {
    send_redirect_with_status(event, location, StatusCode::FOUND)
}

/// Redirect with the given status.
///
/// Sets the status and `Location`, and sends a short HTML body. An invalid
/// `location` fails without touching the response.
pub fn send_redirect_with_status(
    event: &Event,
    location: &str,
    code: StatusCode,
) -> impl Future<Output = Result<(), ResponseError>> + Send + 'static {
    let located = parse_header(LOCATION.as_str(), location).and_then(|(name, value)| {
        event.with_response(|res| {
            if res.is_finalized() {
                return Err(ResponseError::Finalized);
            }
            res.set_status(code);
            res.headers_mut().insert(name, value);
            Ok(())
        })
    });
    match located {
        Ok(()) => Either::Left(send(
            event,
            format!("Redirecting to {location}"),
            Some(mime::HTML),
        )),
        Err(err) => Either::Right(future::ready(Err(err))),
    }
}

/// Whether a reply carries a stream.
pub fn is_stream(reply: &Reply) -> bool {
    reply.is_stream()
}

/// Pipe a chunk stream into the response and finalize it at end of stream.
///
/// A stream failure is coerced into an [`HttpError`] and the response is left
/// open so the error dispatcher can still answer.
pub fn send_stream<S, B, E>(
    event: &Event,
    stream: S,
) -> impl Future<Output = Result<(), HttpError>> + Send + 'static
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: Into<Bytes>,
    E: Into<BoxError>,
{
    let event = event.clone();
    let mut stream = body_stream(stream);
    async move {
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => event.with_response(|res| res.write(chunk))?,
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(error = %err, "body stream failed");
                    return Err(to_http_error(err));
                }
            }
        }
        event.with_response(|res| res.end(None))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestExchange, body_text, response_header_values};
    use futures::stream;

    #[tokio::test]
    async fn test_send_defers_finalize() {
        let event = TestExchange::get("/").build();

        let pending = send(&event, "hello", Some(mime::HTML));
        assert!(!event.is_finalized());
        set_header(&event, "x-late", "yes").unwrap();
        pending.await.unwrap();

        assert!(event.is_finalized());
        assert_eq!(body_text(&event), "hello");
        assert_eq!(event.response_header("x-late").unwrap(), "yes");
        assert_eq!(event.response_header(CONTENT_TYPE).unwrap(), mime::HTML);
    }

    #[tokio::test]
    async fn test_send_keeps_existing_content_type() {
        let event = TestExchange::get("/").build();
        set_header(&event, "content-type", "text/csv").unwrap();

        send(&event, "a,b", Some(mime::HTML)).await.unwrap();

        assert_eq!(event.response_header(CONTENT_TYPE).unwrap(), "text/csv");
    }

    #[test]
    fn test_append_header_preserves_order() {
        let event = TestExchange::get("/").build();
        append_header(&event, "x-trace", "first").unwrap();
        append_header(&event, "x-trace", "second").unwrap();

        assert_eq!(
            response_header_values(&event, "x-trace"),
            vec!["first".to_owned(), "second".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_append_after_finalize_fails() {
        let event = TestExchange::get("/").build();
        send(&event, "", None).await.unwrap();
        assert!(matches!(
            append_header(&event, "x-trace", "late"),
            Err(ResponseError::Finalized)
        ));
    }

    #[tokio::test]
    async fn test_send_stream_pipes_chunks() {
        let event = TestExchange::get("/").build();
        let chunks: Vec<Result<&'static str, std::io::Error>> = vec![Ok("one,"), Ok("two")];

        send_stream(&event, stream::iter(chunks)).await.unwrap();

        assert!(event.is_finalized());
        assert_eq!(body_text(&event), "one,two");
        assert_eq!(event.with_response(|res| res.chunks().len()), 2);
    }

    #[tokio::test]
    async fn test_send_stream_error_is_typed() {
        let event = TestExchange::get("/").build();
        let chunks: Vec<Result<&'static str, std::io::Error>> = vec![
            Ok("partial"),
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "upstream closed")),
        ];

        let err = send_stream(&event, stream::iter(chunks)).await.unwrap_err();

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "upstream closed");
        assert!(!event.is_finalized());
    }

    #[tokio::test]
    async fn test_invalid_redirect_leaves_response_untouched() {
        let event = TestExchange::get("/").build();

        let result = send_redirect(&event, "/next\nx-injected: 1").await;

        assert!(matches!(result, Err(ResponseError::InvalidHeaderValue { .. })));
        assert_eq!(event.status(), StatusCode::OK);
        assert!(event.response_header(LOCATION).is_none());
        assert!(!event.is_finalized());
    }

    #[tokio::test]
    async fn test_send_json() {
        let event = TestExchange::get("/").build();
        send_json(&event, &serde_json::json!({ "ok": true })).await.unwrap();
        assert_eq!(body_text(&event), r#"{"ok":true}"#);
        assert_eq!(event.response_header(CONTENT_TYPE).unwrap(), mime::JSON);
    }
}
