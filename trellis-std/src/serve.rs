//! Exchange driver.
//!
//! [`serve`] runs one normalized handler against one exchange and makes sure
//! the exchange is answered: the handler's reply is written with a content
//! type matching its kind, and any failure goes through the error dispatcher.
//! It does not route or chain handlers.

use crate::{
    dispatch::send_error,
    mime,
    response::{send, send_stream},
};
use trellis_core::{BoxError, Event, EventHandler, Reply, ResponseError};

/// Environment variable read by [`ServeOptions::from_env`].
pub const DEBUG_ENV: &str = "TRELLIS_DEBUG";

/// Options for [`serve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServeOptions {
    /// Include trace lines in error bodies.
    pub debug: bool,
}

impl ServeOptions {
    /// Default options (debug off).
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn debug mode on or off.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Read options from the environment.
    ///
    /// `TRELLIS_DEBUG=1` or `TRELLIS_DEBUG=true` turns debug mode on.
    pub fn from_env() -> Self {
        let debug = std::env::var(DEBUG_ENV)
            .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true"))
            .unwrap_or(false);
        Self { debug }
    }
}

/// Write a handler's reply into the response.
///
/// Replies are ignored once the response is finalized; an empty reply leaves
/// the response as the handler left it.
pub async fn write_reply(event: &Event, reply: Reply) -> Result<(), BoxError> {
    if event.is_finalized() {
        return Ok(());
    }
    match reply {
        Reply::Empty => Ok(()),
        Reply::Text(text) => Ok(send(event, text, Some(mime::TEXT)).await?),
        Reply::Html(html) => Ok(send(event, html, Some(mime::HTML)).await?),
        Reply::Json(value) => {
            let body = serde_json::to_vec_pretty(&value)?;
            Ok(send(event, body, Some(mime::JSON)).await?)
        }
        Reply::Bytes(bytes) => Ok(send(event, bytes, Some(mime::OCTET_STREAM)).await?),
        Reply::Stream(stream) => Ok(send_stream(event, stream).await?),
    }
}

/// Run `handler` against `event` and answer the exchange.
///
/// Handler failures, reply failures and errors a middleware passed to its
/// continuation are dispatched as JSON error bodies.
/// The returned error only reports a failure of the dispatcher itself.
pub async fn serve(
    event: &Event,
    handler: &EventHandler,
    options: &ServeOptions,
) -> Result<(), ResponseError> {
    let outcome = match handler.call(event.clone()).await {
        Ok(reply) => write_reply(event, reply).await,
        Err(err) => Err(err),
    };

    // A failure handed to the continuation with no host to receive it.
    let outcome = match (outcome, event.take_next_error()) {
        (Ok(()), Some(err)) => Err(err.into()),
        (outcome, _) => outcome,
    };

    if let Err(err) = outcome {
        send_error(event, err, options.debug)?;
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        method = %event.method(),
        uri = %event.uri(),
        status = event.status().as_u16(),
        shape = ?handler.shape(),
        "exchange served"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestExchange, body_json, body_text};
    use http::{StatusCode, header::CONTENT_TYPE};
    use serde_json::json;
    use trellis_core::{HttpError, normalize};

    #[tokio::test]
    async fn test_string_reply_is_html() {
        let event = TestExchange::get("/").build();
        let handler = normalize(|_event: Event| async move { "<p>hi</p>" });

        serve(&event, &handler, &ServeOptions::new()).await.unwrap();

        assert_eq!(body_text(&event), "<p>hi</p>");
        assert_eq!(event.response_header(CONTENT_TYPE).unwrap(), mime::HTML);
    }

    #[tokio::test]
    async fn test_json_reply() {
        let event = TestExchange::get("/").build();
        let handler = normalize(|_event: Event| async move { json!({ "a": 1 }) });

        serve(&event, &handler, &ServeOptions::new()).await.unwrap();

        assert_eq!(body_json(&event).unwrap(), json!({ "a": 1 }));
        assert_eq!(event.response_header(CONTENT_TYPE).unwrap(), mime::JSON);
    }

    #[tokio::test]
    async fn test_handler_error_is_dispatched() {
        let event = TestExchange::get("/").build();
        let handler =
            normalize(|_event: Event| async move { Err::<(), _>(HttpError::unauthorized()) });

        serve(&event, &handler, &ServeOptions::new()).await.unwrap();

        assert_eq!(event.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(&event).unwrap()["statusCode"], json!(401));
    }

    #[tokio::test]
    async fn test_empty_reply_leaves_response_open() {
        let event = TestExchange::get("/").build();
        let handler = normalize(|_event: Event| async move {});

        serve(&event, &handler, &ServeOptions::new()).await.unwrap();

        assert!(!event.is_finalized());
    }

    #[test]
    fn test_options_builder() {
        assert!(!ServeOptions::new().debug);
        assert!(ServeOptions::new().debug(true).debug);
    }
}
