//! Logging wrapper for handler observation.

use futures::FutureExt;
use trellis_core::{EventHandler, IntoEventHandler};

/// Wraps a handler so every invocation is logged.
///
/// Logs through `tracing` when the `tracing` feature is on; otherwise the
/// wrapper only forwards. The wrapped handler keeps its original shape.
///
/// # Example
///
/// ```rust,ignore
/// let handler = LoggingHandler::named("login").wrap(login_handler);
/// serve(&event, &handler, &options).await?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LoggingHandler {
    name: &'static str,
}

impl LoggingHandler {
    /// Create a `LoggingHandler` with a default name.
    pub fn new() -> Self {
        Self { name: "handler" }
    }

    /// Create a `LoggingHandler` with a custom name.
    ///
    /// The name identifies the handler in log records.
    pub fn named(name: &'static str) -> Self {
        Self { name }
    }

    /// Normalize `handler` and wrap it.
    pub fn wrap<H, M>(self, handler: H) -> EventHandler
    where
        H: IntoEventHandler<M>,
    {
        let inner = handler.into_event_handler();
        let shape = inner.shape();
        let name = self.name;
        EventHandler::from_fn(shape, move |event| {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                name = %name,
                shape = ?shape,
                method = %event.method(),
                uri = %event.uri(),
                "invoking handler"
            );
            #[cfg(not(feature = "tracing"))]
            let _ = name;

            let fut = inner.call(event);
            async move {
                let result = fut.await;
                #[cfg(feature = "tracing")]
                if let Err(err) = &result {
                    tracing::debug!(name = %name, error = %err, "handler failed");
                }
                result
            }
            .boxed()
        })
    }
}

impl Default for LoggingHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestExchange;
    use trellis_core::{EventRequest, EventResponse, HandlerShape, HttpError, Reply};

    #[tokio::test]
    async fn test_logging_handler_forwards() {
        let handler = LoggingHandler::new()
            .wrap(|_req: EventRequest, _res: EventResponse| async move { "ok" });
        assert_eq!(handler.shape(), HandlerShape::Classic);

        let reply = handler.call(TestExchange::get("/").build()).await.unwrap();
        assert!(matches!(reply, Reply::Html(ref s) if s == "ok"));
    }

    #[tokio::test]
    async fn test_logging_handler_named_passes_errors() {
        let handler = LoggingHandler::named("failing")
            .wrap(|_event: trellis_core::Event| async move { Err::<(), _>(HttpError::not_found()) });

        let err = handler.call(TestExchange::get("/").build()).await.unwrap_err();
        assert!(err.downcast_ref::<HttpError>().is_some());
    }
}
