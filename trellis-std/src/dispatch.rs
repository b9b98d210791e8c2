//! Error dispatcher.
//!
//! Terminates an exchange with a structured JSON error body:
//!
//! ```json
//! {
//!   "statusCode": 404,
//!   "statusMessage": "Not Found",
//!   "stack": [],
//!   "data": { "path": "/missing" }
//! }
//! ```
//!
//! Trace lines are only included in debug mode. Dispatching on a response
//! that is already finalized does nothing.

use crate::mime;
use http::{HeaderValue, header::CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use trellis_core::{BoxError, Event, HttpError, ResponseError, to_http_error};

/// The JSON body written for a dispatched error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Numeric status code.
    pub status_code: u16,
    /// Status message.
    pub status_message: String,
    /// Trimmed trace lines; empty unless in debug mode.
    pub stack: Vec<String>,
    /// Client payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Answer the exchange with any failure.
///
/// An [`HttpError`] is used as is. Anything else is logged and coerced with
/// [`to_http_error`] first.
///
/// Returns `Ok(false)` when the response was already finalized.
pub fn send_error(
    event: &Event,
    error: impl Into<BoxError>,
    debug: bool,
) -> Result<bool, ResponseError> {
    let error: BoxError = error.into();
    let error = match error.downcast::<HttpError>() {
        Ok(http) => *http,
        Err(other) => {
            #[cfg(feature = "tracing")]
            tracing::error!(error = %other, uri = %event.uri(), "unhandled error");
            to_http_error(other)
        }
    };
    dispatch_error(event, error, debug)
}

/// Answer the exchange with a typed error.
///
/// Sets the status line from the error, replaces any partial body with the
/// JSON body, sets the JSON content type unless the handler already chose
/// one, and finalizes.
///
/// Returns `Ok(false)` when the response was already finalized.
pub fn dispatch_error(event: &Event, error: HttpError, debug: bool) -> Result<bool, ResponseError> {
    event.with_response(|res| {
        if res.is_finalized() {
            return Ok(false);
        }

        res.set_status(error.status_code());
        res.set_status_message(error.status_message());

        let body = ErrorBody {
            status_code: res.status().as_u16(),
            status_message: res.status_message().to_owned(),
            stack: if debug {
                error.stack_lines()
            } else {
                Vec::new()
            },
            data: error.data().cloned(),
        };
        let payload = serde_json::to_vec_pretty(&body)?;

        if !res.headers().contains_key(CONTENT_TYPE) {
            res.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(mime::JSON_UTF8));
        }
        res.clear_body()?;
        res.end(Some(payload.into()))?;
        Ok(true)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestExchange, body_json, body_text};
    use http::StatusCode;
    use serde_json::json;
    use trellis_core::ErrorInput;

    #[test]
    fn test_not_found_body() {
        let event = TestExchange::get("/missing").build();
        let err = ErrorInput::new().status_code(404).status_message("Not Found");

        assert!(send_error(&event, err, false).unwrap());

        assert_eq!(event.status(), StatusCode::NOT_FOUND);
        let body = body_json(&event).unwrap();
        assert_eq!(
            body,
            json!({ "statusCode": 404, "statusMessage": "Not Found", "stack": [] })
        );
        assert_eq!(
            event.response_header(CONTENT_TYPE).unwrap(),
            mime::JSON_UTF8
        );
    }

    #[test]
    fn test_body_is_pretty_printed() {
        let event = TestExchange::get("/").build();
        dispatch_error(&event, HttpError::bad_request(), false).unwrap();
        let text = body_text(&event);
        assert!(text.contains("\n  \"statusCode\": 400,"));
    }

    #[test]
    fn test_second_dispatch_is_noop() {
        let event = TestExchange::get("/").build();
        assert!(dispatch_error(&event, HttpError::forbidden(), false).unwrap());
        assert!(!dispatch_error(&event, HttpError::internal(), false).unwrap());

        assert_eq!(event.status(), StatusCode::FORBIDDEN);
        assert_eq!(event.with_response(|res| res.chunks().len()), 1);
    }

    #[test]
    fn test_stack_only_in_debug() {
        let err = HttpError::internal().with_stack("Error: boom\n    at handler");

        let quiet = TestExchange::get("/").build();
        dispatch_error(&quiet, err.clone(), false).unwrap();
        assert_eq!(body_json(&quiet).unwrap()["stack"], json!([]));

        let loud = TestExchange::get("/").build();
        dispatch_error(&loud, err, true).unwrap();
        assert_eq!(
            body_json(&loud).unwrap()["stack"],
            json!(["Error: boom", "at handler"])
        );
    }

    #[test]
    fn test_generic_error_is_coerced() {
        let event = TestExchange::get("/").build();
        send_error(&event, "database unavailable", false).unwrap();

        let body = body_json(&event).unwrap();
        assert_eq!(body["statusCode"], json!(500));
        assert_eq!(body["statusMessage"], json!("Internal Server Error"));
    }

    #[test]
    fn test_partial_body_is_replaced() {
        let event = TestExchange::get("/").build();
        event.with_response(|res| res.write("half a page")).unwrap();

        dispatch_error(&event, HttpError::internal(), false).unwrap();

        assert_eq!(body_json(&event).unwrap()["statusCode"], json!(500));
        assert!(!body_text(&event).contains("half a page"));
    }

    #[test]
    fn test_handler_content_type_is_kept() {
        let event = TestExchange::get("/").build();
        event.with_response(|res| {
            res.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/problem+json"))
        });
        dispatch_error(&event, HttpError::not_found().with_data(json!({ "id": 1 })), false)
            .unwrap();

        assert_eq!(
            event.response_header(CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
        assert_eq!(body_json(&event).unwrap()["data"], json!({ "id": 1 }));
    }
}
