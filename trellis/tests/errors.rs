use serde_json::json;
use trellis::{
    DEFAULT_STATUS_MESSAGE, ErrorInput, HttpError, create_error, dispatch_error,
    http::{StatusCode, header::CONTENT_TYPE},
    mime, send, send_error,
    testing::{TestExchange, body_json},
    to_http_error,
};

mod common;

#[test]
fn test_untyped_failure_gets_defaults() {
    let err = to_http_error("connection reset".into());
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.status_message(), DEFAULT_STATUS_MESSAGE);
    assert_eq!(err.message(), "connection reset");
    assert!(err.data().is_none());
}

#[test]
fn test_explicit_fields_are_copied_exactly() {
    let err = create_error(
        ErrorInput::new()
            .status_code(422)
            .status_message("Unprocessable")
            .data(json!({ "field": "email" })),
    );
    assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err.status_message(), "Unprocessable");
    assert_eq!(err.data(), Some(&json!({ "field": "email" })));
}

#[test]
fn test_typed_error_passes_through_unchanged() {
    let original = HttpError::not_found()
        .with_message("no such page")
        .with_data(json!("x"));
    let coerced = to_http_error(Box::new(original.clone()));
    assert_eq!(coerced, original);
}

#[test]
fn test_not_found_scenario() {
    common::init_tracing();
    let event = TestExchange::get("/nowhere").build();

    send_error(
        &event,
        ErrorInput::new().status_code(404).status_message("Not Found"),
        false,
    )
    .unwrap();

    assert_eq!(event.status(), StatusCode::NOT_FOUND);
    let body = body_json(&event).unwrap();
    assert_eq!(body["statusCode"], json!(404));
    assert_eq!(body["statusMessage"], json!("Not Found"));
    assert_eq!(body["stack"], json!([]));
    assert!(body.get("data").is_none());
    assert_eq!(event.response_header(CONTENT_TYPE).unwrap(), mime::JSON_UTF8);
}

#[test]
fn test_dispatch_twice_writes_once() {
    let event = TestExchange::get("/").build();

    assert!(dispatch_error(&event, HttpError::bad_request(), false).unwrap());
    assert!(!send_error(&event, "late failure", true).unwrap());

    assert_eq!(event.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(&event).unwrap()["statusCode"], json!(400));
}

#[tokio::test]
async fn test_dispatch_after_send_is_silent() {
    let event = TestExchange::get("/").build();
    send(&event, "done", None).await.unwrap();

    assert!(!dispatch_error(&event, HttpError::internal(), false).unwrap());
    assert_eq!(event.status(), StatusCode::OK);
}

#[test]
fn test_debug_mode_exposes_trace_of_untyped_error() {
    let event = TestExchange::get("/").build();
    let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "upstream timed out");

    send_error(&event, io, true).unwrap();

    let body = body_json(&event).unwrap();
    assert_eq!(body["stack"], json!(["Error: upstream timed out"]));
}
