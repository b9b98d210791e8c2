//! Content types used by the response helpers.

/// `text/html`
pub const HTML: &str = "text/html";

/// `text/plain`
pub const TEXT: &str = "text/plain";

/// `application/json`
pub const JSON: &str = "application/json";

/// `application/json; charset=utf-8`, used for error bodies.
pub const JSON_UTF8: &str = "application/json; charset=utf-8";

/// `application/octet-stream`
pub const OCTET_STREAM: &str = "application/octet-stream";
