//! # trellis-std
//!
//! Standard building blocks for the Trellis HTTP compatibility layer.
//!
//! This crate provides:
//! - **Response primitives**: [`response::send`], [`response::send_stream`],
//!   [`response::send_redirect`], [`response::append_header`]
//! - **Error dispatch**: [`dispatch::send_error`], [`dispatch::dispatch_error`]
//! - **Cookies**: [`cookie::use_cookies`], [`cookie::set_cookie`], [`cookie::delete_cookie`]
//! - **Exchange driver**: [`serve::serve`]
//! - **Logging**: [`logging::LoggingHandler`]
//! - **Testing**: [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use trellis_core;

// Modules
pub mod cookie;
pub mod dispatch;
pub mod logging;
pub mod mime;
pub mod response;
pub mod serve;
pub mod testing;
