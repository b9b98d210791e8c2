//! Cookie utilities.
//!
//! Reads the request's `Cookie` header and appends `Set-Cookie` headers to the
//! response. Parsing and serialization are done by the `cookie` crate with
//! percent-encoding enabled.

use crate::response::append_header;
use cookie::{Cookie, CookieBuilder, Expiration, SameSite, time::Duration};
use http::header::{COOKIE, SET_COOKIE};
use std::collections::HashMap;
use trellis_core::{Event, ResponseError};

/// Attributes written alongside a cookie.
///
/// `path` falls back to `/` when unset.
#[derive(Debug, Clone, Default)]
pub struct CookieOptions {
    /// `Path` attribute.
    pub path: Option<String>,
    /// `Domain` attribute.
    pub domain: Option<String>,
    /// `Max-Age` attribute, in seconds.
    pub max_age: Option<i64>,
    /// `Expires` attribute.
    pub expires: Option<Expiration>,
    /// `HttpOnly` flag.
    pub http_only: bool,
    /// `Secure` flag.
    pub secure: bool,
    /// `SameSite` attribute.
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    /// Default options: path `/`, no other attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the domain.
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set `Max-Age` in seconds.
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Set `Expires`.
    pub fn expires(mut self, expires: impl Into<Expiration>) -> Self {
        self.expires = Some(expires.into());
        self
    }

    /// Set `HttpOnly`.
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set `Secure`.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set `SameSite`.
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    fn apply<'c>(self, mut builder: CookieBuilder<'c>) -> CookieBuilder<'c> {
        builder = builder.path(self.path.unwrap_or_else(|| "/".to_owned()));
        if let Some(domain) = self.domain {
            builder = builder.domain(domain);
        }
        if let Some(seconds) = self.max_age {
            builder = builder.max_age(Duration::seconds(seconds));
        }
        if let Some(expires) = self.expires {
            builder = builder.expires(expires);
        }
        if self.http_only {
            builder = builder.http_only(true);
        }
        if self.secure {
            builder = builder.secure(true);
        }
        if let Some(same_site) = self.same_site {
            builder = builder.same_site(same_site);
        }
        builder
    }
}

/// All request cookies as a name → value map.
///
/// A missing header yields an empty map. Malformed pairs are skipped and the
/// first occurrence of a name wins.
pub fn use_cookies(event: &Event) -> HashMap<String, String> {
    let header = event.with_request(|req| {
        req.headers()
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ")
    });

    let mut cookies = HashMap::new();
    for cookie in Cookie::split_parse_encoded(header.as_str()).flatten() {
        cookies
            .entry(cookie.name().to_owned())
            .or_insert_with(|| cookie.value().to_owned());
    }
    cookies
}

/// One request cookie by name.
pub fn use_cookie(event: &Event, name: &str) -> Option<String> {
    use_cookies(event).remove(name)
}

/// Append a `Set-Cookie` header for `name=value`.
pub fn set_cookie(
    event: &Event,
    name: &str,
    value: &str,
    options: CookieOptions,
) -> Result<(), ResponseError> {
    let cookie = options
        .apply(Cookie::build((name.to_owned(), value.to_owned())))
        .build();
    append_header(event, SET_COOKIE.as_str(), &cookie.encoded().to_string())
}

/// Append a `Set-Cookie` header that clears `name`.
///
/// The value is emptied and `Max-Age` forced to `0`, whatever `options` says.
pub fn delete_cookie(
    event: &Event,
    name: &str,
    options: CookieOptions,
) -> Result<(), ResponseError> {
    set_cookie(
        event,
        name,
        "",
        CookieOptions {
            max_age: Some(0),
            ..options
        },
    )
}
