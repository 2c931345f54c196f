//! Header classification.
//!
//! HTTP splits entity metadata (`Content-Type`, `Content-Length`, ...) from
//! message metadata. The outbound request keeps the two in separate maps, and
//! every inbound header is placed by asking [`HeaderKind::of`] where it belongs
//! instead of attempting an insert and reacting to a rejection.

use axum::http::header::{HeaderMap, HeaderName};

/// Headers describing the message body.
const CONTENT_HEADERS: &[&str] = &[
    "allow",
    "content-disposition",
    "content-encoding",
    "content-language",
    "content-length",
    "content-location",
    "content-md5",
    "content-range",
    "content-type",
    "expires",
    "last-modified",
];

/// Headers only meaningful on a response; a request can carry them nowhere.
const RESPONSE_ONLY_HEADERS: &[&str] = &[
    "accept-ranges",
    "age",
    "etag",
    "location",
    "proxy-authenticate",
    "retry-after",
    "server",
    "vary",
    "www-authenticate",
];

/// Where a header name may be placed on an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    /// General or request header.
    Request,
    /// Describes the body; lives with the content.
    Content,
    /// Response-only header; has no place on a request.
    Response,
}

impl HeaderKind {
    /// Classify a header name. `HeaderName` is already lowercase, so the
    /// comparison is case-insensitive with respect to the wire form.
    pub fn of(name: &HeaderName) -> Self {
        let name = name.as_str();
        if CONTENT_HEADERS.contains(&name) {
            HeaderKind::Content
        } else if RESPONSE_ONLY_HEADERS.contains(&name) {
            HeaderKind::Response
        } else {
            HeaderKind::Request
        }
    }

    pub fn is_content(self) -> bool {
        self == HeaderKind::Content
    }
}

/// Split a header map into (message headers, content headers), keeping value
/// order per name.
pub fn split_content_headers(headers: HeaderMap) -> (HeaderMap, HeaderMap) {
    let mut message = HeaderMap::with_capacity(headers.len());
    let mut content = HeaderMap::new();
    let mut current: Option<HeaderName> = None;

    // `into_iter` yields the name only for the first value of each name.
    for (name, value) in headers {
        if let Some(name) = name {
            current = Some(name);
        }
        let Some(name) = current.as_ref() else {
            continue;
        };
        if HeaderKind::of(name).is_content() {
            content.append(name.clone(), value);
        } else {
            message.append(name.clone(), value);
        }
    }

    (message, content)
}
