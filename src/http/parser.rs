use url::Url;

use crate::http::error::ParseError;
use crate::http::headers::HeaderMap;
use crate::http::request::{Method, Query, Request};

/// Parses a header block (request line plus header lines, without the
/// terminating blank line) into a `Request` with an empty body.
///
/// Header lines without a colon are skipped rather than rejected.
pub fn parse_request_head(block: &[u8]) -> Result<Request, ParseError> {
    let text = String::from_utf8_lossy(block);
    let mut lines = text.split("\r\n");

    // Request line
    let request_line = lines.next().unwrap_or("");
    if request_line.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let parts: Vec<&str> = request_line.split_whitespace().collect();
    let [method, target, version] = parts.as_slice() else {
        return Err(ParseError::InvalidRequestLine(parts.len()));
    };

    let (path, query) = split_target(target)?;

    // Headers
    let mut headers = HeaderMap::new();

    for line in lines {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        headers.insert(key, value.trim());
    }

    if let Some(raw) = headers.get("Content-Length") {
        if parse_content_length(raw).is_none() {
            return Err(ParseError::InvalidContentLength(raw.to_string()));
        }
    }

    Ok(Request {
        method: Method::parse(method),
        path,
        version: version.to_string(),
        query: query.as_deref().map(parse_query).unwrap_or_default(),
        headers,
        body: Vec::new(),
        content_length: None,
    })
}

/// Splits a request-target into its path and optional raw query.
///
/// Origin-form targets are split by hand so the path reaches the static
/// resolver exactly as sent (no dot-segment removal). Absolute-form
/// targets go through `Url` and only their path and query survive.
fn split_target(target: &str) -> Result<(String, Option<String>), ParseError> {
    if target.starts_with('/') {
        let target = target.split('#').next().unwrap_or(target);
        return Ok(match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        });
    }

    let url = Url::parse(target).map_err(|_| ParseError::InvalidTarget(target.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ParseError::InvalidTarget(target.to_string()));
    }

    Ok((url.path().to_string(), url.query().map(str::to_string)))
}

/// Decodes an `application/x-www-form-urlencoded` string.
///
/// Pairs with an empty value are dropped; repeated keys accumulate.
pub fn parse_query(raw: &str) -> Query {
    let mut query = Query::new();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        if value.is_empty() {
            continue;
        }
        query
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    query
}

/// Parses a `Content-Length` value: one or more ASCII digits, nothing
/// else. Signs, whitespace and values overflowing `usize` are rejected.
pub fn parse_content_length(raw: &str) -> Option<usize> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Finds the end of the header block: the index of the first `\r\n\r\n`.
pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
}
