//! Request-level detection of aws-chunked bodies.
//!
//! A request carries aws-chunked framing when its `Content-Encoding` lists
//! `aws-chunked` or its `x-amz-content-sha256` value starts with
//! `STREAMING-`. After decoding, the `aws-chunked` token must be stripped
//! from `Content-Encoding` so the stored object does not claim an encoding
//! its bytes no longer have.

use http::header::{HeaderMap, HeaderValue, CONTENT_ENCODING};

/// Header carrying the payload hash mode for SigV4 requests.
pub const X_AMZ_CONTENT_SHA256: &str = "x-amz-content-sha256";

/// Header declaring the decoded payload length of an aws-chunked body.
pub const X_AMZ_DECODED_CONTENT_LENGTH: &str = "x-amz-decoded-content-length";

/// Return `true` if the request body uses aws-chunked framing.
#[must_use]
pub fn is_aws_chunked(headers: &HeaderMap) -> bool {
    if let Some(encoding) = headers.get(CONTENT_ENCODING) {
        if let Ok(s) = encoding.to_str() {
            if s.split(',').any(|v| v.trim().eq_ignore_ascii_case("aws-chunked")) {
                return true;
            }
        }
    }

    if let Some(sha) = headers.get(X_AMZ_CONTENT_SHA256) {
        if let Ok(s) = sha.to_str() {
            if s.starts_with("STREAMING-") {
                return true;
            }
        }
    }

    false
}

/// The declared decoded payload length, when present.
#[must_use]
pub fn decoded_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(X_AMZ_DECODED_CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Remove `aws-chunked` from the `Content-Encoding` header.
///
/// If the header becomes empty after removal, it is deleted entirely.
pub fn strip_aws_chunked_encoding(headers: &mut HeaderMap) {
    let Some(encoding) = headers.get(CONTENT_ENCODING) else {
        return;
    };
    let Ok(value) = encoding.to_str() else {
        return;
    };

    let remaining: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.eq_ignore_ascii_case("aws-chunked"))
        .collect();

    if remaining.is_empty() {
        headers.remove(CONTENT_ENCODING);
    } else if let Ok(new_value) = HeaderValue::from_str(&remaining.join(", ")) {
        headers.insert(CONTENT_ENCODING, new_value);
    }
}
