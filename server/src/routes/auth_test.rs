use axum::http::HeaderValue;

use super::*;

fn headers_with(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(value).expect("header value"));
    headers
}

#[test]
fn bearer_scheme_is_stripped() {
    assert_eq!(credential_from_headers(&headers_with("Bearer abc123")), Some("abc123".into()));
}

#[test]
fn bearer_scheme_is_case_insensitive() {
    assert_eq!(credential_from_headers(&headers_with("bearer   abc123 ")), Some("abc123".into()));
}

#[test]
fn bare_token_is_accepted() {
    assert_eq!(credential_from_headers(&headers_with("abc123")), Some("abc123".into()));
}

#[test]
fn missing_or_blank_header_is_none() {
    assert_eq!(credential_from_headers(&HeaderMap::new()), None);
    assert_eq!(credential_from_headers(&headers_with("Bearer ")), None);
    assert_eq!(credential_from_headers(&headers_with("   ")), None);
}

#[test]
fn scheme_without_token_is_none() {
    assert_eq!(credential_from_headers(&headers_with("bearer")), None);
    assert_eq!(credential_from_headers(&headers_with("BEARER   ")), None);
}
