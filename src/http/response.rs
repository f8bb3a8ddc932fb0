//! Canned response emission.
//!
//! # Responsibilities
//! - Write a matched mapping's headers, status and body onto the outbound response
//! - Produce the standard not-found response for unmatched requests
//!
//! # Design Decisions
//! - Body bytes are replayed verbatim; no encoder sits between the mapping and the wire
//! - Missing headers or body simply elide that part of the response
//! - Stateless; called once per matched request

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};

use crate::routing::CannedResponse;

/// Body of the not-found response.
pub const NOT_FOUND_BODY: &str = "404 page not found\n";

/// Write `canned` onto `target`: headers, then status, then body.
///
/// Not idempotent: emitting twice applies the headers twice.
pub fn emit(target: &mut Response<Body>, canned: &CannedResponse) {
    let headers = target.headers_mut();
    for (name, value) in &canned.headers {
        headers.insert(name.clone(), value.clone());
    }

    *target.status_mut() = canned.status;

    *target.body_mut() = match &canned.body {
        Some(bytes) => Body::from(bytes.clone()),
        None => Body::empty(),
    };
}

/// Response for a (method, path) with no mapping.
pub fn not_found() -> Response<Body> {
    let mut response = Response::new(Body::from(NOT_FOUND_BODY));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Bytes};
    use axum::http::HeaderMap;

    fn canned(status: u16, headers: &[(&'static str, &'static str)], body: Option<&'static str>) -> CannedResponse {
        let mut map = HeaderMap::new();
        for &(name, value) in headers {
            map.insert(name, HeaderValue::from_static(value));
        }
        CannedResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: map,
            body: body.map(|b| Bytes::from_static(b.as_bytes())),
        }
    }

    async fn body_of(response: Response<Body>) -> Bytes {
        to_bytes(response.into_body(), usize::MAX).await.unwrap()
    }

    #[tokio::test]
    async fn test_emit_full_response() {
        let mut response = Response::new(Body::empty());
        emit(
            &mut response,
            &canned(201, &[("content-type", "application/json")], Some(r#"{"message": "created"}"#)),
        );

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(body_of(response).await, r#"{"message": "created"}"#);
    }

    #[tokio::test]
    async fn test_string_literal_not_unwrapped() {
        let mut response = Response::new(Body::empty());
        emit(&mut response, &canned(200, &[], Some(r#""ok""#)));

        assert_eq!(body_of(response).await, r#""ok""#);
    }

    #[tokio::test]
    async fn test_no_headers_no_body() {
        let mut response = Response::new(Body::empty());
        emit(&mut response, &canned(204, &[], None));

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().is_empty());
        assert!(body_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_mapping_header_overrides_existing() {
        let mut response = Response::new(Body::empty());
        response.headers_mut().insert("x-mode", HeaderValue::from_static("old"));
        emit(&mut response, &canned(200, &[("x-mode", "new")], None));

        assert_eq!(response.headers().get_all("x-mode").iter().count(), 1);
        assert_eq!(response.headers()["x-mode"], "new");
    }

    #[tokio::test]
    async fn test_not_found() {
        let response = not_found();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(response).await, NOT_FOUND_BODY);
    }
}
