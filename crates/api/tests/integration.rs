//! Integration tests for the keepalive router.
//!
//! Uses `tower::ServiceExt` to test Axum routes without a real HTTP server.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use pushbridge_api::routes::create_router;
use pushbridge_api::routes::keepalive::ALIVE_MESSAGE;

async fn send(method: &str, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = create_router()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_root_is_alive() {
    let (status, content_type, body) = send("GET", "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/plain; charset=utf-8"));
    assert_eq!(body, ALIVE_MESSAGE);
}

#[tokio::test]
async fn test_any_path_and_method_is_alive() {
    for (method, uri) in [("GET", "/health"), ("POST", "/anything/else"), ("HEAD", "/x")] {
        let (status, _, _) = send(method, uri).await;
        assert_eq!(status, StatusCode::OK, "{} {}", method, uri);
    }
}
