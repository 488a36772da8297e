//! Extractors whose rejections render as [`AppError`] bodies

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Query string extractor; malformed table parameters are listing errors
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::routing::{get, post};
    use axum::Router;
    use serde::Deserialize;
    use serde_json::Value;
    use tower::util::ServiceExt;

    use crate::listing::ListParams;

    #[derive(Debug, Deserialize)]
    struct Named {
        #[allow(dead_code)]
        name: String,
    }

    fn router() -> Router {
        Router::new()
            .route(
                "/items",
                get(|AppQuery(_): AppQuery<ListParams>| async { "ok" })
                    .post(|AppJson(_): AppJson<Named>| async { "ok" }),
            )
            .route("/items/:id", get(|AppPath(_): AppPath<i64>| async { "ok" }))
    }

    async fn call(request: Request<Body>) -> (StatusCode, Value) {
        let response = router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_bad_query_is_listing_error() {
        for uri in ["/items?sort_order=DESC", "/items?page=abc"] {
            let (status, body) = call(get_request(uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error_code"], "invalid_listing", "{uri}");
        }

        let (status, _) = call(get_request("/items?sort_order=desc&page=2")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bad_path_is_invalid_request() {
        let (status, body) = call(get_request("/items/abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "invalid_request");
    }

    #[tokio::test]
    async fn test_bad_json_is_invalid_request() {
        let wrong_field = Request::builder()
            .method("POST")
            .uri("/items")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"nam": 1}"#))
            .unwrap();
        let (status, body) = call(wrong_field).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "invalid_request");
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request"));

        let no_content_type = Request::builder()
            .method("POST")
            .uri("/items")
            .body(Body::from(r#"{"name": "x"}"#))
            .unwrap();
        let (status, body) = call(no_content_type).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "invalid_request");
    }
}
