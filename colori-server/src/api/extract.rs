//! Body and query extractors that reject with the API error body
//!
//! axum's own `Json` and `Query` reject with plain-text responses; these
//! wrappers turn those rejections into [`ApiError`]s.

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::{request::Parts, StatusCode},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;

/// JSON request body
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

/// Query string parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(query_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    debug!(status = %rejection.status(), "Rejected JSON body: {}", rejection.body_text());
    match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge("Request body is too large".to_string()),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => {
            ApiError::BadRequest("Expected an application/json request body".to_string())
        }
        _ => ApiError::BadRequest(rejection.body_text()),
    }
}

fn query_rejection(rejection: QueryRejection) -> ApiError {
    debug!("Rejected query string: {}", rejection.body_text());
    ApiError::BadRequest(rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Age {
        age: String,
    }

    fn json_request(content_type: Option<&str>, body: &str) -> Request {
        let mut builder = axum::http::Request::builder().method("PUT").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_json_accepts_valid_body() {
        let request = json_request(Some("application/json"), r#"{"age":"30-39"}"#);
        let ApiJson(age) = ApiJson::<Age>::from_request(request, &()).await.unwrap();
        assert_eq!(age.age, "30-39");
    }

    #[tokio::test]
    async fn test_json_missing_field_is_bad_request() {
        let request = json_request(Some("application/json"), "{}");
        let err = ApiJson::<Age>::from_request(request, &()).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref msg) if msg.contains("age")));
    }

    #[tokio::test]
    async fn test_json_wrong_content_type_is_bad_request() {
        let request = json_request(None, r#"{"age":"30-39"}"#);
        let err = ApiJson::<Age>::from_request(request, &()).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_query_bad_value_is_bad_request() {
        #[derive(Debug, Deserialize)]
        struct Page {
            #[allow(dead_code)]
            page: i64,
        }

        let request = axum::http::Request::builder()
            .uri("/?page=abc")
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        let err = ApiQuery::<Page>::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
