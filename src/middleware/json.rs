use axum::extract::{FromRequest, Json, Request};

use crate::error::AppError;

/// `Json` body extractor whose failures render as the API's 400 envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        routing::post,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[derive(Deserialize)]
    struct Payload {
        id: i64,
    }

    async fn echo(AppJson(payload): AppJson<Payload>) -> String {
        payload.id.to_string()
    }

    fn post_json(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn well_formed_body_reaches_the_handler() {
        let app = Router::new().route("/", post(echo));
        let response = app.oneshot(post_json(r#"{"id": 7}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"7");
    }

    #[tokio::test]
    async fn type_mismatch_is_a_bad_request_envelope() {
        let app = Router::new().route("/", post(echo));
        let response = app.oneshot(post_json(r#"{"id": "abc"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let message = body["message"].as_str().unwrap();
        assert!(message.contains("id"), "{message}");
        assert_eq!(body["data"]["error"], body["message"]);
    }

    #[tokio::test]
    async fn missing_content_type_is_a_bad_request_envelope() {
        let app = Router::new().route("/", post(echo));
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(r#"{"id": 7}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
