use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use base64::prelude::{Engine, BASE64_STANDARD};
use muse::db::RepositoryError;
use muse::generation::GenerationError;
use muse::services::ServiceError;
use muse::storage::StorageError;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct GenerateBody {
    prompt: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateBody {
    name: Option<String>,
    prompt: Option<String>,
    /// Base64 image produced by /generate, optionally data-URI prefixed
    photo: Option<String>,
}

fn status_for(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::Generation(e) => match e {
            GenerationError::MissingCredentials => StatusCode::INTERNAL_SERVER_ERROR,
            GenerationError::BillingExceeded(_) => StatusCode::BAD_REQUEST,
            GenerationError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            GenerationError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            GenerationError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GenerationError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        },
        ServiceError::Storage(e) => match e {
            StorageError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
            StorageError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            StorageError::UploadFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
        ServiceError::Repository(e) => match e {
            RepositoryError::Validation(_) => StatusCode::BAD_REQUEST,
            RepositoryError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

fn error_response(error: &ServiceError) -> axum::response::Response {
    let status = status_for(error);
    let body = match error {
        // Unclassified upstream failures keep their structured detail
        ServiceError::Generation(GenerationError::Upstream {
            message,
            kind,
            code,
        }) => json!({
            "success": false,
            "message": "Failed to generate image. Please check server logs for details.",
            "error": { "message": message, "type": kind, "code": code },
        }),
        _ => json!({ "success": false, "message": error.to_string() }),
    };
    (status, Json(body)).into_response()
}

/// Strip an optional data-URI prefix and decode the base64 image payload
fn decode_photo(photo: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let encoded = match photo.split_once("base64,") {
        Some((_, rest)) => rest,
        None => photo,
    };
    BASE64_STANDARD.decode(encoded.trim())
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn list_catalog(State(state): State<AppState>) -> axum::response::Response {
    match state.query.list_all().await {
        Ok(entries) => Json(json!({ "success": true, "data": entries })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "message": "Failed to fetch the catalog",
                "error": e.to_string(),
            })),
        )
            .into_response(),
    }
}

async fn create_catalog(
    State(state): State<AppState>,
    Json(body): Json<CreateBody>,
) -> axum::response::Response {
    let (name, prompt, photo) = match (body.name, body.prompt, body.photo) {
        (Some(n), Some(p), Some(ph)) if !n.is_empty() && !p.is_empty() && !ph.is_empty() => {
            (n, p, ph)
        },
        _ => {
            return error_response(&ServiceError::Validation(
                "Please provide name, prompt and photo".to_string(),
            ))
        },
    };

    let image = match decode_photo(&photo) {
        Ok(bytes) => bytes,
        Err(_) => {
            return error_response(&ServiceError::Validation("Invalid image data".to_string()))
        },
    };

    match state.publishing.publish(&name, &prompt, &image).await {
        Ok(entry) => {
            (StatusCode::CREATED, Json(json!({ "success": true, "data": entry }))).into_response()
        },
        Err(e) => error_response(&e),
    }
}

async fn generate_image(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> axum::response::Response {
    let prompt = body.prompt.unwrap_or_default();

    match state.publishing.generate(&prompt).await {
        Ok(image) => Json(json!({
            "success": true,
            "photo": BASE64_STANDARD.encode(image),
        }))
        .into_response(),
        Err(e) => error_response(&e),
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/catalog", get(list_catalog).post(create_catalog))
        .route("/api/v1/generate", post(generate_image))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use muse::testing::{TestCatalog, TestGenerator, TestStore};
    use std::sync::Arc;
    use tower::ServiceExt;

    const URL: &str = "https://cdn.example.com/muse_gallery/img.png";

    fn app() -> Router {
        let state = AppState::assemble(
            Arc::new(TestGenerator::returning(vec![1, 2, 3, 4])),
            Arc::new(TestStore::returning(URL)),
            Arc::new(TestCatalog::new()),
        );
        build_router(state)
    }

    fn app_with_generator(generator: TestGenerator) -> Router {
        let state = AppState::assemble(
            Arc::new(generator),
            Arc::new(TestStore::returning(URL)),
            Arc::new(TestCatalog::new()),
        );
        build_router(state)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn generate_returns_base64_photo() {
        let response = app()
            .oneshot(post_json("/api/v1/generate", json!({"prompt": "a fox"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], json!(true));
        let photo = body["photo"].as_str().unwrap();
        assert_eq!(BASE64_STANDARD.decode(photo).unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn generate_without_prompt_is_bad_request() {
        let response = app()
            .oneshot(post_json("/api/v1/generate", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn generate_rate_limited_maps_to_429() {
        let app = app_with_generator(TestGenerator::failing(|| {
            GenerationError::RateLimited("slow down".into())
        }));
        let response = app
            .oneshot(post_json("/api/v1/generate", json!({"prompt": "a fox"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn generate_billing_exceeded_maps_to_400() {
        let app = app_with_generator(TestGenerator::failing(|| {
            GenerationError::BillingExceeded("quota".into())
        }));
        let response = app
            .oneshot(post_json("/api/v1/generate", json!({"prompt": "a fox"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn generate_auth_failure_maps_to_401() {
        let app = app_with_generator(TestGenerator::failing(|| {
            GenerationError::AuthenticationFailed("bad key".into())
        }));
        let response = app
            .oneshot(post_json("/api/v1/generate", json!({"prompt": "a fox"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn generate_upstream_failure_returns_structured_error() {
        let app = app_with_generator(TestGenerator::failing(|| GenerationError::Upstream {
            message: "server had an error".into(),
            kind: Some("server_error".into()),
            code: None,
        }));
        let response = app
            .oneshot(post_json("/api/v1/generate", json!({"prompt": "a fox"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], json!("server had an error"));
        assert_eq!(body["error"]["type"], json!("server_error"));
    }

    #[tokio::test]
    async fn create_then_list_shows_the_entry() {
        let app = app();
        let photo = BASE64_STANDARD.encode([5u8, 6, 7]);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/catalog",
                json!({"name": "Ada", "prompt": "a fox", "photo": photo}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let created = body_json(response).await;
        assert_eq!(created["data"]["imageUrl"], json!(URL));
        assert!(!created["data"]["id"].as_str().unwrap().is_empty());

        let response = app
            .oneshot(Request::get("/api/v1/catalog").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let listed = body_json(response).await;
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);
        assert_eq!(listed["data"][0]["name"], json!("Ada"));
    }

    #[tokio::test]
    async fn create_accepts_data_uri_prefixed_photo() {
        let photo = format!("data:image/png;base64,{}", BASE64_STANDARD.encode([1u8]));
        let response = app()
            .oneshot(post_json(
                "/api/v1/catalog",
                json!({"name": "Ada", "prompt": "a fox", "photo": photo}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn create_with_missing_field_is_bad_request() {
        let response = app()
            .oneshot(post_json(
                "/api/v1/catalog",
                json!({"name": "Ada", "prompt": "a fox"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_with_undecodable_photo_is_bad_request() {
        let response = app()
            .oneshot(post_json(
                "/api/v1/catalog",
                json!({"name": "Ada", "prompt": "a fox", "photo": "%%%not-base64%%%"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["message"], json!("Invalid image data"));
    }

    #[tokio::test]
    async fn create_with_failing_store_maps_to_500() {
        let state = AppState::assemble(
            Arc::new(TestGenerator::returning(vec![1])),
            Arc::new(TestStore::failing()),
            Arc::new(TestCatalog::new()),
        );
        let response = build_router(state)
            .oneshot(post_json(
                "/api/v1/catalog",
                json!({"name": "Ada", "prompt": "a fox", "photo": BASE64_STANDARD.encode([1u8])}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn list_with_failing_store_maps_to_500() {
        let state = AppState::assemble(
            Arc::new(TestGenerator::returning(vec![1])),
            Arc::new(TestStore::returning(URL)),
            Arc::new(TestCatalog::failing()),
        );
        let response = build_router(state)
            .oneshot(Request::get("/api/v1/catalog").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().is_some());
    }
}
