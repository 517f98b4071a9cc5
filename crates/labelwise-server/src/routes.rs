//! HTTP routes and the mapping from engine errors to responses.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use labelwise_ai::{InferenceEngine, InferenceError};
use labelwise_core::{ErrorBody, HealthStatus, PredictionInput, PredictionOutput};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<InferenceEngine>,
    project_name: Arc<str>,
}

impl AppState {
    pub fn new(engine: Arc<InferenceEngine>, project_name: impl Into<Arc<str>>) -> Self {
        Self {
            engine,
            project_name: project_name.into(),
        }
    }
}

/// Build the application router. API routes live under `prefix`
/// (`""` mounts them at the root).
pub fn router(state: AppState, prefix: &str) -> Router {
    let api = Router::new().route("/predict", post(predict));

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health));
    let app = if prefix.is_empty() {
        app.merge(api)
    } else {
        app.nest(prefix, api)
    };

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> Redirect {
    Redirect::temporary("/health")
}

async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus::healthy(
        &*state.project_name,
        state.engine.is_loaded(),
    ))
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictionInput>, JsonRejection>,
) -> Result<Json<PredictionOutput>, ApiError> {
    let Json(input) = payload?;
    let result = state
        .engine
        .predict(Some(&input.title), Some(&input.body))
        .await?;
    Ok(Json(result.into()))
}

/// An error response: a status code and a `{"message": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        match &err {
            InferenceError::ModelNotLoaded(_) => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: err.to_string(),
            },
            InferenceError::Prediction(e) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: format!("Prediction failed: {e}"),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Bad syntax and bad shape are both request validation failures.
        let status = match &rejection {
            JsonRejection::JsonSyntaxError(_) | JsonRejection::JsonDataError(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            other => other.status(),
        };
        warn!(%status, "rejected prediction request");
        Self {
            status,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use labelwise_ai::{ArtifactLoader, fixtures};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app_for(dir: &std::path::Path) -> (Router, Arc<InferenceEngine>) {
        let engine = Arc::new(InferenceEngine::new(ArtifactLoader::from_dir(
            dir,
            fixtures::MODEL_FILENAME,
        )));
        let state = AppState::new(Arc::clone(&engine), "labelwise-test");
        (router(state, "/api/v1"), engine)
    }

    fn predict_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn predict_returns_labels_and_all_scores() {
        let dir = fixtures::artifact_dir();
        let (app, _) = app_for(dir.path());

        let response = app
            .oneshot(predict_request(
                r#"{"title": "App crash on start", "body": "stack trace below"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["labels"], serde_json::json!(["bug"]));
        let scores = body["confidence_scores"].as_object().unwrap();
        assert_eq!(scores.len(), fixtures::LABELS.len());
        for label in fixtures::LABELS {
            let p = scores[label].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[tokio::test]
    async fn empty_strings_are_valid() {
        let dir = fixtures::artifact_dir();
        let (app, _) = app_for(dir.path());

        let response = app
            .oneshot(predict_request(r#"{"title": "", "body": ""}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["labels"], serde_json::json!([]));
        assert!(body["confidence_scores"].is_object());
    }

    #[tokio::test]
    async fn missing_model_is_503_until_present() {
        let dir = tempfile::tempdir().unwrap();
        let (app, engine) = app_for(dir.path());

        let response = app
            .clone()
            .oneshot(predict_request(r#"{"title": "crash", "body": ""}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .starts_with("Models are not loaded")
        );
        assert!(!engine.is_loaded());

        fixtures::write_artifact(dir.path(), &fixtures::bundle_json());
        let response = app
            .oneshot(predict_request(r#"{"title": "crash", "body": ""}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(engine.is_loaded());
    }

    #[tokio::test]
    async fn missing_field_is_rejected() {
        let dir = fixtures::artifact_dir();
        let (app, engine) = app_for(dir.path());

        let response = app
            .oneshot(predict_request(r#"{"title": "crash"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json_body(response).await["message"].is_string());
        // Validation happens before the engine is touched.
        assert_eq!(engine.load_attempts(), 0);
    }

    #[tokio::test]
    async fn malformed_json_is_unprocessable() {
        let dir = fixtures::artifact_dir();
        let (app, engine) = app_for(dir.path());

        for body in ["{not json", "", r#"{"title": "crash", "body": 7}"#] {
            let response = app.clone().oneshot(predict_request(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "body {body:?}");
            assert!(json_body(response).await["message"].is_string());
        }
        assert_eq!(engine.load_attempts(), 0);
    }

    #[tokio::test]
    async fn missing_content_type_is_unsupported() {
        let dir = fixtures::artifact_dir();
        let (app, _) = app_for(dir.path());

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/predict")
            .body(Body::from(r#"{"title": "crash", "body": "boom"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn health_reports_model_state() {
        let dir = fixtures::artifact_dir();
        let (app, engine) = app_for(dir.path());

        let request = || {
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap()
        };

        let body = json_body(app.clone().oneshot(request()).await.unwrap()).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["app_name"], "labelwise-test");
        assert_eq!(body["model_loaded"], false);

        engine.ensure_loaded().await.unwrap();
        let body = json_body(app.oneshot(request()).await.unwrap()).await;
        assert_eq!(body["model_loaded"], true);
    }

    #[tokio::test]
    async fn root_redirects_to_health() {
        let dir = fixtures::artifact_dir();
        let (app, _) = app_for(dir.path());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/health");
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let dir = fixtures::artifact_dir();
        let (app, _) = app_for(dir.path());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "https://example.org")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[test]
    fn prediction_errors_map_to_500() {
        let err = InferenceError::Prediction(labelwise_ai::PredictionError::FeatureWidth {
            expected: 10,
            actual: 9,
        });
        let api = ApiError::from(err);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(api.message.starts_with("Prediction failed:"));
    }
}
