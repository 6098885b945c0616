//! Web front end.
//!
//! Exposes the same two inputs as the CLI (reference and optional language)
//! and answers with the transcript bytes and the video title instead of
//! writing a file.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::pipeline::ExtractionPipeline;
use crate::video::LanguagePreference;
use crate::Error;

/// Number of transcript lines included in the preview
const PREVIEW_LINES: usize = 3;

/// Shared application state
struct AppState {
    pipeline: ExtractionPipeline,
}

/// Build the router for the web front end
pub fn router(pipeline: ExtractionPipeline) -> Router {
    let state = Arc::new(AppState { pipeline });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/transcripts", post(extract))
        .route("/api/transcripts/download", get(download))
        .layer(cors)
        .with_state(state)
}

/// Bind `host:port` and serve until the process is stopped
pub async fn run_server(pipeline: ExtractionPipeline, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Web front end listening on http://{}", addr);
    println!("Listening on http://{}", addr);
    println!("  POST /api/transcripts            {{\"reference\": \"...\", \"language\": \"en\"}}");
    println!("  GET  /api/transcripts/download   ?reference=...&language=en");

    axum::serve(listener, router(pipeline)).await?;
    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct TranscriptRequest {
    /// YouTube URL or bare video id
    reference: String,
    /// Optional caption language code
    #[serde(default)]
    language: Option<String>,
}

#[derive(Serialize)]
struct TranscriptResponse {
    video_id: String,
    title: String,
    language: String,
    filename: String,
    transcript: String,
    preview: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

/// Request failures: malformed input or a classified extraction error
#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Extraction(Error),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Extraction(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Extraction(e) => match e {
                Error::InvalidReference(_) => StatusCode::BAD_REQUEST,
                Error::NoTranscriptAvailable(_) | Error::VideoUnavailable(_) => StatusCode::NOT_FOUND,
                Error::LanguageUnavailable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                Error::Network(_) => StatusCode::BAD_GATEWAY,
                Error::Write { .. } | Error::Unclassified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest(error) => ErrorResponse {
                error,
                kind: "bad_request",
            },
            ApiError::Extraction(e) => {
                if status.is_server_error() {
                    tracing::error!(error = %e, "Request failed");
                } else {
                    tracing::warn!(error = %e, "Request failed");
                }
                ErrorResponse {
                    error: e.user_message(),
                    kind: e.kind(),
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

fn parse_language(language: Option<&str>) -> Result<Option<LanguagePreference>, ApiError> {
    match language.map(str::trim).filter(|l| !l.is_empty()) {
        Some(tag) => tag.parse().map(Some).map_err(ApiError::BadRequest),
        None => Ok(None),
    }
}

fn preview(text: &str) -> String {
    text.lines().take(PREVIEW_LINES).collect::<Vec<_>>().join("\n")
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn extract(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TranscriptRequest>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let language = parse_language(req.language.as_deref())?;
    let prepared = state
        .pipeline
        .prepare(&req.reference, language.as_ref())
        .await?;

    let transcript = prepared.text(state.pipeline.separator());
    Ok(Json(TranscriptResponse {
        video_id: prepared.video_id.to_string(),
        filename: prepared.file_name(),
        title: prepared.transcript.video_title,
        language: prepared.transcript.language_used,
        preview: preview(&transcript),
        transcript,
    }))
}

async fn download(
    State(state): State<Arc<AppState>>,
    Query(req): Query<TranscriptRequest>,
) -> Result<Response, ApiError> {
    let language = parse_language(req.language.as_deref())?;
    let prepared = state
        .pipeline
        .prepare(&req.reference, language.as_ref())
        .await?;

    let disposition = format!("attachment; filename=\"{}\"", prepared.file_name());
    let body = prepared.text(state.pipeline.separator());

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::provider::{CaptionTrack, MockCaptionProvider, ProviderError, TrackListing};
    use crate::transcript::TranscriptSegment;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt; // for oneshot()

    fn test_router(provider: MockCaptionProvider) -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.output.directory = Some(dir.path().to_path_buf());
        config.network.retry.initial_delay_ms = 1;
        let pipeline = ExtractionPipeline::with_provider(&config, Arc::new(provider));
        (router(pipeline), dir)
    }

    fn english_provider() -> MockCaptionProvider {
        let mut provider = MockCaptionProvider::new();
        provider.expect_provider_name().return_const("mock");
        provider.expect_list_tracks().returning(|_| {
            Ok(TrackListing {
                video_title: "Title Text".into(),
                tracks: vec![CaptionTrack {
                    language_code: "en".into(),
                    language_name: "English".into(),
                    is_generated: false,
                    base_url: "https://example.invalid/en".into(),
                }],
            })
        });
        provider.expect_download().returning(|_| {
            Ok(["one", "two", "three", "four"]
                .iter()
                .enumerate()
                .map(|(i, text)| TranscriptSegment {
                    start: i as f64,
                    duration: 1.0,
                    text: text.to_string(),
                })
                .collect())
        });
        provider
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_transcript(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/transcripts")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_extract_returns_transcript_json() {
        let (app, dir) = test_router(english_provider());

        let response = app
            .oneshot(post_transcript(serde_json::json!({
                "reference": "https://youtu.be/abc123XYZ_-",
                "language": "en"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["video_id"], "abc123XYZ_-");
        assert_eq!(body["title"], "Title Text");
        assert_eq!(body["language"], "en");
        assert_eq!(body["filename"], "Title_Text_transcript.txt");
        assert_eq!(body["transcript"], "one\ntwo\nthree\nfour");
        assert_eq!(body["preview"], "one\ntwo\nthree");

        // The web front end never persists
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_download_sets_attachment_headers() {
        let (app, _dir) = test_router(english_provider());

        let request = Request::builder()
            .uri("/api/transcripts/download?reference=abc123XYZ_-")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Title_Text_transcript.txt\""
        );
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"one\ntwo\nthree\nfour");
    }

    #[tokio::test]
    async fn test_invalid_reference_is_bad_request() {
        let mut provider = MockCaptionProvider::new();
        provider.expect_list_tracks().never();
        let (app, _dir) = test_router(provider);

        let response = app
            .oneshot(post_transcript(serde_json::json!({ "reference": "not a url" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "invalid_reference");
        assert!(body["error"].as_str().unwrap().contains("Invalid YouTube URL"));
    }

    #[tokio::test]
    async fn test_malformed_language_is_bad_request() {
        let mut provider = MockCaptionProvider::new();
        provider.expect_list_tracks().never();
        let (app, _dir) = test_router(provider);

        let response = app
            .oneshot(post_transcript(serde_json::json!({
                "reference": "abc123XYZ_-",
                "language": "not a tag"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["kind"], "bad_request");
    }

    #[tokio::test]
    async fn test_missing_language_is_unprocessable() {
        let (app, _dir) = test_router(english_provider());

        let response = app
            .oneshot(post_transcript(serde_json::json!({
                "reference": "abc123XYZ_-",
                "language": "fr"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "language_unavailable");
        assert!(body["error"].as_str().unwrap().contains("'fr'"));
    }

    #[tokio::test]
    async fn test_network_failure_is_bad_gateway() {
        let mut provider = MockCaptionProvider::new();
        provider.expect_provider_name().return_const("mock");
        provider
            .expect_list_tracks()
            .times(3)
            .returning(|_| Err(ProviderError::Transport("connection reset".into())));
        let (app, _dir) = test_router(provider);

        let request = Request::builder()
            .uri("/api/transcripts/download?reference=abc123XYZ_-")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["kind"], "network_error");
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = test_router(MockCaptionProvider::new());
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[test]
    fn test_status_mapping() {
        let status = |e: Error| ApiError::from(e).status();
        assert_eq!(status(Error::InvalidReference("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(Error::LanguageUnavailable { requested: "fr".into() }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status(Error::NoTranscriptAvailable("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(Error::VideoUnavailable("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(Error::Network("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status(Error::Unclassified("x".into())), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_language() {
        assert!(parse_language(None).unwrap().is_none());
        assert!(parse_language(Some("  ")).unwrap().is_none());
        assert_eq!(parse_language(Some("en")).unwrap().unwrap().as_str(), "en");
        assert!(matches!(parse_language(Some("not a tag")), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_preview_takes_first_lines() {
        assert_eq!(preview("a\nb\nc\nd\ne"), "a\nb\nc");
        assert_eq!(preview("single"), "single");
    }
}
