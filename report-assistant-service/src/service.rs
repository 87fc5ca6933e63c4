use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use report_insight::{
    ArtifactKind, ArtifactStatus, GenerationClient, GenerationConfig, InMemorySessionStorage,
    MedicationSource, OpenRouterClient, PatientSession, PipelineError, ReportPipeline,
    RetryingClient, SessionStorage, StaticFormulary,
};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::models::{
    ArtifactResponse, ChatRequest, ChatResponse, MedicationListResponse, MedicationQuery,
    SessionCreatedResponse, SessionStatusResponse, TranscriptResponse, UploadReportResponse,
};

type ApiResult<T> = Result<Json<T>, ApiError>;
type ApiError = (StatusCode, Json<Value>);

/// Uploads above this size are rejected before extraction is attempted.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const GENERATION_RETRY_ATTEMPTS: u32 = 3;
const GENERATION_RETRY_BACKOFF: Duration = Duration::from_millis(500);

pub const MEDICATION_DISCLAIMER: &str =
    "These suggestions are informational and do not replace a medical evaluation. \
     Never take medication without professional guidance.";

const SEEK_DOCTOR_ADVICE: &str =
    "If you have concerns about your health, please consult a medical professional.";

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "session_id": id
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn pipeline_error_response(err: &PipelineError) -> ApiError {
    match err {
        PipelineError::DocumentMissing => {
            bad_request_error("No report has been uploaded for this session yet")
        }
        PipelineError::Extraction(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "We could not read this file as a medical report. Please upload a PDF with selectable text.",
                "details": e.to_string()
            })),
        ),
        PipelineError::Generation(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "error": "We could not analyze your report right now. Please try again in a moment.",
                "advice": SEEK_DOCTOR_ADVICE,
                "details": e.to_string()
            })),
        ),
        PipelineError::Storage(details) => internal_error("Failed to access session state", details),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionStorage>,
    pub pipeline: Arc<ReportPipeline>,
    pub medications: Arc<dyn MedicationSource>,
}

impl AppState {
    pub fn new(client: Arc<dyn GenerationClient>, chat_context_chars: usize) -> Self {
        Self {
            sessions: Arc::new(InMemorySessionStorage::new()),
            pipeline: Arc::new(ReportPipeline::new(client, chat_context_chars)),
            medications: Arc::new(StaticFormulary::builtin()),
        }
    }
}

pub fn create_app(config: &GenerationConfig) -> Router {
    let client: Arc<dyn GenerationClient> = Arc::new(RetryingClient::new(
        OpenRouterClient::new(config),
        GENERATION_RETRY_ATTEMPTS,
        GENERATION_RETRY_BACKOFF,
    ));
    build_router(AppState::new(client, config.chat_context_chars))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/sessions", post(create_session))
        .route("/sessions/{session_id}", get(session_status))
        .route("/sessions/{session_id}/document", post(upload_document))
        .route(
            "/sessions/{session_id}/report/simplified",
            get(simplified_report),
        )
        .route(
            "/sessions/{session_id}/report/simplified/download",
            get(download_simplified_report),
        )
        .route(
            "/sessions/{session_id}/report/highlights",
            get(health_highlights),
        )
        .route(
            "/sessions/{session_id}/report/recommendations",
            get(health_recommendations),
        )
        .route(
            "/sessions/{session_id}/chat",
            post(ask_question).get(get_transcript),
        )
        .route("/medications", get(search_medications))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Health Report Assistant",
        "version": "1.0.0",
        "description": "Understand medical exam reports: simplified explanations, health highlights, recommendations and chat",
        "endpoints": {
            "POST /sessions": "Create a new patient session",
            "GET /sessions/{session_id}": "Session status and artifact availability",
            "POST /sessions/{session_id}/document": "Upload a PDF report (raw bytes)",
            "GET /sessions/{session_id}/report/simplified": "Simplified version of the report",
            "GET /sessions/{session_id}/report/simplified/download": "Download the simplified report as text",
            "GET /sessions/{session_id}/report/highlights": "Health highlights from the report",
            "GET /sessions/{session_id}/report/recommendations": "Personalized health recommendations",
            "POST /sessions/{session_id}/chat": "Ask a question about the report",
            "GET /sessions/{session_id}/chat": "Conversation history for the current report",
            "GET /medications?search=term": "Search the medication reference table",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn create_session(State(state): State<AppState>) -> ApiResult<SessionCreatedResponse> {
    let session = PatientSession::new();
    let session_id = session.id.clone();

    state.sessions.save(session).await.map_err(|e| {
        error!("Failed to create session: {}", e);
        internal_error("Failed to create session", &e.to_string())
    })?;

    info!("Session {} created", session_id);
    Ok(Json(SessionCreatedResponse { session_id }))
}

async fn load_session(state: &AppState, session_id: &str) -> Result<PatientSession, ApiError> {
    match state.sessions.get(session_id).await {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(not_found_error("Session not found", session_id)),
        Err(e) => {
            error!("Failed to load session {}: {}", session_id, e);
            Err(internal_error("Failed to load session", &e.to_string()))
        }
    }
}

async fn session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionStatusResponse> {
    let session = load_session(&state, &session_id).await?;

    let mut artifacts = HashMap::new();
    let mut chat_turns = 0;
    let has_document = match session.current_document() {
        Ok(doc_state) => {
            for kind in ArtifactKind::ALL {
                artifacts.insert(kind.to_string(), doc_state.artifacts.status(kind));
            }
            chat_turns = doc_state.transcript.len();
            true
        }
        Err(_) => {
            for kind in ArtifactKind::ALL {
                artifacts.insert(kind.to_string(), ArtifactStatus::Absent);
            }
            false
        }
    };

    Ok(Json(SessionStatusResponse {
        session_id,
        has_document,
        artifacts,
        chat_turns,
    }))
}

async fn upload_document(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> ApiResult<UploadReportResponse> {
    if body.is_empty() {
        return Err(bad_request_error("A PDF report body is required"));
    }

    let session = load_session(&state, &session_id).await?;
    info!(
        "Uploading report for session {} ({} bytes)",
        session_id,
        body.len()
    );

    match state.pipeline.upload_document(&session, body.to_vec()).await {
        Ok(doc_state) => Ok(Json(UploadReportResponse {
            session_id,
            document_id: doc_state.document.id.to_string(),
            extracted_chars: doc_state.document.text.chars().count(),
            message: "Report received. Insights are generated on first access.".to_string(),
        })),
        Err(e) => {
            error!("Failed to process upload for session {}: {}", session_id, e);
            Err(pipeline_error_response(&e))
        }
    }
}

async fn simplified_report(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<ArtifactResponse> {
    artifact_response(&state, &session_id, ArtifactKind::SimplifiedReport).await
}

async fn health_highlights(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<ArtifactResponse> {
    artifact_response(&state, &session_id, ArtifactKind::HealthHighlights).await
}

async fn health_recommendations(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<ArtifactResponse> {
    artifact_response(&state, &session_id, ArtifactKind::HealthRecommendations).await
}

async fn artifact_response(
    state: &AppState,
    session_id: &str,
    kind: ArtifactKind,
) -> ApiResult<ArtifactResponse> {
    let session = load_session(state, session_id).await?;

    let result = match kind {
        ArtifactKind::SimplifiedReport => state.pipeline.simplified_report(&session).await,
        ArtifactKind::HealthHighlights => state.pipeline.health_highlights(&session).await,
        ArtifactKind::HealthRecommendations => {
            state.pipeline.health_recommendations(&session).await
        }
    };

    match result {
        Ok(content) => Ok(Json(ArtifactResponse {
            session_id: session_id.to_string(),
            artifact: kind.to_string(),
            content,
        })),
        Err(e) => {
            error!(
                "Failed to produce {} for session {}: {}",
                kind, session_id, e
            );
            Err(pipeline_error_response(&e))
        }
    }
}

/// Serves the simplified report as a plain-text attachment named with the
/// current date, e.g. `relatorio_simplificado_20250806.txt`.
async fn download_simplified_report(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, ApiError> {
    let session = load_session(&state, &session_id).await?;

    let content = state
        .pipeline
        .simplified_report(&session)
        .await
        .map_err(|e| {
            error!(
                "Failed to produce simplified report for session {}: {}",
                session_id, e
            );
            pipeline_error_response(&e)
        })?;

    let filename = format!(
        "relatorio_simplificado_{}.txt",
        chrono::Utc::now().format("%Y%m%d")
    );
    let headers = [
        (
            header::CONTENT_TYPE,
            "text/plain; charset=utf-8".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((headers, content).into_response())
}

async fn ask_question(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    if request.question.trim().is_empty() {
        return Err(bad_request_error("Question cannot be empty"));
    }

    let session = load_session(&state, &session_id).await?;

    match state
        .pipeline
        .answer_question(&session, &request.question)
        .await
    {
        Ok(answer) => Ok(Json(ChatResponse { answer })),
        Err(e) => {
            error!("Chat failed for session {}: {}", session_id, e);
            Err(pipeline_error_response(&e))
        }
    }
}

async fn get_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<TranscriptResponse> {
    let session = load_session(&state, &session_id).await?;

    let turns = session
        .current_document()
        .map(|doc_state| doc_state.transcript.snapshot())
        .unwrap_or_default();

    Ok(Json(TranscriptResponse { session_id, turns }))
}

async fn search_medications(
    State(state): State<AppState>,
    Query(query): Query<MedicationQuery>,
) -> ApiResult<MedicationListResponse> {
    let term = query.search.unwrap_or_default();
    let medications = state.medications.search(&term);
    info!(
        "Medication reference query '{}' matched {} records",
        term,
        medications.len()
    );

    Ok(Json(MedicationListResponse {
        medications,
        disclaimer: MEDICATION_DISCLAIMER.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use report_insight::{GenerationError, UploadedDocument};
    use tower::ServiceExt;

    use super::*;

    struct CannedClient;

    #[async_trait]
    impl GenerationClient for CannedClient {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Ok("Generated insight.".to_string())
        }
    }

    fn test_state() -> AppState {
        AppState::new(Arc::new(CannedClient), 10_000)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn medication_search_filters_by_name() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::get("/medications?search=ibuprofeno")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let medications = body["medications"].as_array().unwrap();
        assert_eq!(medications.len(), 1);
        assert_eq!(medications[0]["name"], "Ibuprofeno");
        assert!(!body["disclaimer"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn medication_search_without_term_returns_all() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::get("/medications").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["medications"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::get("/sessions/does-not-exist")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn chat_without_a_document_is_rejected() {
        let state = test_state();
        let session = PatientSession::with_id("s1");
        state.sessions.save(session).await.unwrap();

        let app = build_router(state);
        let response = app
            .oneshot(
                Request::post("/sessions/s1/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"question":"is this normal?"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn artifact_endpoints_serve_generated_content() {
        let state = test_state();
        let session = PatientSession::with_id("s2");
        session.replace_document(UploadedDocument::new(
            "Hemoglobina 13.5 g/dL".to_string(),
            21,
        ));
        state.sessions.save(session).await.unwrap();

        let app = build_router(state);
        let response = app
            .clone()
            .oneshot(
                Request::get("/sessions/s2/report/simplified")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["artifact"], "simplified_report");
        assert_eq!(body["content"], "Generated insight.");

        let status_response = app
            .oneshot(Request::get("/sessions/s2").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status_body = body_json(status_response).await;
        assert_eq!(status_body["has_document"], true);
        assert_eq!(status_body["artifacts"]["simplified_report"], "populated");
        assert_eq!(status_body["artifacts"]["health_highlights"], "absent");
    }

    #[tokio::test]
    async fn download_sets_dated_filename() {
        let state = test_state();
        let session = PatientSession::with_id("s3");
        session.replace_document(UploadedDocument::new("Glicemia 92 mg/dL".to_string(), 17));
        state.sessions.save(session).await.unwrap();

        let app = build_router(state);
        let response = app
            .oneshot(
                Request::get("/sessions/s3/report/simplified/download")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"relatorio_simplificado_"));
        assert!(disposition.ends_with(".txt\""));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"Generated insight.");
    }
}
