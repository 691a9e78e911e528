//! # API Server Module
//!
//! ## Purpose
//! REST API server mapping the classifier and similarity ranker onto JSON
//! endpoints, plus case record CRUD and document upload.
//!
//! ## Input/Output Specification
//! - **Input**: HTTP requests with case text, upload bytes, record payloads
//! - **Output**: JSON responses with classification results, ranked match
//!   pages, stored records, system status
//! - **Status codes**: missing/empty text is 400; a valid query with zero
//!   candidates is 200 with zero counts; rejected uploads are 422 with the
//!   computed confidence so the caller can explain the refusal
//!
//! ## Key Features
//! - Explicit input structs validated before reaching the core functions
//! - CORS support for web frontends
//! - Structured error responses
//! - Per-request timing in responses

use crate::errors::MatchError;
use crate::extract;
use crate::ranker::RankedMatches;
use crate::similarity::ScoringStrategy;
use crate::utils::{TextUtils, Timer};
use crate::{AppState, CaseId, CaseRecord, CaseType};
use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// API server wrapping the shared application state
pub struct ApiServer {
    app_state: AppState,
}

/// Classification request payload
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub text: String,
}

/// Similar-case search request payload
#[derive(Debug, Deserialize)]
pub struct SimilarRequest {
    pub text: String,
    /// Declared case type; classified from the text when absent
    pub case_type: Option<CaseType>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub strategy: Option<ScoringStrategy>,
}

/// Similar-case search response payload
#[derive(Debug, Serialize)]
pub struct SimilarResponse {
    /// Category the pool was selected for
    pub detected_type: CaseType,
    #[serde(flatten)]
    pub results: RankedMatches,
    pub query_time_ms: u64,
}

/// Add-case request payload
#[derive(Debug, Deserialize)]
pub struct AddCaseRequest {
    pub title: String,
    pub full_text: String,
    /// Classified from the full text when absent
    pub case_type: Option<CaseType>,
    #[serde(default)]
    pub court: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub outcome: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub relevant_laws: Vec<String>,
    #[serde(default)]
    pub cited_cases: Vec<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
}

/// Upload query parameters
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: String,
}

impl ApiServer {
    /// Create new API server
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }

    /// Run the API server
    pub async fn run(self) -> crate::Result<()> {
        let config = self.app_state.config.clone();
        let bind_addr = format!("{}:{}", config.server.host, config.server.port);
        let payload_limit = config.server.max_payload_size_mb * 1024 * 1024;
        let enable_cors = config.server.enable_cors;

        tracing::info!("Starting API server on {}", bind_addr);

        let app_state = self.app_state;
        // Bind and detach the Server future before awaiting: HttpServer itself
        // is not Send and must not be held across the await point.
        let server = HttpServer::new(move || {
            let cors = if enable_cors {
                Cors::permissive()
            } else {
                Cors::default()
            };

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(app_state.clone()))
                .app_data(web::PayloadConfig::new(payload_limit))
                .app_data(web::JsonConfig::default().limit(payload_limit))
                .configure(configure_routes)
        })
        .bind(&bind_addr)
        .map_err(|e| crate::internal_error!("Failed to bind server to {}: {}", bind_addr, e))?
        .run();

        server
            .await
            .map_err(|e| crate::internal_error!("Server error: {}", e))?;

        Ok(())
    }
}

/// Route table, shared between the server and handler tests
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/classify", web::post().to(classify_handler))
        .route("/similar", web::post().to(similar_handler))
        .route("/cases", web::post().to(add_case_handler))
        .route("/cases/upload", web::post().to(upload_case_handler))
        .route("/cases/{id}", web::get().to(get_case_handler))
        .route("/cases/{id}", web::delete().to(delete_case_handler))
        .route("/health", web::get().to(health_handler))
        .route("/stats", web::get().to(stats_handler))
        .route("/", web::get().to(index_handler));
}

/// Map a core error onto an HTTP response
fn error_response(err: &MatchError) -> HttpResponse {
    match err {
        MatchError::InvalidInput { .. } | MatchError::ValidationFailed { .. } => {
            HttpResponse::BadRequest().json(serde_json::json!({
                "error": err.category(),
                "message": err.to_string(),
            }))
        }
        MatchError::NotALegalDocument {
            confidence,
            match_count,
        } => HttpResponse::UnprocessableEntity().json(serde_json::json!({
            "error": "not_a_legal_document",
            "message": err.to_string(),
            "confidence": confidence,
            "match_count": match_count,
        })),
        MatchError::UnsupportedFormat { extension } => {
            HttpResponse::UnsupportedMediaType().json(serde_json::json!({
                "error": "unsupported_format",
                "message": err.to_string(),
                "extension": extension,
                "supported": extract::SUPPORTED_EXTENSIONS,
            }))
        }
        MatchError::CaseNotFound { .. } => HttpResponse::NotFound().json(serde_json::json!({
            "error": "case_not_found",
            "message": err.to_string(),
        })),
        _ => {
            tracing::error!(category = err.category(), "Request failed: {}", err);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": err.category(),
                "message": err.to_string(),
            }))
        }
    }
}

fn require_text(field: &str, text: &str) -> Result<(), MatchError> {
    if text.trim().is_empty() {
        return Err(crate::invalid_input!(field, "must not be empty"));
    }
    Ok(())
}

/// Classification endpoint handler
async fn classify_handler(
    app_state: web::Data<AppState>,
    request: web::Json<ClassifyRequest>,
) -> ActixResult<HttpResponse> {
    if let Err(e) = require_text("text", &request.text) {
        return Ok(error_response(&e));
    }

    let result = app_state.classifier.classify(&request.text);
    Ok(HttpResponse::Ok().json(result))
}

/// Similar-case search endpoint handler
async fn similar_handler(
    app_state: web::Data<AppState>,
    request: web::Json<SimilarRequest>,
) -> ActixResult<HttpResponse> {
    let timer = Timer::new("similar_search");

    if let Err(e) = require_text("text", &request.text) {
        return Ok(error_response(&e));
    }

    let detected_type = match request.case_type {
        Some(case_type) => case_type,
        None => app_state.classifier.classify(&request.text).detected_type,
    };

    let pool = match app_state.ranker.select_pool(&app_state.store, detected_type) {
        Ok(pool) => pool,
        Err(e) => return Ok(error_response(&e)),
    };

    let offset = request.offset.unwrap_or(0);
    let limit = request.limit.unwrap_or(app_state.ranker.default_limit());
    let strategy = request.strategy.unwrap_or_default();

    let results = app_state
        .ranker
        .find_similar(&request.text, &pool, offset, limit, strategy);

    tracing::debug!(
        detected = %detected_type,
        pool_size = pool.len(),
        found = results.total_found,
        "Similarity search for '{}'",
        TextUtils::truncate(&request.text, 60)
    );

    Ok(HttpResponse::Ok().json(SimilarResponse {
        detected_type,
        results,
        query_time_ms: timer.stop(),
    }))
}

/// Add-case endpoint handler
async fn add_case_handler(
    app_state: web::Data<AppState>,
    request: web::Json<AddCaseRequest>,
) -> ActixResult<HttpResponse> {
    let request = request.into_inner();

    if let Err(e) = require_text("title", &request.title) {
        return Ok(error_response(&e));
    }
    if let Err(e) = require_text("full_text", &request.full_text) {
        return Ok(error_response(&e));
    }

    let case_type = match request.case_type {
        Some(case_type) => case_type,
        None => app_state.classifier.classify(&request.full_text).detected_type,
    };

    let record = CaseRecord {
        id: Uuid::new_v4(),
        title: request.title,
        case_type,
        court: request.court,
        year: request.year,
        outcome: request.outcome,
        summary: request.summary,
        full_text: request.full_text,
        relevant_laws: request.relevant_laws,
        cited_cases: request.cited_cases,
        key_points: request.key_points,
        created_at: Utc::now(),
    };

    match app_state.store.insert(record).await {
        Ok(stored) => Ok(HttpResponse::Created().json(stored)),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Upload endpoint handler: extract, validate, classify, store
async fn upload_case_handler(
    app_state: web::Data<AppState>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> ActixResult<HttpResponse> {
    let text = match extract::extract_text(&query.filename, &body) {
        Ok(text) => text,
        Err(e) => return Ok(error_response(&e)),
    };

    if let Err(e) = require_text("file", &text) {
        return Ok(error_response(&e));
    }

    // Uploads go through the reject policy; pasted text does not.
    let classification = match app_state.classifier.validate_legal_document(&text) {
        Ok(result) => result,
        Err(e) => return Ok(error_response(&e)),
    };

    tracing::debug!(
        "Upload '{}' accepted: {} ({} words)",
        query.filename,
        classification.detected_type,
        TextUtils::word_count(&text)
    );

    let title = query
        .title
        .clone()
        .unwrap_or_else(|| query.filename.clone());

    let record = CaseRecord {
        id: Uuid::new_v4(),
        title,
        case_type: classification.detected_type,
        court: String::new(),
        year: None,
        outcome: String::new(),
        summary: String::new(),
        full_text: text,
        relevant_laws: Vec::new(),
        cited_cases: Vec::new(),
        key_points: Vec::new(),
        created_at: Utc::now(),
    };

    match app_state.store.insert(record).await {
        Ok(stored) => Ok(HttpResponse::Created().json(serde_json::json!({
            "case": stored,
            "classification": classification,
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

fn parse_case_id(raw: &str) -> Result<CaseId, MatchError> {
    Uuid::parse_str(raw).map_err(|_| MatchError::InvalidInput {
        field: "id".to_string(),
        reason: format!("'{}' is not a valid case ID", raw),
    })
}

/// Fetch-case endpoint handler
async fn get_case_handler(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let case_id = match parse_case_id(&path) {
        Ok(id) => id,
        Err(e) => return Ok(error_response(&e)),
    };

    match app_state.store.get(&case_id) {
        Ok(Some(record)) => Ok(HttpResponse::Ok().json(record)),
        Ok(None) => Ok(error_response(&MatchError::CaseNotFound {
            id: case_id.to_string(),
        })),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Delete-case endpoint handler
async fn delete_case_handler(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let case_id = match parse_case_id(&path) {
        Ok(id) => id,
        Err(e) => return Ok(error_response(&e)),
    };

    match app_state.store.delete(&case_id) {
        Ok(true) => Ok(HttpResponse::NoContent().finish()),
        Ok(false) => Ok(error_response(&MatchError::CaseNotFound {
            id: case_id.to_string(),
        })),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Health check endpoint handler
async fn health_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let store_status = match app_state.store.health_check() {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let response = HealthResponse {
        status: store_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: store_status.to_string(),
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Statistics endpoint handler
async fn stats_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let storage_stats = match app_state.store.stats().await {
        Ok(stats) => stats,
        Err(e) => return Ok(error_response(&e)),
    };

    let response = serde_json::json!({
        "storage": storage_stats,
        "categories": CaseType::ALL.iter().map(|t| t.label()).collect::<Vec<_>>(),
    });

    Ok(HttpResponse::Ok().json(response))
}

/// Index page handler
async fn index_handler() -> ActixResult<HttpResponse> {
    let html = r#"
    <!DOCTYPE html>
    <html>
    <head>
        <title>Legal Case Matcher</title>
        <style>
            body { font-family: Arial, sans-serif; margin: 40px; }
            .header { color: #2c3e50; }
            .endpoint { margin: 20px 0; padding: 15px; background: #f8f9fa; border-radius: 5px; }
            .method { font-weight: bold; color: #27ae60; }
        </style>
    </head>
    <body>
        <h1 class="header">Legal Case Matcher API</h1>
        <p>Classify legal case text into categories and find similar stored cases.</p>

        <h2>Available Endpoints</h2>

        <div class="endpoint">
            <span class="method">POST</span> /classify
            <p>Detect the case category of a block of legal text.</p>
        </div>

        <div class="endpoint">
            <span class="method">POST</span> /similar
            <p>Rank stored cases by similarity to the given text.</p>
        </div>

        <div class="endpoint">
            <span class="method">POST</span> /cases
            <p>Store a new case record.</p>
        </div>

        <div class="endpoint">
            <span class="method">POST</span> /cases/upload?filename=...
            <p>Upload a document (TXT or PDF); the text is extracted, validated, classified and stored.</p>
        </div>

        <div class="endpoint">
            <span class="method">GET</span> /health &nbsp; <span class="method">GET</span> /stats
            <p>System status and storage statistics.</p>
        </div>

        <h2>Example Similarity Request</h2>
        <pre>{
  "text": "employment contract wage dispute before the tribunal",
  "limit": 10
}</pre>
    </body>
    </html>
    "#;

    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::CaseTypeClassifier;
    use crate::config::Config;
    use crate::ranker::SimilarityRanker;
    use crate::storage::CaseStore;
    use actix_web::{test, App};
    use std::sync::Arc;

    fn test_state(dir: &tempfile::TempDir) -> AppState {
        let mut config = Config::default();
        config.storage.db_path = dir.path().join("api_test.db");

        let classifier = Arc::new(CaseTypeClassifier::new(config.classifier.clone()));
        let ranker = Arc::new(SimilarityRanker::new(config.ranker.clone()).unwrap());
        let store = Arc::new(CaseStore::open(config.storage.clone()).unwrap());

        AppState {
            config: Arc::new(config),
            classifier,
            ranker,
            store,
        }
    }

    macro_rules! test_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state.clone()))
                    .configure(configure_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn server_future_can_be_spawned() {
        // The driver spawns the server onto the runtime, so the run() future
        // must be Send. Checked without binding a socket: the future is never
        // polled.
        fn assert_send<T: Send>(_: &T) {}

        let dir = tempfile::tempdir().unwrap();
        let server = ApiServer::new(test_state(&dir));
        let fut = server.run();
        assert_send(&fut);
        drop(fut);
    }

    #[actix_web::test]
    async fn classify_returns_detected_type() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(test_state(&dir));

        let req = test::TestRequest::post()
            .uri("/classify")
            .set_json(serde_json::json!({
                "text": "employment wage dismissal before the industrial dispute tribunal"
            }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["detected_type"], "Labour");
        assert!(body["match_count"].as_u64().unwrap() >= 3);
    }

    #[actix_web::test]
    async fn empty_text_is_a_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(test_state(&dir));

        for uri in ["/classify", "/similar"] {
            let req = test::TestRequest::post()
                .uri(uri)
                .set_json(serde_json::json!({ "text": "   " }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 400, "for {uri}");
        }
    }

    #[actix_web::test]
    async fn similar_with_empty_store_returns_zero_counts() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(test_state(&dir));

        let req = test::TestRequest::post()
            .uri("/similar")
            .set_json(serde_json::json!({ "text": "contract dispute" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["total_found"], 0);
        assert_eq!(body["highest_match"], 0.0);
        assert_eq!(body["has_more"], false);
    }

    #[actix_web::test]
    async fn case_crud_flow() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/cases")
            .set_json(serde_json::json!({
                "title": "Wage dispute appeal",
                "full_text": "employment wage dismissal of the workman upheld"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let created: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(created["case_type"], "Labour");
        let id = created["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/cases/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let req = test::TestRequest::delete()
            .uri(&format!("/cases/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 204);

        let req = test::TestRequest::get()
            .uri(&format!("/cases/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn similar_finds_stored_case() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/cases")
            .set_json(serde_json::json!({
                "title": "A",
                "full_text": "employment wage dismissal tribunal"
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);

        let req = test::TestRequest::post()
            .uri("/similar")
            .set_json(serde_json::json!({
                "text": "employment wage dismissal tribunal"
            }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["detected_type"], "Labour");
        assert_eq!(body["total_found"], 1);
        assert_eq!(body["matches"][0]["match_tier"], "Exact Match");
    }

    #[actix_web::test]
    async fn upload_rejects_unsupported_and_non_legal_content() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(test_state(&dir));

        let req = test::TestRequest::post()
            .uri("/cases/upload?filename=case.docx")
            .set_payload("whatever")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 415);

        let req = test::TestRequest::post()
            .uri("/cases/upload?filename=recipe.txt")
            .set_payload("chop the onions and simmer for ten minutes")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 422);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["confidence"].as_f64().unwrap() < 0.2);
    }

    #[actix_web::test]
    async fn upload_accepts_legal_txt() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(test_state(&dir));

        let req = test::TestRequest::post()
            .uri("/cases/upload?filename=judgment.txt&title=Appeal")
            .set_payload(
                "The plaintiff claims damages for breach of contract and seeks an injunction",
            )
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["case"]["title"], "Appeal");
        assert_eq!(body["case"]["case_type"], "Civil");
        assert!(body["classification"]["match_count"].as_u64().unwrap() >= 2);
    }
}
