// Provider Import - Web Server
// JSON API over the import engine and the provider store

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use provider_import::{
    get_all_providers, import_providers, insert_providers, open_database, search_stored,
    sources_from_payload, ImportReport, ProviderRecord,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
    limit: Option<usize>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/import - Run the import pipeline over submitted sources and
/// persist the kept records. A payload of the wrong shape aborts with 400;
/// per-source failures come back inside the report instead.
async fn import_handler(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    let sources = match sources_from_payload(&payload) {
        Ok(sources) => sources,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<ImportReport>::error(err.to_string())),
            )
                .into_response();
        }
    };

    let report = import_providers(&sources);

    {
        let mut db = state.db.lock().unwrap();
        if let Err(err) = insert_providers(&mut db, &report.data) {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<ImportReport>::error(format!(
                    "Failed to save providers: {}",
                    err
                ))),
            )
                .into_response();
        }
    }

    Json(ApiResponse::ok(report)).into_response()
}

/// GET /api/providers - All stored providers
async fn get_providers(State(state): State<AppState>) -> impl IntoResponse {
    let db = state.db.lock().unwrap();
    match get_all_providers(&db) {
        Ok(providers) => Json(ApiResponse::ok(providers)).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Vec<ProviderRecord>>::error(err.to_string())),
        )
            .into_response(),
    }
}

/// GET /api/providers/search?q=...&limit=... - Substring search
async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let query = params.q.unwrap_or_default();
    let limit = params.limit.unwrap_or(20);

    let db = state.db.lock().unwrap();
    match search_stored(&db, &query, limit) {
        Ok(providers) => Json(ApiResponse::ok(providers)).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Vec<ProviderRecord>>::error(err.to_string())),
        )
            .into_response(),
    }
}

// ============================================================================
// Server setup
// ============================================================================

#[tokio::main]
async fn main() {
    let db_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("providers.db"));

    let conn = match open_database(&db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("❌ Failed to open database {}: {}", db_path.display(), err);
            std::process::exit(1);
        }
    };

    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
    };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/import", post(import_handler))
        .route("/providers", get(get_providers))
        .route("/providers/search", get(search_handler))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let addr = "0.0.0.0:3000";
    println!("🌐 provider-server listening on http://{}", addr);
    println!("   Database: {}", db_path.display());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");
    axum::serve(listener, app).await.expect("Server error");
}
