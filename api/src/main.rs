// ./api/src/main.rs
mod config;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json as JsonResponse, Response},
    routing::{get, post, put},
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use application::{
    ApplicationError, CreateTouristRequest, TouristRepository, TouristService,
    UpdatePreferencesRequest,
};
use config::AppConfig;
use infrastructure::build_repository;

#[derive(Clone)]
struct AppState {
    tourist_service: Arc<TouristService>,
}

// Application entry point
#[tokio::main]
async fn main() {
    // .env must be loaded before the filter reads RUST_LOG
    let dotenv = dotenvy::dotenv();

    // --- Logger Initialization ---
    let filter = log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok());
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
    info!("Logger initialized successfully.");

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment from .env file.");
    }
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // --- Dependency Injection ---
    // The repository is built once here and shared by every request.
    let repository = match build_repository(&config.repository).await {
        Ok(repository) => repository,
        Err(e) => {
            error!("Failed to initialize repository: {}", e);
            std::process::exit(1);
        }
    };
    let tourist_service = Arc::new(TouristService::new(repository.clone()));
    info!("Application services initialized.");

    let app = router(AppState { tourist_service });
    info!("API routes configured.");

    // --- Server Startup ---
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server starting on {}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    let served = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(e) = &served {
        error!("Server error: {}", e);
    }

    // --- Teardown ---
    shutdown_repository(repository.as_ref()).await;
    if served.is_err() {
        std::process::exit(1);
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/tourists", post(create_tourist_handler).get(list_tourists_handler))
        .route(
            "/tourists/:id",
            get(get_tourist_handler).delete(delete_tourist_handler),
        )
        .route("/tourists/:id/preferences", put(update_preferences_handler))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, stopping server");
}

async fn shutdown_repository(repository: &dyn TouristRepository) {
    match repository.close().await {
        Ok(()) => info!("Repository and connections closed"),
        Err(e) => error!("Failed to close repository: {}", e),
    }
}

// --- API Handlers ---

async fn health_check() -> impl IntoResponse {
    info!("Health check endpoint called");
    (StatusCode::OK, "OK")
}

/// Handler for creating a tourist (POST /tourists).
async fn create_tourist_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateTouristRequest>, JsonRejection>,
) -> Response {
    info!("Received request to create tourist");
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return map_json_rejection_to_response(rejection),
    };
    match state.tourist_service.create_tourist(payload).await {
        Ok(tourist) => (StatusCode::CREATED, JsonResponse(tourist)).into_response(),
        Err(e) => {
            error!("Failed to create tourist via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Handler for listing tourists (GET /tourists).
async fn list_tourists_handler(State(state): State<AppState>) -> Response {
    info!("Received request to list tourists");
    match state.tourist_service.list_tourists().await {
        Ok(tourists) => (StatusCode::OK, JsonResponse(tourists)).into_response(),
        Err(e) => {
            error!("Failed to list tourists via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Handler for fetching one tourist (GET /tourists/:id).
async fn get_tourist_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    info!(tourist_id = %id, "Received request to get tourist");
    match state.tourist_service.get_tourist_by_id(&id).await {
        Ok(tourist) => (StatusCode::OK, JsonResponse(tourist)).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// Handler for replacing preferences (PUT /tourists/:id/preferences).
async fn update_preferences_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePreferencesRequest>, JsonRejection>,
) -> Response {
    info!(tourist_id = %id, "Received request to update preferences");
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return map_json_rejection_to_response(rejection),
    };
    match state.tourist_service.update_preferences(&id, payload).await {
        Ok(tourist) => (StatusCode::OK, JsonResponse(tourist)).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// Handler for deleting a tourist (DELETE /tourists/:id).
async fn delete_tourist_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    info!(tourist_id = %id, "Received request to delete tourist");
    match state.tourist_service.delete_tourist(&id).await {
        Ok(true) => (
            StatusCode::OK,
            JsonResponse(json!({ "message": "Tourist deleted successfully" })),
        )
            .into_response(),
        Ok(false) => map_application_error_to_response(ApplicationError::NotFound(id)),
        Err(e) => {
            error!(tourist_id = %id, "Failed to delete tourist via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Builds the log filter from a `RUST_LOG` value, defaulting to `info`.
fn log_filter(directives: Option<String>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives.unwrap_or_default())
}

/// Keeps axum's status for a rejected body but answers with the JSON error shape.
fn map_json_rejection_to_response(rejection: JsonRejection) -> Response {
    warn!("Rejected request body: {}", rejection.body_text());
    (
        rejection.status(),
        JsonResponse(json!({ "error": rejection.body_text() })),
    )
        .into_response()
}

/// Maps ApplicationError to an HTTP status code and JSON error body.
fn map_application_error_to_response(err: ApplicationError) -> Response {
    let (status, message) = match err {
        ApplicationError::NotFound(id) => {
            (StatusCode::NOT_FOUND, format!("Tourist '{}' not found", id))
        }
        ApplicationError::Validation(domain_err) => {
            warn!("Domain validation failed: {}", domain_err);
            (StatusCode::UNPROCESSABLE_ENTITY, domain_err.to_string())
        }
        ApplicationError::StorageUnavailable(msg) => {
            error!("Storage unavailable: {}", msg);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Storage is temporarily unavailable".to_string(),
            )
        }
        ApplicationError::Configuration(msg) => {
            error!("Configuration error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred".to_string(),
            )
        }
    };
    (status, JsonResponse(json!({ "error": message }))).into_response()
}
