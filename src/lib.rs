use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod matcher;
pub mod models;
pub mod policy;
pub mod repository;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser; // The resolved authenticated principal.
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the application entry point
// and the test suite.
pub use config::AppConfig;
pub use error::ApiError;
pub use lifecycle::{NoteLifecycle, NoteLifecycleState};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the
/// application by aggregating every `#[utoipa::path]`-decorated handler and
/// every `ToSchema` model. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_user, handlers::login_user, handlers::get_me,
        handlers::get_user, handlers::update_user, handlers::delete_user,
        handlers::list_users, handlers::create_note, handlers::get_published_notes,
        handlers::get_published_note, handlers::get_my_notes, handlers::get_notes_by_category,
        handlers::update_own_note, handlers::delete_note, handlers::get_moderation_notes,
        handlers::update_note_moderation, handlers::get_authors, handlers::get_author,
        handlers::create_category, handlers::get_categories, handlers::get_category
    ),
    components(
        schemas(
            models::Role, models::NoteStatus, models::UserProfile, models::Author,
            models::Category, models::Note, models::RegisterUserRequest, models::LoginRequest,
            models::UpdateUserRequest, models::AuthResponse, models::CreateNoteRequest,
            models::UpdateNoteRequest, models::CreateCategoryRequest,
        )
    ),
    tags(
        (name = "notehub", description = "Note publishing and moderation API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe container holding all application services and
/// configuration, shared across every incoming request.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: abstracts database access.
    pub repo: RepositoryState,
    /// The note lifecycle engine (which owns the category matcher).
    pub notes: NoteLifecycleState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations let handlers and extractors pull individual
// components out of the shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for NoteLifecycleState {
    fn from_ref(app_state: &AppState) -> NoteLifecycleState {
        app_state.notes.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the `authenticated_routes` block. The
/// `AuthUser` extractor performs bearer extraction and token validation; on
/// failure the request is rejected with the 401 envelope before any handler
/// runs, on success the request proceeds unchanged.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and
/// scoped middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: no middleware applied.
        .merge(public::public_routes())
        // Authenticated Routes: protected by the `auth_middleware`.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Moderation/Admin Routes: nested under '/admin'. The role checks run
        // inside the handlers after authentication.
        .nest("/admin", admin::admin_routes())
        // Apply the unified state to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (applied outermost)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID generation: a unique UUID per request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request tracing: wraps the request/response lifecycle in
                // a span carrying the request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes the `TraceLayer` span: every log line for a single request is
/// correlated by the `x-request-id` header alongside the method and URI.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
