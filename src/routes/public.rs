use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are accessible to any client, anonymous or logged
/// in: the identity gateway (register/login) and the published-only read
/// surface.
///
/// Visibility rule: every note retrieval handler reachable from here serves
/// notes whose status is `published` and nothing else; drafts, pending
/// submissions, and rejected notes never leave the authenticated or
/// moderation surfaces.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated endpoint used for monitoring and load balancer
        // checks. Returns "ok" immediately.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // Account creation. Hashes the credential and issues a bearer token.
        .route("/register", post(handlers::register_user))
        // POST /login
        // Credential verification and token issuance.
        .route("/login", post(handlers::login_user))
        // GET /notes
        // Lists all published notes, newest publication first.
        .route("/notes", get(handlers::get_published_notes))
        // GET /notes/{id}
        // Retrieves a single note, visible only while published.
        .route("/notes/{id}", get(handlers::get_published_note))
        // GET /categories/{id}/notes
        // Lists the notes carrying a category. Zero matches is a 404.
        .route(
            "/categories/{id}/notes",
            get(handlers::get_notes_by_category),
        )
        // GET /authors and /authors/{id}
        // Public author directory.
        .route("/authors", get(handlers::get_authors))
        .route("/authors/{id}", get(handlers::get_author))
}
