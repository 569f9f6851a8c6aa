use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Defines the routes available to any user with a valid bearer token. All
/// core authoring features live here: note submission, content edits,
/// deletion, and account self-management.
///
/// Access Control Strategy:
/// The router layer above this module runs the `AuthUser` extractor as
/// middleware, so every handler receives a resolved principal. Ownership and
/// role restrictions beyond plain authentication are evaluated inside the
/// handlers through the policy functions — the handler passes the principal
/// and the resolved resource owner explicitly.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // The authenticated user's own profile.
        .route("/me", get(handlers::get_me))
        // GET /me/notes
        // Every note the user owns, regardless of status.
        .route("/me/notes", get(handlers::get_my_notes))
        // POST /notes
        // Submits a new note. Creates the author profile on first use;
        // the note starts in `draft` with machine-assigned categories.
        .route("/notes", post(handlers::create_note))
        // PUT/DELETE /notes/{id}
        // Owner-only content edit (status `draft` at most) and owner-or-
        // privileged deletion.
        .route(
            "/notes/{id}",
            put(handlers::update_own_note).delete(handlers::delete_note),
        )
        // GET/PUT/DELETE /users/{id}
        // Account reads and mutations, self-or-admin gated in the handlers.
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
}
