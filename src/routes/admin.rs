use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Defines the moderation and curation surface, nested under `/admin`.
///
/// Access Control:
/// Every handler here authenticates through the `AuthUser` extractor and then
/// runs its policy check explicitly: moderation endpoints admit editors and
/// admins, category curation and user listing admit admins only.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/notes
        // The moderation queue: every note in the system regardless of
        // status. Editor/admin.
        .route("/notes", get(handlers::get_moderation_notes))
        // PUT /admin/notes/{id}
        // The privileged update path: any field may change, including status
        // and rejection reason. Editor/admin.
        .route("/notes/{id}", put(handlers::update_note_moderation))
        // POST/GET /admin/categories
        // Curated category set management. Admin only.
        .route(
            "/categories",
            post(handlers::create_category).get(handlers::get_categories),
        )
        // GET /admin/categories/{id}
        .route("/categories/{id}", get(handlers::get_category))
        // GET /admin/users
        // Full account listing. Admin only.
        .route("/users", get(handlers::list_users))
}
