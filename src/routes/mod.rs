/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated
/// modules, so access control is applied explicitly at the module level (via
/// Axum layers) and no protected endpoint is exposed by accident.

/// Routes accessible to anonymous clients: registration, login, and the
/// published-only read surface.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a valid bearer token.
pub mod authenticated;

/// Routes restricted to the privileged roles (`editor`/`admin` for
/// moderation, `admin` for categories and user listing).
pub mod admin;
