use crate::{
    AppState,
    auth::{self, AuthUser},
    error::ApiError,
    models::{
        Author, AuthResponse, Category, CreateCategoryRequest, CreateNoteRequest, LoginRequest,
        Note, NoteStatus, RegisterUserRequest, UpdateNoteRequest, UpdateUserRequest, User,
        UserProfile,
    },
    policy,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

// --- Session Handlers ---

/// register_user
///
/// [Public Route] Creates a new account. The password is argon2-hashed before
/// it is stored; the response carries the sanitized profile and a signed
/// bearer token, so registration doubles as a login.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = AuthResponse),
        (status = 400, description = "Invalid input or duplicate email")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    payload.validate()?;

    let email = payload.email.trim().to_string();
    if state.repo.get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::bad_request_field(
            "User with this email already exists",
            "email",
        ));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        username: payload.username.trim().to_string(),
        email,
        password_hash: auth::hash_password(payload.password.trim())?,
        role: payload.role.unwrap_or_default(),
        bio: None,
        created_at: now,
        updated_at: now,
    };

    let created = state.repo.create_user(&user).await?;
    let token = auth::issue_token(&created, &state.config)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: created.into(),
            token,
        }),
    ))
}

/// login_user
///
/// [Public Route] Verifies credentials and issues a fresh bearer token.
/// Unknown e-mail and wrong password are indistinguishable to the caller.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Invalid credentials")
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::bad_request_field("Email must be provided", "email"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::bad_request_field(
            "Password must be provided",
            "password",
        ));
    }

    let user = state
        .repo
        .get_user_by_email(payload.email.trim())
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid credentials"))?;

    if !auth::verify_password(&payload.password, &user.password_hash)? {
        return Err(ApiError::bad_request("Invalid credentials"));
    }

    let token = auth::issue_token(&user, &state.config)?;

    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

// --- User Handlers ---

/// get_me
///
/// [Authenticated Route] Returns the authenticated user's current profile.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .repo
        .get_user(auth_user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User does not exist".to_string()))?;
    Ok(Json(user.into()))
}

/// get_user
///
/// [Authenticated Route] Returns a user profile by id. Self-or-admin gated.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 403, description = "Not self nor admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    policy::require_self_or_admin(Some(&auth_user), Some(id))?;

    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User does not exist".to_string()))?;
    Ok(Json(user.into()))
}

/// update_user
///
/// [Authenticated Route] Updates a user's username and/or password.
/// Self-or-admin gated; a new password is re-hashed before storage.
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserProfile),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    policy::require_self_or_admin(Some(&auth_user), Some(id))?;
    payload.validate()?;

    let mut user = state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No user found".to_string()))?;

    if let Some(username) = payload.username {
        user.username = username.trim().to_string();
    }
    if let Some(password) = payload.password {
        user.password_hash = auth::hash_password(password.trim())?;
    }
    user.updated_at = Utc::now();

    let updated = state
        .repo
        .update_user(&user)
        .await?
        .ok_or_else(|| ApiError::NotFound("No user found".to_string()))?;
    Ok(Json(updated.into()))
}

/// delete_user
///
/// [Authenticated Route] Removes an account. Self-or-admin gated. The user's
/// author profile and authored notes are deleted with it.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    policy::require_self_or_admin(Some(&auth_user), Some(id))?;

    if state.repo.delete_user(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("User not found".to_string()))
    }
}

/// list_users
///
/// [Admin Route] Lists every account in the system.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses((status = 200, description = "All users", body = [UserProfile]))
)]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    policy::require_admin(Some(&auth_user))?;

    let users = state.repo.get_users().await?;
    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

// --- Note Handlers ---

/// create_note
///
/// [Authenticated Route] Submits a new note. The author profile is created
/// lazily on the caller's first submission; the note always starts in `draft`
/// with its category set derived from the content.
#[utoipa::path(
    post,
    path = "/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Created", body = Note),
        (status = 400, description = "Invalid note data")
    )
)]
pub async fn create_note(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let author = state.notes.ensure_author(&auth_user).await?;
    let note = state.notes.create_note(&author, payload).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// get_published_notes
///
/// [Public Route] Lists all published notes, newest publication first. Notes
/// in any other status are never visible here.
#[utoipa::path(
    get,
    path = "/notes",
    responses((status = 200, description = "Published notes", body = [Note]))
)]
pub async fn get_published_notes(
    State(state): State<AppState>,
) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.notes.published_notes().await?))
}

/// get_published_note
///
/// [Public Route] Retrieves a single note by id, visible only while its
/// status is `published`.
#[utoipa::path(
    get,
    path = "/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Found", body = Note),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_published_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(state.notes.published_note(id).await?))
}

/// get_my_notes
///
/// [Authenticated Route] Lists every note owned by the requesting user,
/// whatever its status. A user who never submitted a note has no author
/// profile yet and simply gets an empty list.
#[utoipa::path(
    get,
    path = "/me/notes",
    responses((status = 200, description = "My notes", body = [Note]))
)]
pub async fn get_my_notes(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Note>>, ApiError> {
    match state.repo.get_author_by_user(auth_user.id).await? {
        Some(author) => Ok(Json(state.notes.notes_by_author(author.id).await?)),
        None => Ok(Json(Vec::new())),
    }
}

/// get_notes_by_category
///
/// [Public Route] Lists notes carrying the given category. Zero matches is
/// reported as 404 rather than an empty list.
#[utoipa::path(
    get,
    path = "/categories/{id}/notes",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Notes in category", body = [Note]),
        (status = 404, description = "No note in this category")
    )
)]
pub async fn get_notes_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.notes.notes_by_category(category_id).await?))
}

/// update_own_note
///
/// [Authenticated Route] Lets the owning author edit a note's content. The
/// only status an owner may request is `draft`; the lifecycle engine strips
/// `status` and `rejection_reason` from the patch regardless, so a
/// non-privileged caller can never self-publish or clear a rejection.
#[utoipa::path(
    put,
    path = "/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Updated", body = Note),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_own_note(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNoteRequest>,
) -> Result<Json<Note>, ApiError> {
    let owner = note_owner(&state, id).await?;
    policy::require_self(Some(&auth_user), Some(owner.user_id))?;

    if let Some(status) = payload.status {
        if status != NoteStatus::Draft {
            return Err(ApiError::bad_request_field(
                "Notes can only be set to draft for users",
                "status",
            ));
        }
    }

    let note = state.notes.update_note(id, payload, false).await?;
    Ok(Json(note))
}

/// delete_note
///
/// [Authenticated Route] Hard-deletes a note. Allowed for the owning author
/// and for editors/admins.
#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not owner nor privileged"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_note(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let owner = note_owner(&state, id).await?;
    policy::require_self_or_editor_or_admin(Some(&auth_user), Some(owner.user_id))?;

    state.notes.delete_note(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// get_moderation_notes
///
/// [Moderation Route] Lists every note in the system regardless of status,
/// newest first. Editor/admin gated.
#[utoipa::path(
    get,
    path = "/admin/notes",
    responses((status = 200, description = "All notes", body = [Note]))
)]
pub async fn get_moderation_notes(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Note>>, ApiError> {
    policy::require_editor_or_admin(Some(&auth_user))?;
    Ok(Json(state.notes.all_notes().await?))
}

/// update_note_moderation
///
/// [Moderation Route] The privileged update path: editors and admins may
/// patch any field, including status and rejection reason. The first
/// transition into `published` stamps `published_at` and bumps the author's
/// publication count.
#[utoipa::path(
    put,
    path = "/admin/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Updated", body = Note),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_note_moderation(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNoteRequest>,
) -> Result<Json<Note>, ApiError> {
    policy::require_editor_or_admin(Some(&auth_user))?;

    let note = state.notes.update_note(id, payload, true).await?;
    Ok(Json(note))
}

// --- Author Handlers ---

/// get_authors
///
/// [Public Route] Lists all author profiles.
#[utoipa::path(
    get,
    path = "/authors",
    responses((status = 200, description = "Authors", body = [Author]))
)]
pub async fn get_authors(State(state): State<AppState>) -> Result<Json<Vec<Author>>, ApiError> {
    Ok(Json(state.repo.get_authors().await?))
}

/// get_author
///
/// [Public Route] Retrieves a single author profile by id.
#[utoipa::path(
    get,
    path = "/authors/{id}",
    params(("id" = Uuid, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Found", body = Author),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Author>, ApiError> {
    let author = state
        .repo
        .get_author(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Author does not exist".to_string()))?;
    Ok(Json(author))
}

// --- Category Handlers ---

/// create_category
///
/// [Admin Route] Adds a category to the curated set. Names are unique.
#[utoipa::path(
    post,
    path = "/admin/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 400, description = "Duplicate name")
    )
)]
pub async fn create_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    policy::require_admin(Some(&auth_user))?;
    payload.validate()?;

    let name = payload.name.trim().to_string();
    if state.repo.get_category_by_name(&name).await?.is_some() {
        return Err(ApiError::bad_request_field(
            "Category with this name already exists",
            "name",
        ));
    }

    let category = Category {
        id: Uuid::new_v4(),
        name,
        description: payload.description,
    };
    let created = state.repo.create_category(&category).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// get_categories
///
/// [Admin Route] Lists the full category set.
#[utoipa::path(
    get,
    path = "/admin/categories",
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn get_categories(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    policy::require_admin(Some(&auth_user))?;
    Ok(Json(state.repo.get_categories().await?))
}

/// get_category
///
/// [Admin Route] Retrieves a single category by id.
#[utoipa::path(
    get,
    path = "/admin/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Found", body = Category),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Category>, ApiError> {
    policy::require_admin(Some(&auth_user))?;

    let category = state
        .repo
        .get_category(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category does not exist".to_string()))?;
    Ok(Json(category))
}

// --- Shared Lookups ---

/// Resolves the author that owns a note, for ownership checks. A note whose
/// author record is missing is a broken reference and surfaces as internal.
async fn note_owner(state: &AppState, note_id: Uuid) -> Result<Author, ApiError> {
    let note = state
        .repo
        .get_note(note_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;

    state
        .repo
        .get_author(note.author_id)
        .await?
        .ok_or_else(|| ApiError::internal("note_owner", "note references a missing author"))
}
