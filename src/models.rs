use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;

// --- Validation Patterns ---

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://\S+$").expect("valid url regex"));

// --- Core Enumerations ---

/// Role
///
/// The RBAC field carried by every user and every issued token. `guest`
/// exists as the weakest tier; `editor` and `admin` are the privileged
/// moderation roles.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Editor,
    #[default]
    User,
    Guest,
}

impl Role {
    /// A privileged caller may alter note status and rejection fields.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Admin | Role::Editor)
    }
}

/// NoteStatus
///
/// The moderation lifecycle of a note. New notes always start in `draft`;
/// `published` and `rejected` are not terminal, but the first entry into
/// `published` permanently stamps the note's `published_at`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "note_status", rename_all = "lowercase")]
#[ts(export)]
pub enum NoteStatus {
    #[default]
    Draft,
    Pending,
    Published,
    Rejected,
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The canonical identity record. The credential hash is an argon2 PHC
/// string and is never serialized; API responses use [`UserProfile`].
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    // Unique across all users.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub bio: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// UserProfile
///
/// The sanitized projection of a [`User`] returned by the API. Credential
/// material never appears here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub bio: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            bio: user.bio,
            created_at: user.created_at,
        }
    }
}

/// Author
///
/// The public-facing identity under which notes are published. Wraps exactly
/// one user and is created lazily on that user's first note submission.
/// `publication_count` is monotonically non-decreasing and moves by exactly
/// one per note's first transition into `published`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Author {
    pub id: Uuid,
    // FK to users.id (1:1).
    pub user_id: Uuid,
    pub name: String,
    pub bio: String,
    pub publication_count: i64,
}

/// Category
///
/// An administrator-curated tag. Name is unique; the matcher uses the name
/// and the significant words of the description.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Note
///
/// The central publishable entity, owned by exactly one author.
///
/// Invariants enforced by the lifecycle engine:
/// - `published_at` is set iff the note has ever reached `published`, exactly
///   once, and is never cleared or overwritten afterwards.
/// - `categories` is always machine-derived from `content`.
/// - `rejection_reason` and `status` are untouchable by non-privileged edits.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Note {
    pub id: Uuid,
    // FK to authors.id (owner).
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub img_url: Option<String>,
    pub tags: Vec<String>,
    pub status: NoteStatus,
    // Machine-assigned category ids; fully replaced on content change.
    pub categories: Vec<Uuid>,
    pub likes: Vec<Uuid>,
    pub saves: Vec<Uuid>,
    // Meaningful only while status is `rejected`.
    pub rejection_reason: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input payload for POST /register. The plaintext password is hashed at the
/// auth boundary and never persisted or logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    // Defaults to `user` when absent.
    pub role: Option<Role>,
}

impl RegisterUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.username.trim().is_empty() {
            return Err(ApiError::bad_request_field(
                "Username is required",
                "username",
            ));
        }
        if !EMAIL_RE.is_match(self.email.trim()) {
            return Err(ApiError::bad_request_field("Invalid email address", "email"));
        }
        if self.password.trim().chars().count() < 6 {
            return Err(ApiError::bad_request_field(
                "Password must be at least 6 characters",
                "password",
            ));
        }
        Ok(())
    }
}

/// LoginRequest
///
/// Input payload for POST /login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// UpdateUserRequest
///
/// Partial update payload for PUT /users/{id}. A provided password is
/// re-hashed before it is stored.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(username) = &self.username {
            if username.trim().is_empty() {
                return Err(ApiError::bad_request_field(
                    "Username is required",
                    "username",
                ));
            }
        }
        if let Some(password) = &self.password {
            if password.trim().chars().count() < 6 {
                return Err(ApiError::bad_request_field(
                    "Password must be at least 6 characters",
                    "password",
                ));
            }
        }
        Ok(())
    }
}

/// AuthResponse
///
/// Output payload of both /register and /login: the sanitized user plus a
/// signed bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: String,
}

/// CreateNoteRequest
///
/// Input payload for POST /notes. A requested `status` is accepted on the
/// wire but ignored: new notes always start in `draft`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<NoteStatus>,
}

impl CreateNoteRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_title(&self.title)?;
        if self.content.is_empty() {
            return Err(ApiError::bad_request_field("Content is required", "content"));
        }
        if let Some(img_url) = &self.img_url {
            validate_img_url(img_url)?;
        }
        Ok(())
    }
}

/// UpdateNoteRequest
///
/// Partial update payload for PUT /notes/{id} and PUT /admin/notes/{id}.
/// Every field is optional; the lifecycle engine strips `status` and
/// `rejection_reason` for non-privileged callers before applying the patch.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateNoteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<NoteStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl UpdateNoteRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(content) = &self.content {
            if content.is_empty() {
                return Err(ApiError::bad_request_field("Content is required", "content"));
            }
        }
        if let Some(img_url) = &self.img_url {
            validate_img_url(img_url)?;
        }
        Ok(())
    }
}

/// CreateCategoryRequest
///
/// Input payload for the admin-only POST /admin/categories.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCategoryRequest {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateCategoryRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::bad_request_field(
                "Category name is required",
                "name",
            ));
        }
        Ok(())
    }
}

// --- Shared Field Validators ---

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::bad_request_field("Title is required", "title"));
    }
    if title.chars().count() > 255 {
        return Err(ApiError::bad_request_field(
            "Title must be at most 255 characters",
            "title",
        ));
    }
    Ok(())
}

fn validate_img_url(img_url: &str) -> Result<(), ApiError> {
    if !URL_RE.is_match(img_url) {
        return Err(ApiError::bad_request_field(
            "Image URL must be a valid http(s) URL",
            "img_url",
        ));
    }
    Ok(())
}
