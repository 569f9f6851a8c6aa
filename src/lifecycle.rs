use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ApiError,
    matcher::CategoryMatcher,
    models::{Author, CreateNoteRequest, Note, NoteStatus, UpdateNoteRequest},
    repository::RepositoryState,
};

/// NoteLifecycle
///
/// Owns every status transition and mutation of the note entity. The engine
/// is a stateless value over the repository: all durable state lives behind
/// the `Repository` trait, and the engine re-derives the category set through
/// the matcher whenever note content changes.
///
/// Actor-class rules enforced here:
/// - New notes start in `draft` no matter what the caller requested.
/// - Non-privileged patches never touch `status` or `rejection_reason`.
/// - `published_at` is stamped exactly once, on the first transition into
///   `published`, and the owning author's publication count moves by exactly
///   one at that same moment — never on later edits or re-publications.
pub struct NoteLifecycle {
    repo: RepositoryState,
    matcher: CategoryMatcher,
}

/// NoteLifecycleState
///
/// The shared handle placed in the application state.
pub type NoteLifecycleState = Arc<NoteLifecycle>;

impl NoteLifecycle {
    pub fn new(repo: RepositoryState) -> Self {
        let matcher = CategoryMatcher::new(repo.clone());
        Self { repo, matcher }
    }

    /// ensure_author
    ///
    /// Resolves the author profile behind an authenticated principal, creating
    /// it on first use. The profile starts with the user's username as its
    /// display name, the user's bio (empty when unset), and a zero
    /// publication count.
    pub async fn ensure_author(&self, principal: &AuthUser) -> Result<Author, ApiError> {
        if let Some(author) = self.repo.get_author_by_user(principal.id).await? {
            return Ok(author);
        }

        let bio = self
            .repo
            .get_user(principal.id)
            .await?
            .and_then(|user| user.bio)
            .unwrap_or_default();

        let author = Author {
            id: Uuid::new_v4(),
            user_id: principal.id,
            name: principal.username.clone(),
            bio,
            publication_count: 0,
        };
        self.repo.create_author(&author).await
    }

    /// create_note
    ///
    /// Validates the payload, forces the initial status to `draft`, computes
    /// the category set from the content (before persistence), and stores the
    /// note under the given author.
    pub async fn create_note(
        &self,
        author: &Author,
        req: CreateNoteRequest,
    ) -> Result<Note, ApiError> {
        req.validate()?;

        let categories = self.matcher.assign_categories(&req.content).await?;
        let now = Utc::now();

        let note = Note {
            id: Uuid::new_v4(),
            author_id: author.id,
            title: req.title,
            content: req.content,
            img_url: req.img_url,
            tags: req.tags.unwrap_or_default(),
            // A requested status is ignored; every note begins as a draft.
            status: NoteStatus::Draft,
            categories,
            likes: Vec::new(),
            saves: Vec::new(),
            rejection_reason: None,
            published_at: None,
            created_at: now,
            updated_at: now,
        };

        self.repo.create_note(&note).await
    }

    /// update_note
    ///
    /// Applies a partial update to a note.
    ///
    /// Non-privileged callers have `status` and `rejection_reason` stripped
    /// from the patch before it is applied. A content change recomputes the
    /// category set, which fully replaces the previous one. The first
    /// transition into `published` (previous status not published and no
    /// `published_at` yet) stamps the publication time and, once the note row
    /// is committed, increments the author's publication count; a failure of
    /// that increment is logged and does not undo the committed note update.
    pub async fn update_note(
        &self,
        id: Uuid,
        patch: UpdateNoteRequest,
        privileged: bool,
    ) -> Result<Note, ApiError> {
        patch.validate()?;

        let mut patch = patch;
        if !privileged {
            patch.status = None;
            patch.rejection_reason = None;
        }

        let existing = self
            .repo
            .get_note(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;

        let mut note = existing.clone();

        if let Some(title) = patch.title {
            note.title = title;
        }
        if let Some(content) = patch.content {
            // Category recomputation happens-before the note is persisted.
            note.categories = self.matcher.assign_categories(&content).await?;
            note.content = content;
        }
        if let Some(img_url) = patch.img_url {
            note.img_url = Some(img_url);
        }
        if let Some(tags) = patch.tags {
            note.tags = tags;
        }
        if let Some(reason) = patch.rejection_reason {
            note.rejection_reason = Some(reason);
        }

        let mut first_publish = false;
        if let Some(status) = patch.status {
            if status == NoteStatus::Published
                && existing.status != NoteStatus::Published
                && existing.published_at.is_none()
            {
                note.published_at = Some(Utc::now());
                first_publish = true;
            }
            note.status = status;
        }
        note.updated_at = Utc::now();

        let updated = self
            .repo
            .update_note(&note)
            .await?
            .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;

        if first_publish {
            // The note row is already committed; this side effect stands alone.
            match self.repo.increment_publications(updated.author_id).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    tracing::warn!(
                        operation = "update_note",
                        note_id = %updated.id,
                        author_id = %updated.author_id,
                        "author record missing, publication count not incremented"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        operation = "update_note",
                        note_id = %updated.id,
                        error = ?e,
                        "publication count increment failed after note commit"
                    );
                }
            }
        }

        Ok(updated)
    }

    /// delete_note
    ///
    /// Unconditional hard delete. NotFound when the note is absent.
    pub async fn delete_note(&self, id: Uuid) -> Result<(), ApiError> {
        if self.repo.delete_note(id).await? {
            Ok(())
        } else {
            Err(ApiError::NotFound("Note not found".to_string()))
        }
    }

    // --- Read Projections ---

    /// All published notes, newest publication first.
    pub async fn published_notes(&self) -> Result<Vec<Note>, ApiError> {
        self.repo.get_published_notes().await
    }

    /// A single note, visible only while published.
    pub async fn published_note(&self, id: Uuid) -> Result<Note, ApiError> {
        match self.repo.get_note(id).await? {
            Some(note) if note.status == NoteStatus::Published => Ok(note),
            _ => Err(ApiError::NotFound("Note not found".to_string())),
        }
    }

    /// Every note owned by the given author, regardless of status.
    pub async fn notes_by_author(&self, author_id: Uuid) -> Result<Vec<Note>, ApiError> {
        self.repo.get_notes_by_author(author_id).await
    }

    /// Notes carrying the given category. An empty result is reported as
    /// NotFound rather than an empty list.
    pub async fn notes_by_category(&self, category_id: Uuid) -> Result<Vec<Note>, ApiError> {
        let notes = self.repo.get_notes_by_category(category_id).await?;
        if notes.is_empty() {
            return Err(ApiError::NotFound("No note in this category".to_string()));
        }
        Ok(notes)
    }

    /// The moderation view: every note in the system, newest first.
    pub async fn all_notes(&self) -> Result<Vec<Note>, ApiError> {
        self.repo.get_all_notes().await
    }
}
