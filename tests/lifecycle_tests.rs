use notehub::auth::AuthUser;
use notehub::error::ApiError;
use notehub::lifecycle::NoteLifecycle;
use notehub::models::{Category, CreateNoteRequest, NoteStatus, Role, UpdateNoteRequest};
use notehub::repository::{MemoryRepository, RepositoryState};
use std::sync::Arc;
use uuid::Uuid;

fn engine() -> (RepositoryState, NoteLifecycle) {
    let repo: RepositoryState = Arc::new(MemoryRepository::new());
    let engine = NoteLifecycle::new(repo.clone());
    (repo, engine)
}

fn principal() -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        role: Role::User,
    }
}

async fn seed_category(repo: &RepositoryState, name: &str, description: Option<&str>) -> Uuid {
    let category = Category {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: description.map(str::to_string),
    };
    repo.create_category(&category).await.unwrap();
    category.id
}

fn note_request(title: &str, content: &str) -> CreateNoteRequest {
    CreateNoteRequest {
        title: title.to_string(),
        content: content.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_note_starts_as_draft_with_matched_categories() {
    let (repo, engine) = engine();
    let cooking = seed_category(&repo, "Cooking", None).await;

    let author = engine.ensure_author(&principal()).await.unwrap();
    let note = engine
        .create_note(
            &author,
            CreateNoteRequest {
                title: "Pasta".to_string(),
                content: "Cooking pasta is fun".to_string(),
                // A requested status must be ignored.
                status: Some(NoteStatus::Published),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(note.status, NoteStatus::Draft);
    assert!(note.published_at.is_none());
    assert_eq!(note.categories, vec![cooking]);
    assert_eq!(note.author_id, author.id);
}

#[tokio::test]
async fn test_ensure_author_is_created_once() {
    let (repo, engine) = engine();
    let alice = principal();

    let first = engine.ensure_author(&alice).await.unwrap();
    let second = engine.ensure_author(&alice).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.name, "alice");
    assert_eq!(first.publication_count, 0);

    assert_eq!(repo.get_authors().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_first_publish_stamps_published_at_and_bumps_count() {
    let (repo, engine) = engine();
    seed_category(&repo, "Cooking", None).await;

    let author = engine.ensure_author(&principal()).await.unwrap();
    let note = engine
        .create_note(&author, note_request("Pasta", "Cooking pasta is fun"))
        .await
        .unwrap();

    // Editor publishes the note.
    let published = engine
        .update_note(
            note.id,
            UpdateNoteRequest {
                status: Some(NoteStatus::Published),
                ..Default::default()
            },
            true,
        )
        .await
        .unwrap();

    assert_eq!(published.status, NoteStatus::Published);
    let stamped_at = published.published_at.expect("published_at must be set");
    assert_eq!(
        repo.get_author(author.id).await.unwrap().unwrap().publication_count,
        1
    );

    // A content-only edit by the author keeps both the stamp and the count.
    let edited = engine
        .update_note(
            note.id,
            UpdateNoteRequest {
                content: Some("Still all about cooking".to_string()),
                ..Default::default()
            },
            false,
        )
        .await
        .unwrap();

    assert_eq!(edited.published_at, Some(stamped_at));
    assert_eq!(edited.status, NoteStatus::Published);
    assert_eq!(
        repo.get_author(author.id).await.unwrap().unwrap().publication_count,
        1
    );
}

#[tokio::test]
async fn test_republishing_never_double_counts() {
    let (repo, engine) = engine();
    let author = engine.ensure_author(&principal()).await.unwrap();
    let note = engine
        .create_note(&author, note_request("Pasta", "plain text"))
        .await
        .unwrap();

    let publish = UpdateNoteRequest {
        status: Some(NoteStatus::Published),
        ..Default::default()
    };

    let published = engine.update_note(note.id, publish.clone(), true).await.unwrap();
    let stamped_at = published.published_at.unwrap();

    // Demote, then publish again.
    engine
        .update_note(
            note.id,
            UpdateNoteRequest {
                status: Some(NoteStatus::Pending),
                ..Default::default()
            },
            true,
        )
        .await
        .unwrap();
    let republished = engine.update_note(note.id, publish, true).await.unwrap();

    // The original stamp survives and the count stays at one.
    assert_eq!(republished.published_at, Some(stamped_at));
    assert_eq!(
        repo.get_author(author.id).await.unwrap().unwrap().publication_count,
        1
    );
}

#[tokio::test]
async fn test_non_privileged_patch_cannot_touch_status_or_rejection() {
    let (repo, engine) = engine();
    let author = engine.ensure_author(&principal()).await.unwrap();
    let note = engine
        .create_note(&author, note_request("Pasta", "plain text"))
        .await
        .unwrap();

    // Reject the note through the privileged path first.
    engine
        .update_note(
            note.id,
            UpdateNoteRequest {
                status: Some(NoteStatus::Rejected),
                rejection_reason: Some("too short".to_string()),
                ..Default::default()
            },
            true,
        )
        .await
        .unwrap();

    // A non-privileged patch carrying both fields leaves them untouched.
    let updated = engine
        .update_note(
            note.id,
            UpdateNoteRequest {
                title: Some("Better pasta".to_string()),
                status: Some(NoteStatus::Published),
                rejection_reason: Some("never mind".to_string()),
                ..Default::default()
            },
            false,
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "Better pasta");
    assert_eq!(updated.status, NoteStatus::Rejected);
    assert_eq!(updated.rejection_reason, Some("too short".to_string()));
    assert!(updated.published_at.is_none());
    assert_eq!(
        repo.get_author(author.id).await.unwrap().unwrap().publication_count,
        0
    );
}

#[tokio::test]
async fn test_content_change_fully_replaces_categories() {
    let (repo, engine) = engine();
    let cooking = seed_category(&repo, "Cooking", None).await;
    let travel = seed_category(&repo, "Travel", Some("wandering distant countries")).await;

    let author = engine.ensure_author(&principal()).await.unwrap();
    let note = engine
        .create_note(&author, note_request("Pasta", "Cooking pasta is fun"))
        .await
        .unwrap();
    assert_eq!(note.categories, vec![cooking]);

    // New content matches Travel (via the description word "wandering") and
    // no longer mentions cooking: the set is replaced, not merged.
    let updated = engine
        .update_note(
            note.id,
            UpdateNoteRequest {
                content: Some("Wandering across the coast".to_string()),
                ..Default::default()
            },
            false,
        )
        .await
        .unwrap();
    assert_eq!(updated.categories, vec![travel]);

    // A patch without content leaves the category set alone.
    let untouched = engine
        .update_note(
            note.id,
            UpdateNoteRequest {
                title: Some("On the road".to_string()),
                ..Default::default()
            },
            false,
        )
        .await
        .unwrap();
    assert_eq!(untouched.categories, vec![travel]);
}

#[tokio::test]
async fn test_update_missing_note_is_not_found() {
    let (_repo, engine) = engine();
    let err = engine
        .update_note(Uuid::new_v4(), UpdateNoteRequest::default(), true)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_create_note_validation() {
    let (_repo, engine) = engine();
    let author = engine.ensure_author(&principal()).await.unwrap();

    let err = engine
        .create_note(&author, note_request("", "content"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest { .. }));

    let long_title = "x".repeat(256);
    let err = engine
        .create_note(&author, note_request(&long_title, "content"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest { .. }));

    let err = engine
        .create_note(&author, note_request("Title", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest { .. }));

    let err = engine
        .create_note(
            &author,
            CreateNoteRequest {
                title: "Title".to_string(),
                content: "content".to_string(),
                img_url: Some("not a url".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest { .. }));
}

#[tokio::test]
async fn test_delete_note_is_hard_and_not_found_when_absent() {
    let (repo, engine) = engine();
    let author = engine.ensure_author(&principal()).await.unwrap();
    let note = engine
        .create_note(&author, note_request("Pasta", "plain text"))
        .await
        .unwrap();

    engine.delete_note(note.id).await.unwrap();
    assert!(repo.get_note(note.id).await.unwrap().is_none());

    let err = engine.delete_note(note.id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = engine.delete_note(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_notes_by_category_with_zero_matches_is_not_found() {
    let (repo, engine) = engine();
    let empty = seed_category(&repo, "Empty", None).await;

    let err = engine.notes_by_category(empty).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_published_projection_only_serves_published_notes() {
    let (_repo, engine) = engine();
    let author = engine.ensure_author(&principal()).await.unwrap();

    let draft = engine
        .create_note(&author, note_request("Draft", "text one"))
        .await
        .unwrap();
    let to_publish = engine
        .create_note(&author, note_request("Public", "text two"))
        .await
        .unwrap();

    engine
        .update_note(
            to_publish.id,
            UpdateNoteRequest {
                status: Some(NoteStatus::Published),
                ..Default::default()
            },
            true,
        )
        .await
        .unwrap();

    let published = engine.published_notes().await.unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].id, to_publish.id);

    assert!(engine.published_note(to_publish.id).await.is_ok());
    let err = engine.published_note(draft.id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_deleting_a_user_cascades_to_author_and_notes() {
    let (repo, engine) = engine();
    let alice = principal();

    repo.create_user(&notehub::models::User {
        id: alice.id,
        username: alice.username.clone(),
        email: alice.email.clone(),
        ..Default::default()
    })
    .await
    .unwrap();

    let author = engine.ensure_author(&alice).await.unwrap();
    let note = engine
        .create_note(&author, note_request("Pasta", "plain text"))
        .await
        .unwrap();

    assert!(repo.delete_user(alice.id).await.unwrap());
    assert!(repo.get_author(author.id).await.unwrap().is_none());
    assert!(repo.get_note(note.id).await.unwrap().is_none());
}
