use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{Author, Category, Note, NoteStatus, User},
};

/// Repository Trait
///
/// The abstract contract for all persistence operations over User, Author,
/// Category, and Note entities. Handlers and the lifecycle engine interact
/// with durable state only through this trait, so the concrete backend
/// (Postgres in production, the in-memory mirror in tests) is swappable.
///
/// Entities are persisted as whole rows: the engine computes the next state
/// of an entity and the repository writes it. The single exception is
/// `increment_publications`, which is an atomic storage-side increment so
/// concurrent publications by one author cannot lose updates.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn create_user(&self, user: &User) -> Result<User, ApiError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, ApiError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
    async fn get_users(&self) -> Result<Vec<User>, ApiError>;
    async fn update_user(&self, user: &User) -> Result<Option<User>, ApiError>;
    // Deletes the user and cascades to its author profile and authored notes.
    async fn delete_user(&self, id: Uuid) -> Result<bool, ApiError>;

    // --- Authors ---
    async fn create_author(&self, author: &Author) -> Result<Author, ApiError>;
    async fn get_author(&self, id: Uuid) -> Result<Option<Author>, ApiError>;
    async fn get_author_by_user(&self, user_id: Uuid) -> Result<Option<Author>, ApiError>;
    async fn get_authors(&self) -> Result<Vec<Author>, ApiError>;
    // Atomic `publication_count + 1`; returns the updated author.
    async fn increment_publications(&self, author_id: Uuid) -> Result<Option<Author>, ApiError>;

    // --- Categories ---
    async fn create_category(&self, category: &Category) -> Result<Category, ApiError>;
    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, ApiError>;
    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>, ApiError>;
    async fn get_categories(&self) -> Result<Vec<Category>, ApiError>;

    // --- Notes ---
    async fn create_note(&self, note: &Note) -> Result<Note, ApiError>;
    async fn get_note(&self, id: Uuid) -> Result<Option<Note>, ApiError>;
    // Whole-row replacement; returns None when the note no longer exists.
    async fn update_note(&self, note: &Note) -> Result<Option<Note>, ApiError>;
    async fn delete_note(&self, id: Uuid) -> Result<bool, ApiError>;
    // Published notes, newest publication first.
    async fn get_published_notes(&self) -> Result<Vec<Note>, ApiError>;
    async fn get_notes_by_author(&self, author_id: Uuid) -> Result<Vec<Note>, ApiError>;
    async fn get_notes_by_category(&self, category_id: Uuid) -> Result<Vec<Note>, ApiError>;
    // Moderation view: every note regardless of status, newest first.
    async fn get_all_notes(&self) -> Result<Vec<Note>, ApiError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

// --- Postgres Implementation ---

/// PostgresRepository
///
/// The production implementation of the `Repository` trait, backed by the
/// schema in `migrations/`. Queries use the runtime API with `FromRow`
/// bindings; all failures are logged with their operation context and
/// surface as the generic internal error.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const NOTE_COLUMNS: &str = "id, author_id, title, content, img_url, tags, status, categories, \
                            likes, saves, rejection_reason, published_at, created_at, updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_user(&self, user: &User) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, email, password_hash, role, bio, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id, username, email, password_hash, role, bio, created_at, updated_at",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.bio)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ApiError::internal("create_user", e))
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ApiError::internal("get_user", e))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ApiError::internal("get_user_by_email", e))
    }

    async fn get_users(&self) -> Result<Vec<User>, ApiError> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ApiError::internal("get_users", e))
    }

    async fn update_user(&self, user: &User) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET username = $2, email = $3, password_hash = $4, role = $5, \
             bio = $6, updated_at = $7 WHERE id = $1 \
             RETURNING id, username, email, password_hash, role, bio, created_at, updated_at",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.bio)
        .bind(user.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ApiError::internal("update_user", e))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, ApiError> {
        // Author profile and authored notes go with the user (ON DELETE CASCADE).
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|res| res.rows_affected() > 0)
            .map_err(|e| ApiError::internal("delete_user", e))
    }

    async fn create_author(&self, author: &Author) -> Result<Author, ApiError> {
        sqlx::query_as::<_, Author>(
            "INSERT INTO authors (id, user_id, name, bio, publication_count) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, name, bio, publication_count",
        )
        .bind(author.id)
        .bind(author.user_id)
        .bind(&author.name)
        .bind(&author.bio)
        .bind(author.publication_count)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ApiError::internal("create_author", e))
    }

    async fn get_author(&self, id: Uuid) -> Result<Option<Author>, ApiError> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ApiError::internal("get_author", e))
    }

    async fn get_author_by_user(&self, user_id: Uuid) -> Result<Option<Author>, ApiError> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ApiError::internal("get_author_by_user", e))
    }

    async fn get_authors(&self) -> Result<Vec<Author>, ApiError> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ApiError::internal("get_authors", e))
    }

    async fn increment_publications(&self, author_id: Uuid) -> Result<Option<Author>, ApiError> {
        sqlx::query_as::<_, Author>(
            "UPDATE authors SET publication_count = publication_count + 1 WHERE id = $1 \
             RETURNING id, user_id, name, bio, publication_count",
        )
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ApiError::internal("increment_publications", e))
    }

    async fn create_category(&self, category: &Category) -> Result<Category, ApiError> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name, description) VALUES ($1, $2, $3) \
             RETURNING id, name, description",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ApiError::internal("create_category", e))
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, ApiError> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ApiError::internal("get_category", e))
    }

    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>, ApiError> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ApiError::internal("get_category_by_name", e))
    }

    async fn get_categories(&self) -> Result<Vec<Category>, ApiError> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ApiError::internal("get_categories", e))
    }

    async fn create_note(&self, note: &Note) -> Result<Note, ApiError> {
        sqlx::query_as::<_, Note>(&format!(
            "INSERT INTO notes ({NOTE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(note.id)
        .bind(note.author_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(&note.img_url)
        .bind(&note.tags)
        .bind(note.status)
        .bind(&note.categories)
        .bind(&note.likes)
        .bind(&note.saves)
        .bind(&note.rejection_reason)
        .bind(note.published_at)
        .bind(note.created_at)
        .bind(note.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ApiError::internal("create_note", e))
    }

    async fn get_note(&self, id: Uuid) -> Result<Option<Note>, ApiError> {
        sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ApiError::internal("get_note", e))
    }

    async fn update_note(&self, note: &Note) -> Result<Option<Note>, ApiError> {
        sqlx::query_as::<_, Note>(&format!(
            "UPDATE notes SET title = $2, content = $3, img_url = $4, tags = $5, status = $6, \
             categories = $7, likes = $8, saves = $9, rejection_reason = $10, \
             published_at = $11, updated_at = $12 WHERE id = $1 \
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(note.id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(&note.img_url)
        .bind(&note.tags)
        .bind(note.status)
        .bind(&note.categories)
        .bind(&note.likes)
        .bind(&note.saves)
        .bind(&note.rejection_reason)
        .bind(note.published_at)
        .bind(note.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ApiError::internal("update_note", e))
    }

    async fn delete_note(&self, id: Uuid) -> Result<bool, ApiError> {
        sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|res| res.rows_affected() > 0)
            .map_err(|e| ApiError::internal("delete_note", e))
    }

    async fn get_published_notes(&self) -> Result<Vec<Note>, ApiError> {
        sqlx::query_as::<_, Note>(
            "SELECT * FROM notes WHERE status = $1 ORDER BY published_at DESC",
        )
        .bind(NoteStatus::Published)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ApiError::internal("get_published_notes", e))
    }

    async fn get_notes_by_author(&self, author_id: Uuid) -> Result<Vec<Note>, ApiError> {
        sqlx::query_as::<_, Note>(
            "SELECT * FROM notes WHERE author_id = $1 ORDER BY created_at DESC",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ApiError::internal("get_notes_by_author", e))
    }

    async fn get_notes_by_category(&self, category_id: Uuid) -> Result<Vec<Note>, ApiError> {
        sqlx::query_as::<_, Note>(
            "SELECT * FROM notes WHERE $1 = ANY(categories) ORDER BY created_at DESC",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ApiError::internal("get_notes_by_category", e))
    }

    async fn get_all_notes(&self) -> Result<Vec<Note>, ApiError> {
        sqlx::query_as::<_, Note>("SELECT * FROM notes ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ApiError::internal("get_all_notes", e))
    }
}

// --- In-Memory Implementation (For Tests) ---

#[derive(Default)]
struct MemoryStore {
    users: HashMap<Uuid, User>,
    authors: HashMap<Uuid, Author>,
    categories: HashMap<Uuid, Category>,
    notes: HashMap<Uuid, Note>,
}

/// MemoryRepository
///
/// An in-process implementation of the `Repository` trait used by the test
/// suite. Behavior mirrors the Postgres implementation — including read
/// ordering and the user-delete cascade — so handler and engine tests run
/// without a database.
#[derive(Default)]
pub struct MemoryRepository {
    store: Mutex<MemoryStore>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, user: &User) -> Result<User, ApiError> {
        let mut store = self.store.lock().unwrap();
        store.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.store.lock().unwrap().users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn get_users(&self) -> Result<Vec<User>, ApiError> {
        let mut users: Vec<User> = self.store.lock().unwrap().users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_user(&self, user: &User) -> Result<Option<User>, ApiError> {
        let mut store = self.store.lock().unwrap();
        if !store.users.contains_key(&user.id) {
            return Ok(None);
        }
        store.users.insert(user.id, user.clone());
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut store = self.store.lock().unwrap();
        if store.users.remove(&id).is_none() {
            return Ok(false);
        }
        // Mirror the SQL cascade: author profile first, then authored notes.
        let author_ids: Vec<Uuid> = store
            .authors
            .values()
            .filter(|a| a.user_id == id)
            .map(|a| a.id)
            .collect();
        for author_id in &author_ids {
            store.authors.remove(author_id);
        }
        store
            .notes
            .retain(|_, note| !author_ids.contains(&note.author_id));
        Ok(true)
    }

    async fn create_author(&self, author: &Author) -> Result<Author, ApiError> {
        let mut store = self.store.lock().unwrap();
        store.authors.insert(author.id, author.clone());
        Ok(author.clone())
    }

    async fn get_author(&self, id: Uuid) -> Result<Option<Author>, ApiError> {
        Ok(self.store.lock().unwrap().authors.get(&id).cloned())
    }

    async fn get_author_by_user(&self, user_id: Uuid) -> Result<Option<Author>, ApiError> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .authors
            .values()
            .find(|a| a.user_id == user_id)
            .cloned())
    }

    async fn get_authors(&self) -> Result<Vec<Author>, ApiError> {
        let mut authors: Vec<Author> = self
            .store
            .lock()
            .unwrap()
            .authors
            .values()
            .cloned()
            .collect();
        authors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(authors)
    }

    async fn increment_publications(&self, author_id: Uuid) -> Result<Option<Author>, ApiError> {
        let mut store = self.store.lock().unwrap();
        match store.authors.get_mut(&author_id) {
            Some(author) => {
                author.publication_count += 1;
                Ok(Some(author.clone()))
            }
            None => Ok(None),
        }
    }

    async fn create_category(&self, category: &Category) -> Result<Category, ApiError> {
        let mut store = self.store.lock().unwrap();
        store.categories.insert(category.id, category.clone());
        Ok(category.clone())
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, ApiError> {
        Ok(self.store.lock().unwrap().categories.get(&id).cloned())
    }

    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>, ApiError> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .categories
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn get_categories(&self) -> Result<Vec<Category>, ApiError> {
        let mut categories: Vec<Category> = self
            .store
            .lock()
            .unwrap()
            .categories
            .values()
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn create_note(&self, note: &Note) -> Result<Note, ApiError> {
        let mut store = self.store.lock().unwrap();
        store.notes.insert(note.id, note.clone());
        Ok(note.clone())
    }

    async fn get_note(&self, id: Uuid) -> Result<Option<Note>, ApiError> {
        Ok(self.store.lock().unwrap().notes.get(&id).cloned())
    }

    async fn update_note(&self, note: &Note) -> Result<Option<Note>, ApiError> {
        let mut store = self.store.lock().unwrap();
        if !store.notes.contains_key(&note.id) {
            return Ok(None);
        }
        store.notes.insert(note.id, note.clone());
        Ok(Some(note.clone()))
    }

    async fn delete_note(&self, id: Uuid) -> Result<bool, ApiError> {
        Ok(self.store.lock().unwrap().notes.remove(&id).is_some())
    }

    async fn get_published_notes(&self) -> Result<Vec<Note>, ApiError> {
        let mut notes: Vec<Note> = self
            .store
            .lock()
            .unwrap()
            .notes
            .values()
            .filter(|n| n.status == NoteStatus::Published)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(notes)
    }

    async fn get_notes_by_author(&self, author_id: Uuid) -> Result<Vec<Note>, ApiError> {
        let mut notes: Vec<Note> = self
            .store
            .lock()
            .unwrap()
            .notes
            .values()
            .filter(|n| n.author_id == author_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    async fn get_notes_by_category(&self, category_id: Uuid) -> Result<Vec<Note>, ApiError> {
        let mut notes: Vec<Note> = self
            .store
            .lock()
            .unwrap()
            .notes
            .values()
            .filter(|n| n.categories.contains(&category_id))
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    async fn get_all_notes(&self) -> Result<Vec<Note>, ApiError> {
        let mut notes: Vec<Note> = self.store.lock().unwrap().notes.values().cloned().collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }
}
