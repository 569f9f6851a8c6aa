use chrono::Utc;
use notehub::models::{
    AuthResponse, Note, NoteStatus, Role, UpdateNoteRequest, UpdateUserRequest, User, UserProfile,
};
use uuid::Uuid;

#[test]
fn test_role_and_status_serialize_lowercase() {
    assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""admin""#);
    assert_eq!(serde_json::to_string(&Role::Editor).unwrap(), r#""editor""#);
    assert_eq!(
        serde_json::to_string(&NoteStatus::Published).unwrap(),
        r#""published""#
    );
    assert_eq!(
        serde_json::from_str::<NoteStatus>(r#""rejected""#).unwrap(),
        NoteStatus::Rejected
    );
    // The wire default for an unspecified role.
    assert_eq!(Role::default(), Role::User);
}

#[test]
fn test_user_serialization_never_exposes_the_credential_hash() {
    let user = User {
        id: Uuid::new_v4(),
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$secret".to_string(),
        role: Role::User,
        bio: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let json_output = serde_json::to_string(&user).unwrap();
    assert!(!json_output.contains("password_hash"));
    assert!(!json_output.contains("argon2id"));

    // The API-facing projection carries no credential field at all.
    let profile = UserProfile::from(user);
    let json_output = serde_json::to_string(&profile).unwrap();
    assert!(!json_output.contains("password"));
    assert!(json_output.contains(r#""username":"alice""#));
}

#[test]
fn test_update_note_request_optionality() {
    // Partial updates serialize only the provided fields.
    let partial_update = UpdateNoteRequest {
        title: Some("New Title Only".to_string()),
        ..Default::default()
    };

    let json_output = serde_json::to_string(&partial_update).unwrap();
    assert!(json_output.contains(r#""title":"New Title Only""#));
    assert!(!json_output.contains("content"));
    assert!(!json_output.contains("status"));
    assert!(!json_output.contains("rejection_reason"));

    // An empty JSON object deserializes into the all-None patch.
    let empty: UpdateNoteRequest = serde_json::from_str("{}").unwrap();
    assert!(empty.title.is_none());
    assert!(empty.status.is_none());
}

#[test]
fn test_update_user_request_optionality() {
    let partial: UpdateUserRequest = serde_json::from_str(r#"{"username":"new-name"}"#).unwrap();
    assert_eq!(partial.username.as_deref(), Some("new-name"));
    assert!(partial.password.is_none());
}

#[test]
fn test_note_default_shape() {
    let note = Note::default();
    assert_eq!(note.status, NoteStatus::Draft);
    assert!(note.published_at.is_none());
    assert!(note.categories.is_empty());

    // An unpublished note serializes its stamp as null, not as a bogus date.
    let json_output = serde_json::to_string(&note).unwrap();
    assert!(json_output.contains(r#""published_at":null"#));
}

#[test]
fn test_auth_response_roundtrip() {
    let response = AuthResponse {
        user: UserProfile {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: Role::Editor,
            bio: None,
            created_at: Utc::now(),
        },
        token: "token-value".to_string(),
    };

    let json_output = serde_json::to_string(&response).unwrap();
    let parsed: AuthResponse = serde_json::from_str(&json_output).unwrap();
    assert_eq!(parsed.user.id, response.user.id);
    assert_eq!(parsed.user.role, Role::Editor);
    assert_eq!(parsed.token, "token-value");
}
