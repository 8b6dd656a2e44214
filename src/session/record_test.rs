use super::*;

fn signed_in() -> SessionState {
    SessionState {
        id: Some(UserId::from("65f1")),
        username: "alice".to_owned(),
        plan: "plus".to_owned(),
        token: "v2.local.abc".to_owned(),
        avatar_url: "https://cdn.test/alice.png".to_owned(),
    }
}

// =============================================================================
// encode
// =============================================================================

#[test]
fn encode_writes_version_tag() {
    let raw = encode(&SessionState::default()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["version"], RECORD_VERSION);
    assert!(value["state"]["id"].is_null());
}

#[test]
fn encode_then_decode_preserves_state() {
    let state = signed_in();
    assert_eq!(decode(&encode(&state).unwrap()).unwrap(), state);
}

// =============================================================================
// decode: legacy layouts
// =============================================================================

#[test]
fn decode_legacy_record_without_avatar() {
    let raw = r#"{"id":"65f1","username":"alice","plan":"free","token":"T"}"#;
    let state = decode(raw).unwrap();
    assert_eq!(state.id, Some(UserId::from("65f1")));
    assert_eq!(state.token, "T");
    assert_eq!(state.avatar_url, "");
}

#[test]
fn decode_legacy_record_with_camel_case_avatar() {
    let raw = r#"{"id":"65f1","username":"alice","plan":"free","token":"T","avatarUrl":"https://cdn.test/a.png"}"#;
    assert_eq!(decode(raw).unwrap().avatar_url, "https://cdn.test/a.png");
}

#[test]
fn decode_legacy_numeric_id() {
    let raw = r#"{"id":1,"username":"a","plan":"pro","token":"T"}"#;
    assert_eq!(decode(raw).unwrap().id, Some(UserId::from("1")));
}

#[test]
fn decode_legacy_cleared_record() {
    let raw = r#"{"id":null,"username":"","plan":"","token":"","avatarUrl":""}"#;
    assert_eq!(decode(raw).unwrap(), SessionState::default());
}

// =============================================================================
// decode: rejects
// =============================================================================

#[test]
fn decode_rejects_garbage() {
    assert!(matches!(decode("not json"), Err(RecordError::Malformed(_))));
}

#[test]
fn decode_rejects_non_object() {
    assert!(matches!(decode("42"), Err(RecordError::Malformed(_))));
}

#[test]
fn decode_rejects_future_version() {
    let raw = r#"{"version":3,"state":{"id":null}}"#;
    assert!(matches!(decode(raw), Err(RecordError::UnsupportedVersion(3))));
}

#[test]
fn decode_rejects_token_without_id() {
    let raw = r#"{"id":null,"username":"","plan":"","token":"T"}"#;
    assert!(matches!(decode(raw), Err(RecordError::Inconsistent)));
}

#[test]
fn decode_rejects_id_without_token() {
    let raw = r#"{"version":2,"state":{"id":"1","username":"a","plan":"","token":"","avatar_url":""}}"#;
    assert!(matches!(decode(raw), Err(RecordError::Inconsistent)));
}
