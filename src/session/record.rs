//! On-disk layout of the persisted session record.
//!
//! Current layout (version 2):
//!
//! ```json
//! { "version": 2, "state": { "id": "…", "username": "…", "plan": "…", "token": "…", "avatar_url": "…" } }
//! ```
//!
//! Untagged records predate versioning. They are the flat shape
//! `{ id, username, plan, token, avatarUrl? }` and are migrated on decode;
//! the earliest of them carry no `avatarUrl` at all.

use serde::{Deserialize, Serialize};

use super::state::{SessionState, UserId};

pub const RECORD_VERSION: u64 = 2;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("malformed session record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported session record version {0}")]
    UnsupportedVersion(u64),
    #[error("session record has an id without a token or a token without an id")]
    Inconsistent,
}

#[derive(Serialize)]
struct VersionedRecordRef<'a> {
    version: u64,
    state: &'a SessionState,
}

#[derive(Deserialize)]
struct VersionedRecord {
    state: SessionState,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyRecord {
    id: Option<UserId>,
    #[serde(default)]
    username: String,
    #[serde(default)]
    plan: String,
    #[serde(default)]
    token: String,
    #[serde(default)]
    avatar_url: Option<String>,
}

impl From<LegacyRecord> for SessionState {
    fn from(legacy: LegacyRecord) -> Self {
        Self {
            id: legacy.id,
            username: legacy.username,
            plan: legacy.plan,
            token: legacy.token,
            avatar_url: legacy.avatar_url.unwrap_or_default(),
        }
    }
}

/// Serialize `state` in the current layout.
pub fn encode(state: &SessionState) -> Result<String, RecordError> {
    let record = VersionedRecordRef { version: RECORD_VERSION, state };
    Ok(serde_json::to_string(&record)?)
}

/// Parse a stored record of any known layout into the current state shape.
pub fn decode(raw: &str) -> Result<SessionState, RecordError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;

    let state = match value.get("version") {
        Some(version) => {
            let version = version.as_u64().unwrap_or(0);
            if version != RECORD_VERSION {
                return Err(RecordError::UnsupportedVersion(version));
            }
            serde_json::from_value::<VersionedRecord>(value)?.state
        }
        None => serde_json::from_value::<LegacyRecord>(value)?.into(),
    };

    if !state.is_consistent() {
        return Err(RecordError::Inconsistent);
    }
    Ok(state)
}

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;
