//! Session data types.
//!
//! DESIGN
//! ======
//! `SessionState` is the full snapshot a `Session` holds and persists.
//! `UserFields` is the only way to populate it: its `id` is not optional, so
//! an authenticated state can never be built without an identity, and
//! `Session::set_user` rejects an empty token for the same reason.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque backend user identifier.
///
/// Older persisted records stored numeric ids; those are accepted and kept as
/// their decimal string form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Ok(Self(s)),
            serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Self(n.to_string())),
            _ => Err(D::Error::custom("expected string or integer user id")),
        }
    }
}

/// Current user identity and credential.
///
/// Unauthenticated is `id == None` with every string empty.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: Option<UserId>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub avatar_url: String,
}

impl SessionState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }

    /// Whether the `id`/`token` pairing holds: both present or both absent.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.id.is_none() == self.token.is_empty()
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("plan", &self.plan)
            .field("token", &redacted(&self.token))
            .field("avatar_url", &self.avatar_url)
            .finish()
    }
}

impl From<UserFields> for SessionState {
    fn from(fields: UserFields) -> Self {
        Self {
            id: Some(fields.id),
            username: fields.username,
            plan: fields.plan,
            token: fields.token,
            avatar_url: fields.avatar_url.unwrap_or_default(),
        }
    }
}

/// Everything `Session::set_user` replaces in one step.
#[derive(Clone, PartialEq, Eq)]
pub struct UserFields {
    pub id: UserId,
    pub username: String,
    pub plan: String,
    pub token: String,
    pub avatar_url: Option<String>,
}

impl fmt::Debug for UserFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserFields")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("plan", &self.plan)
            .field("token", &redacted(&self.token))
            .field("avatar_url", &self.avatar_url)
            .finish()
    }
}

/// Profile fields that may change while the same user stays signed in.
/// `None` leaves a field as it is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub plan: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub(crate) fn apply(self, state: &mut SessionState) {
        if let Some(plan) = self.plan {
            state.plan = plan;
        }
        if let Some(avatar_url) = self.avatar_url {
            state.avatar_url = avatar_url;
        }
    }
}

fn redacted(token: &str) -> &'static str {
    if token.is_empty() { "" } else { "<redacted>" }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;
