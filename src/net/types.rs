//! Wire DTOs for the backend's REST routes.
//!
//! DESIGN
//! ======
//! Only payloads the client inspects get a typed shape. File and folder
//! listings stay `serde_json::Value` because the client only forwards them
//! for display.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::session::{UserFields, UserId};

#[derive(Debug, Clone, Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Body of a successful `POST /api/auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub username: String,
    pub plan: String,
    #[serde(default, alias = "avatarUrl")]
    pub avatar_url: Option<String>,
}

impl From<LoginResponse> for UserFields {
    fn from(login: LoginResponse) -> Self {
        Self {
            id: login.user_id,
            username: login.username,
            plan: login.plan,
            token: login.token,
            avatar_url: login.avatar_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub avatar_url: String,
}

/// Subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Plus,
    Premium,
}

impl Plan {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Plus => "plus",
            Self::Premium => "premium",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "free" => Ok(Self::Free),
            "plus" => Ok(Self::Plus),
            "premium" => Ok(Self::Premium),
            other => Err(format!("plan is invalid: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("approval status is invalid: {other}")),
        }
    }
}

/// `page`/`limit` query pair used by listing routes. Zero means "server default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub(crate) fn query(self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if self.page > 0 {
            query.push(("page", self.page.to_string()));
        }
        if self.limit > 0 {
            query.push(("limit", self.limit.to_string()));
        }
        query
    }
}

/// `GET /api/file/get` result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileList {
    #[serde(default)]
    pub files: Option<Vec<serde_json::Value>>,
    #[serde(default, rename = "shortUrls")]
    pub short_urls: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest<'a> {
    pub search_text: &'a str,
    pub page: u32,
    pub page_limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FolderContents {
    pub folder_id: String,
    pub folder_name: String,
    #[serde(default)]
    pub files: Option<Vec<serde_json::Value>>,
}

/// Resolved location of a shared file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileAccess {
    pub file_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShareLink {
    pub short_url: String,
}

/// Options for a file's share link. Paid-plan options are rejected by the
/// backend for `free` users.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareSettings {
    pub password: Option<String>,
    pub approvable: bool,
    pub view_only: bool,
    pub max_downloads: Option<u32>,
    /// RFC 3339 timestamp.
    pub expiration_at: Option<String>,
}

impl ShareSettings {
    pub(crate) fn form(&self) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("approvable", self.approvable.to_string()),
            ("view_only", self.view_only.to_string()),
            ("max_downloads", self.max_downloads.map_or_else(|| "-1".to_owned(), |n| n.to_string())),
        ];
        if let Some(password) = &self.password {
            form.push(("password", password.clone()));
        }
        if let Some(expiration_at) = &self.expiration_at {
            form.push(("expiration_at", expiration_at.clone()));
        }
        form
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
